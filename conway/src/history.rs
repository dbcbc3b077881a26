// history.rs - Timestamped frame buffer with VCR-style scrubbing
//
// One timeline type backs both the long-term recorder (unbounded) and the
// short-term session history (bounded window).

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::engine::Engine;
use crate::grid::CellGrid;
use crate::host::{Host, Notice};
use crate::timer::{Interval, replay_period};

/// One captured generation. Holds its own copy of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFrame {
    pub timestamp_offset_ms: u64,
    pub generation: u64,
    pub grid: CellGrid,
    pub population: usize,
}

impl HistoryFrame {
    pub fn capture(engine: &Engine, timestamp_offset_ms: u64) -> Self {
        Self {
            timestamp_offset_ms,
            generation: engine.generation(),
            grid: engine.grid().clone(),
            population: engine.population(),
        }
    }
}

/// How many frames a timeline keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Grows until cleared.
    Unbounded,
    /// Keeps the newest `n` frames, evicting the oldest first.
    Window(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Not being viewed; the cursor follows the newest frame.
    Closed,
    Playing,
    Paused,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    frames: VecDeque<HistoryFrame>,
    retention: Retention,
    current_index: usize,
    state: PlaybackState,
    speed_factor: f64,
    timer: Interval,
}

impl Timeline {
    pub fn new(retention: Retention) -> Self {
        Self {
            frames: VecDeque::new(),
            retention,
            current_index: 0,
            state: PlaybackState::Closed,
            speed_factor: 1.0,
            timer: Interval::new(replay_period(1.0)),
        }
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &VecDeque<HistoryFrame> {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&HistoryFrame> {
        self.frames.get(index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_frame(&self) -> Option<&HistoryFrame> {
        self.frames.get(self.current_index)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_open(&self) -> bool {
        self.state != PlaybackState::Closed
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    /// Whether the replay timer is armed.
    pub fn timer_active(&self) -> bool {
        self.timer.is_active()
    }

    fn last_index(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    pub fn push(&mut self, frame: HistoryFrame) {
        self.frames.push_back(frame);
        if let Retention::Window(limit) = self.retention {
            while self.frames.len() > limit.max(1) {
                self.frames.pop_front();
                self.current_index = self.current_index.saturating_sub(1);
            }
        }
        if self.state == PlaybackState::Closed {
            self.current_index = self.last_index();
        }
    }

    /// Replace all frames, e.g. with a loaded recording. Playback is closed.
    pub fn replace(&mut self, frames: impl IntoIterator<Item = HistoryFrame>) {
        self.close();
        self.frames = frames.into_iter().collect();
        if let Retention::Window(limit) = self.retention {
            let excess = self.frames.len().saturating_sub(limit.max(1));
            self.frames.drain(..excess);
        }
        self.current_index = 0;
    }

    /// Drop frames after the cursor.
    pub fn truncate_after_current(&mut self) {
        self.frames.truncate(self.current_index + 1);
    }

    pub fn clear(&mut self) {
        self.close();
        self.frames.clear();
        self.current_index = 0;
    }

    /// Leave playback; the timer is cancelled.
    pub fn close(&mut self) {
        self.timer.cancel();
        self.state = PlaybackState::Closed;
        self.current_index = self.last_index();
    }

    fn show(&self, engine: &mut Engine, host: &mut dyn Host) {
        if let Some(frame) = self.frames.get(self.current_index) {
            engine.load_frame(&frame.grid, frame.generation);
            host.redraw();
            host.update_info();
        }
    }

    /// Start advancing one frame per replay period. Playing from the last frame
    /// starts over at the first one. No-op on an empty timeline.
    pub fn play(&mut self, speed_factor: f64, now: Instant, engine: &mut Engine, host: &mut dyn Host) {
        if self.frames.is_empty() {
            return;
        }
        if self.state == PlaybackState::Closed || self.current_index >= self.last_index() {
            self.current_index = 0;
            self.show(engine, host);
        }
        self.set_speed(speed_factor);
        self.state = PlaybackState::Playing;
        self.timer.start(now);
        debug!(speed_factor = self.speed_factor, frames = self.frames.len(), "replay started");
    }

    pub fn set_speed(&mut self, speed_factor: f64) {
        self.speed_factor = speed_factor;
        self.timer.set_period(replay_period(speed_factor));
    }

    /// Halt the timer and keep the current frame.
    pub fn pause(&mut self) {
        self.timer.cancel();
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Halt the timer and go back to the first frame.
    pub fn stop(&mut self, engine: &mut Engine, host: &mut dyn Host) {
        self.timer.cancel();
        if self.frames.is_empty() {
            return;
        }
        self.state = PlaybackState::Paused;
        self.current_index = 0;
        self.show(engine, host);
    }

    /// Show frame `index`. Out-of-range requests are ignored.
    pub fn seek(&mut self, index: usize, engine: &mut Engine, host: &mut dyn Host) -> bool {
        if index >= self.frames.len() {
            return false;
        }
        self.current_index = index;
        if self.state == PlaybackState::Closed {
            self.state = PlaybackState::Paused;
        }
        self.show(engine, host);
        true
    }

    pub fn step_forward(&mut self, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.pause();
        self.seek(self.current_index + 1, engine, host)
    }

    pub fn step_back(&mut self, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.pause();
        match self.current_index.checked_sub(1) {
            Some(index) => self.seek(index, engine, host),
            None => false,
        }
    }

    /// Poll the replay timer. Returns `true` when a new frame was shown.
    pub fn tick(&mut self, now: Instant, engine: &mut Engine, host: &mut dyn Host) -> bool {
        if self.state != PlaybackState::Playing || !self.timer.poll(now) {
            return false;
        }
        if self.current_index >= self.last_index() {
            self.current_index = self.last_index();
            self.pause();
            host.notify(Notice::PlaybackFinished);
            return false;
        }

        self.current_index += 1;
        self.show(engine, host);
        if self.current_index == self.last_index() {
            self.pause();
            host.notify(Notice::PlaybackFinished);
        }
        true
    }
}
