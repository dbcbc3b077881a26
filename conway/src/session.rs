// session.rs - Short-term history of the live run for stepping back

use std::time::Instant;

use crate::engine::Engine;
use crate::history::{HistoryFrame, Retention, Timeline};
use crate::host::Host;

/// Default number of recent generations kept.
pub const DEFAULT_SESSION_FRAMES: usize = 100;

/// Keeps the last few generations of the live run, whether or not a recording is active.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    timeline: Timeline,
    origin: Option<Instant>,
}

impl Default for SessionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_FRAMES)
    }
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            timeline: Timeline::new(Retention::Window(capacity.max(1))),
            origin: None,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Whether the user is looking at an older generation.
    pub fn is_scrubbing(&self) -> bool {
        self.timeline.is_open()
    }

    pub fn capture(&mut self, engine: &Engine, now: Instant) {
        let origin = *self.origin.get_or_insert(now);
        let offset = now.saturating_duration_since(origin).as_millis() as u64;
        self.timeline.push(HistoryFrame::capture(engine, offset));
    }

    pub fn step_back(&mut self, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.timeline.step_back(engine, host)
    }

    pub fn step_forward(&mut self, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.timeline.step_forward(engine, host)
    }

    pub fn seek(&mut self, index: usize, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.timeline.seek(index, engine, host)
    }

    pub fn play(&mut self, speed_factor: f64, now: Instant, engine: &mut Engine, host: &mut dyn Host) {
        self.timeline.play(speed_factor, now, engine, host);
    }

    pub fn pause(&mut self) {
        self.timeline.pause();
    }

    pub fn tick(&mut self, now: Instant, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.timeline.tick(now, engine, host)
    }

    /// Continue live from the frame on screen; later frames are dropped.
    pub fn resume(&mut self) {
        if self.timeline.is_open() {
            self.timeline.truncate_after_current();
            self.timeline.close();
        }
    }

    pub fn clear(&mut self) {
        self.timeline.clear();
        self.origin = None;
    }
}
