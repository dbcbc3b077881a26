// simulation.rs - Per-tick pipeline tying engine, detector, recorder and session history together

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::StudioConfig;
use crate::engine::{Engine, TickInfo};
use crate::error::{ConfigError, LifeError};
use crate::host::{Host, Notice, StopSignal};
use crate::patterns::{self, Pattern};
use crate::record::{RecordingRecord, RecordingSettings};
use crate::recorder::Recorder;
use crate::session::SessionHistory;
use crate::stability::StabilityDetector;
use crate::timer::{Interval, generation_period};

/// Owns the whole core and drives it from the host's frame loop.
///
/// The live loop and replay never run together: starting replay stops the live
/// loop, and playback mode refuses the controls that would restart it.
#[derive(Debug, Clone)]
pub struct Simulation {
    engine: Engine,
    detector: StabilityDetector,
    recorder: Recorder,
    session: SessionHistory,
    live: Interval,
    running: bool,
    config: StudioConfig,
}

impl Simulation {
    pub fn new(config: StudioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let engine = Engine::new(config.rows, config.cols)
            .map_err(|_| ConfigError::Invalid("rows and cols must be positive"))?
            .with_rules(config.rule_set()?)
            .with_fade_duration(config.fade_duration);
        let mut detector = StabilityDetector::with_window(config.stability.delay, config.stability.window);
        detector.set_enabled(config.stability.enabled);

        Ok(Self {
            engine,
            detector,
            recorder: Recorder::new(),
            session: SessionHistory::new(config.session_history),
            live: Interval::new(generation_period(config.speed)),
            running: false,
            config,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn detector(&self) -> &StabilityDetector {
        &self.detector
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn session(&self) -> &SessionHistory {
        &self.session
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_in_playback_mode(&self) -> bool {
        self.recorder.is_in_playback_mode()
    }

    fn ensure_live_controls(&self) -> Result<(), LifeError> {
        if self.recorder.is_in_playback_mode() {
            warn!("simulation control refused in playback mode");
            return Err(LifeError::PlaybackModeActive);
        }
        Ok(())
    }

    // Drop any replay of the live session so the engine is ours again
    fn leave_replays(&mut self) {
        if self.recorder.timeline().is_open() || self.session.is_scrubbing() {
            self.history_restored();
        }
        self.recorder.pause();
        self.session.resume();
    }

    // The engine shows an older frame; generations the detector saw after it will come again
    fn history_restored(&mut self) {
        self.detector.reset();
        self.recorder.break_continuity();
    }

    // Grid content changed by the user; old history no longer applies
    fn grid_replaced(&mut self, host: &mut dyn Host) {
        self.detector.reset();
        self.session.clear();
        self.recorder.break_continuity();
        host.redraw();
        host.update_info();
    }

    pub fn start(&mut self, now: Instant) -> Result<(), LifeError> {
        self.ensure_live_controls()?;
        if self.running {
            return Ok(());
        }
        self.leave_replays();
        self.running = true;
        self.live.start(now);
        self.recorder.start_recording(now, &self.engine.rules_as_string());
        info!(generation = self.engine.generation(), "simulation started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.live.cancel();
        self.recorder.stop_recording();
        info!(generation = self.engine.generation(), "simulation stopped");
    }

    pub fn toggle(&mut self, now: Instant) -> Result<(), LifeError> {
        if self.running {
            self.stop();
            Ok(())
        } else {
            self.start(now)
        }
    }

    /// Stop and clear the grid. The recording buffer is kept.
    pub fn reset(&mut self, host: &mut dyn Host) -> Result<(), LifeError> {
        self.ensure_live_controls()?;
        self.stop();
        self.leave_replays();
        self.engine.clear();
        self.grid_replaced(host);
        Ok(())
    }

    pub fn randomize(&mut self, density: f64, seed: Option<u64>, host: &mut dyn Host) -> Result<(), LifeError> {
        self.ensure_live_controls()?;
        self.stop();
        self.leave_replays();
        self.engine.randomize(density, seed);
        self.grid_replaced(host);
        Ok(())
    }

    pub fn fill_edges(&mut self, density: f64, seed: Option<u64>, host: &mut dyn Host) -> Result<(), LifeError> {
        self.ensure_live_controls()?;
        self.leave_replays();
        self.engine.fill_edges(density, seed);
        self.grid_replaced(host);
        Ok(())
    }

    pub fn fill_center(&mut self, density: f64, seed: Option<u64>, host: &mut dyn Host) -> Result<(), LifeError> {
        self.ensure_live_controls()?;
        self.leave_replays();
        self.engine.fill_center(density, seed);
        self.grid_replaced(host);
        Ok(())
    }

    pub fn invert(&mut self, host: &mut dyn Host) -> Result<(), LifeError> {
        self.ensure_live_controls()?;
        self.leave_replays();
        self.engine.invert();
        self.grid_replaced(host);
        Ok(())
    }

    /// Clear the grid and centre a catalog pattern on it.
    pub fn apply_pattern(&mut self, pattern: &Pattern, host: &mut dyn Host) -> Result<(), LifeError> {
        self.ensure_live_controls()?;
        self.stop();
        self.leave_replays();
        self.engine.clear();
        let (row, col) = patterns::centered_origin(pattern, self.engine.rows(), self.engine.cols());
        self.engine.stamp(pattern, row, col);
        self.grid_replaced(host);
        Ok(())
    }

    /// Reinitialize to new dimensions. Content is lost.
    pub fn resize(&mut self, rows: usize, cols: usize, host: &mut dyn Host) -> Result<(), LifeError> {
        self.ensure_live_controls()?;
        self.stop();
        self.leave_replays();
        self.engine.resize(rows, cols)?;
        self.config.rows = rows;
        self.config.cols = cols;
        self.grid_replaced(host);
        Ok(())
    }

    pub fn set_cell(&mut self, row: usize, col: usize, alive: bool, host: &mut dyn Host) -> Result<(), LifeError> {
        self.ensure_live_controls()?;
        self.engine.set_cell(row, col, alive);
        host.redraw();
        host.update_info();
        Ok(())
    }

    pub fn toggle_cell(&mut self, row: usize, col: usize, host: &mut dyn Host) -> Result<(), LifeError> {
        let alive = self.engine.get_cell(row, col);
        self.set_cell(row, col, !alive, host)
    }

    /// Apply a rule string; bad input falls back to `B3/S23` and the host is told.
    pub fn set_rules(&mut self, rule: &str, host: &mut dyn Host) {
        if let Err(error) = self.engine.set_rules_from_string(rule) {
            host.notify(Notice::RuleFallback {
                input: rule.to_string(),
                error,
            });
        }
        self.config.rules = self.engine.rules_as_string();
        host.update_info();
    }

    /// Generations per second of the live loop.
    pub fn set_speed(&mut self, gens_per_sec: f64) {
        if !(gens_per_sec.is_finite() && gens_per_sec > 0.0) {
            warn!(gens_per_sec, "ignoring invalid speed");
            return;
        }
        self.config.speed = gens_per_sec;
        self.live.set_period(generation_period(gens_per_sec));
    }

    pub fn set_fade_duration(&mut self, ticks: u32) {
        self.config.fade_duration = ticks;
        self.engine.set_fade_duration(ticks);
    }

    pub fn set_stability_enabled(&mut self, enabled: bool) {
        self.config.stability.enabled = enabled;
        self.detector.set_enabled(enabled);
    }

    pub fn set_stability_delay(&mut self, delay: u32) {
        self.detector.set_delay(delay);
        self.config.stability.delay = self.detector.delay();
    }

    pub fn set_cell_size(&mut self, cell_size: u32) {
        self.config.cell_size = cell_size.max(1);
    }

    /// Poll both timers. Call once per host frame.
    pub fn tick(&mut self, now: Instant, host: &mut dyn Host) {
        if self.running && self.live.poll(now) {
            self.advance(now, host);
        }
        let replayed = self.recorder.tick(now, &mut self.engine, host);
        if self.session.tick(now, &mut self.engine, host) || replayed {
            self.history_restored();
        }
    }

    /// Advance exactly one generation outside the live loop.
    pub fn step_once(&mut self, now: Instant, host: &mut dyn Host) -> Result<TickInfo, LifeError> {
        self.ensure_live_controls()?;
        self.leave_replays();
        Ok(self.advance(now, host))
    }

    // step -> stability check -> record, in that order
    fn advance(&mut self, now: Instant, host: &mut dyn Host) -> TickInfo {
        let tick = self.engine.step();
        host.on_tick(tick);

        if self.detector.check(self.engine.grid()).is_triggered() {
            self.stop();
            host.on_stop(StopSignal {
                generation: tick.generation,
            });
            host.notify(Notice::Stabilized {
                generation: tick.generation,
            });
        }

        self.recorder.record_generation(&self.engine, now);
        self.session.capture(&self.engine, now);
        host.redraw();
        host.update_info();
        tick
    }

    /// Step back through the live session's recent generations.
    pub fn step_back(&mut self, host: &mut dyn Host) -> bool {
        self.stop();
        let moved = self.session.step_back(&mut self.engine, host);
        if moved {
            self.history_restored();
        }
        moved
    }

    pub fn step_forward_in_session(&mut self, host: &mut dyn Host) -> bool {
        let moved = self.session.step_forward(&mut self.engine, host);
        if moved {
            self.history_restored();
        }
        moved
    }

    pub fn play_recording(&mut self, speed_factor: f64, now: Instant, host: &mut dyn Host) {
        if self.recorder.is_empty() {
            debug!("nothing recorded to play");
            return;
        }
        self.stop();
        self.session.pause();
        self.recorder.play(speed_factor, now, &mut self.engine, host);
        self.history_restored();
    }

    pub fn pause_recording(&mut self) {
        self.recorder.pause();
    }

    pub fn stop_recording_playback(&mut self, host: &mut dyn Host) {
        if self.recorder.is_empty() {
            return;
        }
        self.recorder.stop(&mut self.engine, host);
        self.history_restored();
    }

    pub fn seek_recording(&mut self, index: usize, host: &mut dyn Host) -> bool {
        if index >= self.recorder.len() {
            return false;
        }
        self.stop();
        let shown = self.recorder.seek(index, &mut self.engine, host);
        self.history_restored();
        shown
    }

    pub fn set_playback_speed(&mut self, speed_factor: f64) {
        self.recorder.set_speed(speed_factor);
    }

    /// Show a stored recording. Live controls stay locked until playback mode is left.
    pub fn load_recording(&mut self, record: &RecordingRecord, host: &mut dyn Host) -> Result<(), LifeError> {
        self.stop();
        self.session.clear();
        self.detector.reset();
        self.recorder.load_record(record, &mut self.engine, host)?;
        self.config.rows = self.engine.rows();
        self.config.cols = self.engine.cols();
        self.config.cell_size = record.settings.cell_size.max(1);
        self.config.rules = self.engine.rules_as_string();
        Ok(())
    }

    pub fn exit_playback_mode(&mut self, host: &mut dyn Host) {
        self.recorder.exit_playback_mode();
        self.recorder.clear();
        host.update_info();
    }

    /// Settings block for a persisted record.
    pub fn recording_settings(&self) -> RecordingSettings {
        RecordingSettings {
            cell_size: self.config.cell_size,
            rows: self.engine.rows(),
            cols: self.engine.cols(),
            speed: self.config.speed,
            custom_rules: self.engine.rules().into(),
        }
    }

    pub fn export_recording(&self) -> Result<RecordingRecord, LifeError> {
        self.recorder.to_record(self.recording_settings())
    }

    pub fn export_range(&self, start: usize, end: usize) -> Result<RecordingRecord, LifeError> {
        self.recorder.range_record(start, end, self.recording_settings())
    }

    pub fn mark_recording_saved(&mut self) {
        self.recorder.mark_saved();
    }

    pub fn clear_recording(&mut self) {
        self.recorder.clear();
    }
}
