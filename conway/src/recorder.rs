// recorder.rs - Long-term recording: capture while running, replay, range export

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::engine::Engine;
use crate::error::LifeError;
use crate::history::{HistoryFrame, Retention, Timeline};
use crate::host::Host;
use crate::record::{RecordingMetadata, RecordingRecord, RecordingSettings};
use crate::rules::RuleSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording { started_at: Instant },
    /// Capture ended; frames are kept.
    Stopped,
}

/// A contiguous slice of the recording plus derived metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeExport {
    pub frames: Vec<HistoryFrame>,
    pub metadata: RecordingMetadata,
}

impl RangeExport {
    pub fn into_record(self, settings: RecordingSettings) -> RecordingRecord {
        RecordingRecord {
            generations: self.frames,
            settings,
            metadata: self.metadata,
        }
    }
}

/// Captures every generation of a run into an unbounded timeline.
///
/// Playback mode marks that a stored recording, not the live session, is on screen.
#[derive(Debug, Clone)]
pub struct Recorder {
    timeline: Timeline,
    capture: CaptureState,
    playback_mode: bool,
    /// `(first frame index, rule)` for every rule in effect during the take.
    rules: Vec<(usize, String)>,
    /// Set when the engine stopped continuing the captured run.
    discontinued: bool,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            timeline: Timeline::new(Retention::Unbounded),
            capture: CaptureState::Idle,
            playback_mode: false,
            rules: Vec::new(),
            discontinued: false,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.capture, CaptureState::Recording { .. })
    }

    pub fn is_in_playback_mode(&self) -> bool {
        self.playback_mode
    }

    /// Rule of the newest captured frame.
    pub fn rule_string(&self) -> &str {
        self.rules.last().map_or("", |(_, rule)| rule.as_str())
    }

    /// Rule the engine ran when frame `index` was captured.
    pub fn rule_at(&self, index: usize) -> &str {
        self.rules
            .iter()
            .rev()
            .find(|(first, _)| *first <= index)
            .or(self.rules.first())
            .map_or("", |(_, rule)| rule.as_str())
    }

    fn note_rule(&mut self, first_frame: usize, rule: &str) {
        if self.rule_string() != rule {
            self.rules.push((first_frame, rule.to_string()));
        }
    }

    /// The engine no longer continues the captured run (new grid, rewind).
    /// The next session starts a fresh buffer instead of resuming.
    pub fn break_continuity(&mut self) {
        if !self.is_recording() && !self.timeline.is_empty() {
            self.discontinued = true;
        }
    }

    pub fn is_discontinued(&self) -> bool {
        self.discontinued
    }

    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Begin or resume capturing. Resuming keeps the buffer and continues its clock;
    /// after [`Recorder::break_continuity`] the old buffer is discarded.
    pub fn start_recording(&mut self, now: Instant, rule_string: &str) {
        if self.is_recording() {
            return;
        }
        if self.discontinued {
            debug!(frames = self.timeline.len(), "discarding recording of a previous run");
            self.clear();
        }
        let elapsed = self
            .timeline
            .frames()
            .back()
            .map_or(Duration::ZERO, |last| Duration::from_millis(last.timestamp_offset_ms));
        let started_at = now.checked_sub(elapsed).unwrap_or(now);
        self.timeline.close();
        self.capture = CaptureState::Recording { started_at };
        self.note_rule(self.timeline.len(), rule_string);
        debug!(frames = self.timeline.len(), rule = rule_string, "recording started");
    }

    pub fn stop_recording(&mut self) {
        if self.is_recording() {
            self.capture = CaptureState::Stopped;
            debug!(frames = self.timeline.len(), "recording stopped");
        }
    }

    /// Append the engine's current generation while recording.
    pub fn record_generation(&mut self, engine: &Engine, now: Instant) -> bool {
        let CaptureState::Recording { started_at } = self.capture else {
            return false;
        };
        let offset = now.saturating_duration_since(started_at).as_millis() as u64;
        self.timeline.push(HistoryFrame::capture(engine, offset));
        self.note_rule(self.timeline.len() - 1, &engine.rules_as_string());
        true
    }

    /// Drop all frames and return to `Idle`.
    pub fn clear(&mut self) {
        self.timeline.clear();
        self.capture = CaptureState::Idle;
        self.rules.clear();
        self.discontinued = false;
    }

    /// The external store accepted the recording.
    pub fn mark_saved(&mut self) {
        info!(frames = self.timeline.len(), "recording saved, discarding buffer");
        self.clear();
    }

    pub fn enter_playback_mode(&mut self) {
        self.stop_recording();
        self.playback_mode = true;
    }

    pub fn exit_playback_mode(&mut self) {
        self.timeline.close();
        self.playback_mode = false;
    }

    /// Replace the buffer with a stored recording and show its first frame.
    pub fn load_record(
        &mut self,
        record: &RecordingRecord,
        engine: &mut Engine,
        host: &mut dyn Host,
    ) -> Result<(), LifeError> {
        if record.generations.is_empty() {
            return Err(LifeError::EmptyTimeline);
        }
        self.enter_playback_mode();
        self.capture = CaptureState::Stopped;
        self.timeline.replace(record.generations.iter().cloned());
        self.rules = vec![(0, record.metadata.rule_string.clone())];
        self.discontinued = false;
        engine.set_rules(record.settings.rules());
        self.timeline.seek(0, engine, host);
        info!(frames = record.generations.len(), rule = %record.metadata.rule_string, "recording loaded");
        Ok(())
    }

    pub fn play(&mut self, speed_factor: f64, now: Instant, engine: &mut Engine, host: &mut dyn Host) {
        self.timeline.play(speed_factor, now, engine, host);
    }

    pub fn pause(&mut self) {
        self.timeline.pause();
    }

    pub fn stop(&mut self, engine: &mut Engine, host: &mut dyn Host) {
        self.timeline.stop(engine, host);
    }

    pub fn seek(&mut self, index: usize, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.timeline.seek(index, engine, host)
    }

    pub fn step_forward(&mut self, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.timeline.step_forward(engine, host)
    }

    pub fn step_back(&mut self, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.timeline.step_back(engine, host)
    }

    pub fn set_speed(&mut self, speed_factor: f64) {
        self.timeline.set_speed(speed_factor);
    }

    pub fn tick(&mut self, now: Instant, engine: &mut Engine, host: &mut dyn Host) -> bool {
        self.timeline.tick(now, engine, host)
    }

    /// Frames `start..=end` with their metadata. The rule is the one in effect at `start`.
    pub fn export_range(&self, start: usize, end: usize) -> Result<RangeExport, LifeError> {
        let len = self.timeline.len();
        if start > end || end >= len {
            return Err(LifeError::InvalidRange { start, end, len });
        }
        let frames: Vec<HistoryFrame> = self.timeline.frames().range(start..=end).cloned().collect();
        let metadata = RecordingMetadata::describe(&frames, self.rule_at(start));
        Ok(RangeExport { frames, metadata })
    }

    /// The whole buffer as a persisted record.
    pub fn to_record(&self, settings: RecordingSettings) -> Result<RecordingRecord, LifeError> {
        if self.timeline.is_empty() {
            return Err(LifeError::EmptyTimeline);
        }
        self.range_record(0, self.timeline.len() - 1, settings)
    }

    /// Like [`Recorder::export_range`]; the settings' rules are replaced by the range's rule.
    pub fn range_record(
        &self,
        start: usize,
        end: usize,
        mut settings: RecordingSettings,
    ) -> Result<RecordingRecord, LifeError> {
        let export = self.export_range(start, end)?;
        if let Ok(rules) = export.metadata.rule_string.parse::<RuleSet>() {
            settings.custom_rules = rules.into();
        }
        Ok(export.into_record(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;
    use crate::patterns::BLINKER;

    fn settings() -> RecordingSettings {
        RecordingSettings {
            cell_size: 8,
            rows: 5,
            cols: 5,
            speed: 10.0,
            custom_rules: RuleSet::CONWAY.into(),
        }
    }

    // Record `ticks` generations of a blinker, 100ms apart
    fn recorded(ticks: u64) -> (Recorder, Engine, Instant) {
        let mut engine = Engine::new(5, 5).unwrap();
        engine.stamp(&BLINKER, 2, 1);
        let mut recorder = Recorder::new();
        let start = Instant::now();
        recorder.start_recording(start, &engine.rules_as_string());
        for t in 1..=ticks {
            engine.step();
            recorder.record_generation(&engine, start + Duration::from_millis(100 * t));
        }
        recorder.stop_recording();
        (recorder, engine, start)
    }

    #[test]
    fn captures_only_while_recording() {
        let mut engine = Engine::new(3, 3).unwrap();
        let mut recorder = Recorder::new();
        let now = Instant::now();
        assert!(!recorder.record_generation(&engine, now));

        recorder.start_recording(now, "B3/S23");
        engine.step();
        assert!(recorder.record_generation(&engine, now + Duration::from_millis(40)));
        recorder.stop_recording();
        assert_eq!(recorder.capture_state(), CaptureState::Stopped);
        assert!(!recorder.record_generation(&engine, now));

        let frame = recorder.timeline().frame(0).unwrap();
        assert_eq!(frame.timestamp_offset_ms, 40);
        assert_eq!(frame.generation, 1);
    }

    #[test]
    fn frames_are_detached_from_the_engine() {
        let (recorder, mut engine, _) = recorded(2);
        engine.set_cell(0, 0, true);
        assert!(recorder.timeline().frames().iter().all(|f| !f.grid.is_alive(0, 0)));
    }

    #[test]
    fn resuming_continues_the_clock() {
        let (mut recorder, mut engine, start) = recorded(3);
        let later = start + Duration::from_secs(60);
        recorder.start_recording(later, "B3/S23");
        engine.step();
        recorder.record_generation(&engine, later + Duration::from_millis(100));
        assert_eq!(recorder.len(), 4);
        assert_eq!(recorder.timeline().frame(3).unwrap().timestamp_offset_ms, 400);
    }

    #[test]
    fn broken_continuity_starts_a_new_take() {
        let (mut recorder, _, start) = recorded(3);
        recorder.break_continuity();
        assert!(recorder.is_discontinued());

        let mut engine = Engine::new(8, 8).unwrap();
        let later = start + Duration::from_secs(5);
        recorder.start_recording(later, "B3/S23");
        assert!(recorder.is_empty());
        engine.step();
        recorder.record_generation(&engine, later + Duration::from_millis(100));

        let frame = recorder.timeline().frame(0).unwrap();
        assert_eq!(recorder.len(), 1);
        assert_eq!(frame.grid.dims(), (8, 8));
        assert_eq!(frame.timestamp_offset_ms, 100);
        assert!(!recorder.is_discontinued());
    }

    #[test]
    fn continuity_is_kept_while_recording() {
        let mut recorder = Recorder::new();
        let engine = Engine::new(3, 3).unwrap();
        let now = Instant::now();
        recorder.start_recording(now, "B3/S23");
        recorder.record_generation(&engine, now);
        recorder.break_continuity();
        assert!(!recorder.is_discontinued());
    }

    #[test]
    fn ranges_report_the_rule_they_ran_under() {
        let mut engine = Engine::new(5, 5).unwrap();
        engine.stamp(&BLINKER, 2, 1);
        let mut recorder = Recorder::new();
        let start = Instant::now();
        recorder.start_recording(start, &engine.rules_as_string());
        for t in 1..=6 {
            if t == 4 {
                engine.set_rules("B36/S23".parse().unwrap());
            }
            engine.step();
            recorder.record_generation(&engine, start + Duration::from_millis(100 * t));
        }

        assert_eq!(recorder.export_range(0, 2).unwrap().metadata.rule_string, "B3/S23");
        assert_eq!(recorder.export_range(1, 5).unwrap().metadata.rule_string, "B3/S23");
        assert_eq!(recorder.export_range(3, 5).unwrap().metadata.rule_string, "B36/S23");
        assert_eq!(recorder.rule_string(), "B36/S23");

        let mut current = settings();
        current.custom_rules = "B36/S23".parse::<RuleSet>().unwrap().into();
        let early = recorder.range_record(0, 2, current).unwrap();
        assert_eq!(early.settings.rules(), RuleSet::CONWAY);
    }

    #[test]
    fn export_range_checks_bounds() {
        let (recorder, _, _) = recorded(5);
        assert_eq!(
            recorder.export_range(3, 2).unwrap_err(),
            LifeError::InvalidRange { start: 3, end: 2, len: 5 }
        );
        assert!(recorder.export_range(0, 5).is_err());

        let export = recorder.export_range(1, 3).unwrap();
        assert_eq!(export.frames.len(), 3);
        assert_eq!(export.metadata.total_generations, 3);
        assert_eq!(export.metadata.duration, 200);
        assert_eq!(export.metadata.rule_string, "B3/S23");
        assert_eq!(export.frames[0].generation, 2);
    }

    #[test]
    fn empty_recorder_has_no_record() {
        let recorder = Recorder::new();
        assert_eq!(recorder.to_record(settings()).unwrap_err(), LifeError::EmptyTimeline);
    }

    #[test]
    fn load_enters_playback_mode() {
        let (recorder, _, _) = recorded(4);
        let record = recorder.to_record(settings()).unwrap();

        let mut viewer = Recorder::new();
        let mut engine = Engine::new(20, 20).unwrap().with_rules("B36/S23".parse().unwrap());
        viewer.load_record(&record, &mut engine, &mut NullHost).unwrap();
        assert!(viewer.is_in_playback_mode());
        assert_eq!(viewer.len(), 4);
        assert_eq!((engine.rows(), engine.cols()), (5, 5));
        assert_eq!(engine.generation(), 1);
        assert_eq!(engine.rules(), RuleSet::CONWAY);

        viewer.exit_playback_mode();
        assert!(!viewer.is_in_playback_mode());
        assert!(!viewer.timeline().is_open());
    }

    #[test]
    fn saving_discards_the_buffer() {
        let (mut recorder, _, _) = recorded(2);
        recorder.mark_saved();
        assert!(recorder.is_empty());
        assert_eq!(recorder.capture_state(), CaptureState::Idle);
    }
}
