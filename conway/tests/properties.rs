use std::time::{Duration, Instant};

use conway::patterns::{BLINKER, GLIDER, PENTADECATHLON};
use conway::{
    CellGrid, Engine, Host, Notice, NullHost, RecordingSettings, Recorder, RuleSet, Simulation,
    StabilityDetector, StopSignal, StudioConfig, TickInfo, Verdict, compare_generations,
};

#[derive(Default)]
struct Collector {
    ticks: Vec<TickInfo>,
    stops: Vec<StopSignal>,
    notices: Vec<Notice>,
}

impl Host for Collector {
    fn on_tick(&mut self, tick: TickInfo) {
        self.ticks.push(tick);
    }

    fn on_stop(&mut self, signal: StopSignal) {
        self.stops.push(signal);
    }

    fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

fn settings(engine: &Engine) -> RecordingSettings {
    RecordingSettings {
        cell_size: 10,
        rows: engine.rows(),
        cols: engine.cols(),
        speed: 10.0,
        custom_rules: engine.rules().into(),
    }
}

// Record `ticks` steps of a seeded soup, one frame every 100ms
fn recorded_soup(ticks: u64) -> (Recorder, Engine) {
    let mut engine = Engine::new(16, 16).unwrap();
    engine.randomize(0.35, Some(2024));
    let mut recorder = Recorder::new();
    let start = Instant::now();
    recorder.start_recording(start, &engine.rules_as_string());
    for t in 1..=ticks {
        engine.step();
        recorder.record_generation(&engine, start + Duration::from_millis(100 * t));
    }
    recorder.stop_recording();
    (recorder, engine)
}

#[test]
fn resize_preserves_nothing() {
    let mut engine = Engine::new(12, 12).unwrap();
    engine.randomize(0.5, Some(1));
    engine.step();
    for (rows, cols) in [(1, 1), (3, 17), (40, 2), (12, 12)] {
        engine.resize(rows, cols).unwrap();
        assert_eq!(engine.grid().dims(), (rows, cols));
        assert_eq!(engine.population(), 0);
        assert_eq!(engine.generation(), 0);
        assert!(engine.fade().cells().iter().all(|&f| f == 0));
    }
}

#[test]
fn compare_generations_is_reflexive_and_dimension_strict() {
    let mut engine = Engine::new(9, 7).unwrap();
    engine.randomize(0.5, Some(77));
    let grid = engine.grid().clone();
    assert!(compare_generations(Some(&grid), Some(&grid)));
    assert!(!compare_generations(Some(&grid), Some(&CellGrid::new(7, 9))));
    assert!(!compare_generations(Some(&grid), Some(&CellGrid::new(9, 8))));
    assert!(!compare_generations(None, Some(&grid)));
    assert!(!compare_generations(Some(&grid), None));
}

#[test]
fn static_pattern_triggers_exactly_once() {
    let mut engine = Engine::new(3, 3).unwrap().with_rules(RuleSet::new(&[3], &[2, 3]));
    engine.set_cell(1, 1, true);
    engine.step();
    assert_eq!(engine.population(), 0);

    let mut detector = StabilityDetector::new(4);
    assert_eq!(detector.check(engine.grid()), Verdict::Changing);

    let mut triggers = 0;
    for _ in 0..detector.delay() {
        engine.step();
        if detector.check(engine.grid()).is_triggered() {
            triggers += 1;
        }
    }
    assert_eq!(triggers, 1);
    assert_eq!(detector.window_len(), 0);
    assert_eq!(detector.consecutive_stable(), 0);
}

#[test]
fn blinker_is_detected_as_an_oscillator() {
    let mut engine = Engine::new(5, 5).unwrap();
    engine.stamp(&BLINKER, 2, 1);
    let mut detector = StabilityDetector::new(3);

    let ticks = detector.delay() + 2;
    let verdicts: Vec<Verdict> = (0..ticks)
        .map(|_| {
            engine.step();
            detector.check(engine.grid())
        })
        .collect();
    assert_eq!(
        verdicts,
        vec![
            Verdict::Changing,
            Verdict::Changing,
            Verdict::Settling(1),
            Verdict::Settling(2),
            Verdict::Triggered,
        ]
    );
}

#[test]
fn period_fifteen_is_never_detected() {
    let mut engine = Engine::new(40, 40).unwrap();
    engine.stamp(&PENTADECATHLON, 18, 15);
    let start = engine.grid().clone();
    let mut detector = StabilityDetector::default();

    for tick in 1..=150 {
        engine.step();
        assert_ne!(detector.check(engine.grid()), Verdict::Triggered, "tick {tick}");
        if tick % 15 == 0 {
            assert_eq!(engine.grid(), &start);
        }
    }
}

#[test]
fn seek_reproduces_every_frame() {
    let (mut recorder, mut engine) = recorded_soup(12);
    let frames: Vec<CellGrid> = recorder.timeline().frames().iter().map(|f| f.grid.clone()).collect();

    for (i, expected) in frames.iter().enumerate().rev() {
        assert!(recorder.seek(i, &mut engine, &mut NullHost));
        assert!(compare_generations(Some(engine.grid()), Some(expected)));
    }
}

#[test]
fn range_export_matches_the_buffer() {
    let (recorder, engine) = recorded_soup(10);
    let n = recorder.len();

    let full = recorder.export_range(0, n - 1).unwrap();
    assert_eq!(full.frames.len(), n);
    assert!(full.frames.iter().eq(recorder.timeline().frames().iter()));

    let (a, b) = (2, 7);
    let part = recorder.export_range(a, b).unwrap();
    let frames = recorder.timeline().frames();
    assert_eq!(part.frames.len(), b - a + 1);
    assert_eq!(part.metadata.total_generations, b - a + 1);
    assert_eq!(
        part.metadata.duration,
        frames[b].timestamp_offset_ms - frames[a].timestamp_offset_ms
    );

    let record = recorder.range_record(a, b, settings(&engine)).unwrap();
    assert_eq!(record.metadata.rule_string, "B3/S23");
    assert_eq!(record.generations.first(), frames.get(a));
}

#[test]
fn glider_moves_diagonally() {
    let mut engine = Engine::new(10, 10).unwrap().with_rules("B3/S23".parse().unwrap());
    engine.stamp(&GLIDER, 1, 1);
    let before = engine.grid().live_cells();

    for _ in 0..4 {
        engine.step();
    }

    let shifted: Vec<(usize, usize)> = before.iter().map(|&(r, c)| (r + 1, c + 1)).collect();
    assert_eq!(engine.grid().live_cells(), shifted);
    assert_eq!(engine.generation(), 4);
}

#[test]
fn full_session_round_trip_through_json() {
    let config = StudioConfig {
        rows: 12,
        cols: 12,
        speed: 20.0,
        ..StudioConfig::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    let mut host = Collector::default();
    let start = Instant::now();
    sim.randomize(0.4, Some(5), &mut host).unwrap();
    sim.set_stability_enabled(false);
    sim.start(start).unwrap();
    for t in 1..=8 {
        sim.tick(start + Duration::from_millis(50 * t), &mut host);
    }
    sim.stop();
    assert_eq!(host.ticks.len(), 8);

    let record = sim.export_recording().unwrap();
    assert_eq!(record.metadata.total_generations, 8);
    assert_eq!(record.metadata.duration, 350);
    let raw = record.to_json().unwrap();
    sim.mark_recording_saved();
    assert!(sim.recorder().is_empty());

    let loaded = conway::RecordingRecord::from_json(&raw).unwrap();
    let mut viewer = Simulation::new(StudioConfig::default()).unwrap();
    viewer.load_recording(&loaded, &mut host).unwrap();
    assert_eq!((viewer.engine().rows(), viewer.engine().cols()), (12, 12));

    let last = loaded.generations.len() - 1;
    assert!(viewer.seek_recording(last, &mut host));
    assert_eq!(viewer.engine().grid(), &loaded.generations[last].grid);
    assert!(!viewer.seek_recording(last + 1, &mut host));
}
