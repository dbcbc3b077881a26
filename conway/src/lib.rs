// lib.rs - Simulation-and-history core of Conway Studio
//
// The engine steps the automaton, the stability detector stops settled runs,
// and the recorder/session timelines capture and replay generations.

pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod history;
pub mod host;
pub mod patterns;
pub mod record;
pub mod recorder;
pub mod rng;
pub mod rules;
pub mod session;
pub mod simulation;
pub mod stability;
pub mod timer;

pub use config::{StabilityConfig, StudioConfig};
pub use engine::{Engine, GenerationSnapshot, TickInfo};
pub use error::{ConfigError, LifeError, RuleParseError};
pub use grid::{CellGrid, CounterGrid, Grid};
pub use history::{HistoryFrame, PlaybackState, Retention, Timeline};
pub use host::{Host, Notice, NullHost, StopSignal};
pub use patterns::Pattern;
pub use record::{RecordingMetadata, RecordingRecord, RecordingSettings};
pub use recorder::{CaptureState, RangeExport, Recorder};
pub use rules::{CustomRules, RuleSet};
pub use session::SessionHistory;
pub use simulation::Simulation;
pub use stability::{StabilityDetector, Verdict, compare_generations};
