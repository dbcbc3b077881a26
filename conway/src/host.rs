// host.rs - Callbacks the surrounding application provides to the core

use crate::engine::TickInfo;
use crate::error::RuleParseError;

/// Sent once per stability trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopSignal {
    pub generation: u64,
}

/// Transient user-facing notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The running pattern settled and the simulation was stopped.
    Stabilized { generation: u64 },
    /// A rule string was rejected and `B3/S23` is in effect.
    RuleFallback { input: String, error: RuleParseError },
    /// Replay reached the last frame.
    PlaybackFinished,
}

/// Host-side hooks. Every method defaults to doing nothing.
pub trait Host {
    /// The engine grid changed outside of a regular step.
    fn redraw(&mut self) {}

    /// Generation/population readouts should be refreshed.
    fn update_info(&mut self) {}

    fn on_tick(&mut self, _tick: TickInfo) {}

    fn on_stop(&mut self, _signal: StopSignal) {}

    fn notify(&mut self, _notice: Notice) {}
}

/// Host that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl Host for NullHost {}
