// stability.rs - Detects fixed points and short-period oscillators

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::grid::CellGrid;

/// Grids remembered by default; oscillators with a longer period are never detected.
pub const DEFAULT_WINDOW: usize = 10;

/// Consecutive stable ticks required by default before triggering.
pub const DEFAULT_DELAY: u32 = 3;

/// Exact generation equality. `false` for a missing side or any dimension mismatch.
pub fn compare_generations(a: Option<&CellGrid>, b: Option<&CellGrid>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_dims(b) && a.cells() == b.cells(),
        _ => false,
    }
}

/// Outcome of one [`StabilityDetector::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Detection is switched off.
    Disabled,
    /// The grid differs from everything in the window.
    Changing,
    /// The grid repeats; this many consecutive repeats so far.
    Settling(u32),
    /// The repeat count reached the delay. Window and counter were reset.
    Triggered,
}

impl Verdict {
    pub fn is_triggered(self) -> bool {
        self == Verdict::Triggered
    }
}

#[derive(Debug, Clone)]
pub struct StabilityDetector {
    window: VecDeque<CellGrid>,
    capacity: usize,
    consecutive_stable: u32,
    delay: u32,
    enabled: bool,
}

impl Default for StabilityDetector {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl StabilityDetector {
    pub fn new(delay: u32) -> Self {
        Self::with_window(delay, DEFAULT_WINDOW)
    }

    pub fn with_window(delay: u32, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
            consecutive_stable: 0,
            delay: delay.max(1),
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enabling always starts from an empty window.
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled {
            self.reset();
        }
        self.enabled = enabled;
    }

    pub fn delay(&self) -> u32 {
        self.delay
    }

    pub fn set_delay(&mut self, delay: u32) {
        self.delay = delay.max(1);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    pub fn consecutive_stable(&self) -> u32 {
        self.consecutive_stable
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.consecutive_stable = 0;
    }

    /// Feed the grid of the tick that just happened.
    pub fn check(&mut self, current: &CellGrid) -> Verdict {
        if !self.enabled {
            return Verdict::Disabled;
        }

        let is_stable = self
            .window
            .iter()
            .any(|seen| compare_generations(Some(seen), Some(current)));

        self.window.push_back(current.clone());
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }

        if !is_stable {
            self.consecutive_stable = 0;
            return Verdict::Changing;
        }

        self.consecutive_stable += 1;
        debug!(count = self.consecutive_stable, delay = self.delay, "pattern repeating");
        if self.consecutive_stable >= self.delay {
            info!("pattern stabilized");
            self.reset();
            return Verdict::Triggered;
        }
        Verdict::Settling(self.consecutive_stable)
    }
}
