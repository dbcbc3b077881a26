// timer.rs - Polled periodic timer for the live loop and replay

use std::time::{Duration, Instant};

/// Fastest replay cadence.
pub const MIN_REPLAY_PERIOD: Duration = Duration::from_millis(100);

/// Replay period for a speed factor: `max(100ms, 1000ms / speed)`.
pub fn replay_period(speed_factor: f64) -> Duration {
    let speed = if speed_factor.is_finite() && speed_factor > 0.0 {
        speed_factor
    } else {
        1.0
    };
    Duration::from_secs_f64(1.0 / speed).max(MIN_REPLAY_PERIOD)
}

/// Period of the live loop for a speed in generations per second.
pub fn generation_period(gens_per_sec: f64) -> Duration {
    if gens_per_sec.is_finite() && gens_per_sec > 0.0 {
        Duration::from_secs_f64(1.0 / gens_per_sec)
    } else {
        Duration::from_secs(1)
    }
}

/// Fires at most once per poll, then waits a full period from that poll.
///
/// An idle interval never fires; cancelling is just going idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period: Duration,
    next_due: Option<Instant>,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Takes effect from the next firing.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// `true` when the period has elapsed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.period);
                true
            }
            _ => false,
        }
    }
}
