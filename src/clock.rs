//! Injectable time source for cycle bookkeeping
//!
//! The loop never reads wall-clock time directly; every cycle timestamps
//! itself through the [`Clock`] capability so tests can drive elapsed time
//! deterministically.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Source of monotonic timestamps
pub trait Clock: Send + Sync {
    /// The current instant
    fn now(&self) -> Instant;
}

/// Default clock backed by the tokio runtime
///
/// Under a paused runtime (`tokio::time::pause`) this follows virtual time,
/// so paused-time tests stay deterministic without swapping the clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock for tests
///
/// Starts pinned to the instant of construction and only moves when
/// [`advance`](ManualClock::advance) is called.
#[derive(Debug)]
pub struct ManualClock {
    epoch: Instant,
    offset_ms: AtomicU64,
}

impl ManualClock {
    /// Create a clock pinned to the current instant
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    /// Advance the clock by `step` (millisecond resolution)
    pub fn advance(&self, step: Duration) {
        self.offset_ms.fetch_add(step.as_millis() as u64, Ordering::Relaxed);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.epoch + Duration::from_millis(self.offset_ms.load(Ordering::Relaxed))
    }
}
