//! Loop configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Smallest cycle rate the interval computation accepts
///
/// Rates at or below zero (and NaN) clamp here instead of producing a zero,
/// negative, or infinite tick interval.
pub(crate) const MIN_FPS: f64 = 1e-6;

/// Loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLoopConfig {
    /// Target cycles per second
    #[serde(default = "default_fps")]
    pub fps: f64,

    /// Begin cycling when the first item lands in an idle loop, without an
    /// explicit start() call
    #[serde(default = "default_auto_start")]
    pub auto_start: bool,
}

fn default_fps() -> f64 {
    15.0
}

fn default_auto_start() -> bool {
    true
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            fps: 15.0,
            auto_start: true,
        }
    }
}

impl GameLoopConfig {
    /// Tick interval derived from the configured rate
    pub fn tick_interval(&self) -> Duration {
        tick_interval_for(self.fps)
    }
}

/// Compute the tick interval for a target rate, clamping the rate to MIN_FPS
pub(crate) fn tick_interval_for(fps: f64) -> Duration {
    Duration::from_secs_f64(1.0 / fps.max(MIN_FPS))
}
