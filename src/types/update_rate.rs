//! Update rate control for snapshot subscriptions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often a subscriber wants snapshots delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every snapshot the poll loop publishes
    Native,

    /// At most this many snapshots per second. Rates at or above the writer's tick
    /// rate, and a rate of zero, collapse to `Native`.
    Max(u32),
}

impl UpdateRate {
    /// Normalize against the writer's tick rate in Hz.
    pub fn normalize(self, source_hz: f64) -> Self {
        match self {
            UpdateRate::Max(hz) if hz > 0 && f64::from(hz) < source_hz => UpdateRate::Max(hz),
            _ => UpdateRate::Native,
        }
    }

    /// Minimum spacing between delivered snapshots, if any.
    pub fn throttle_interval(self, source_hz: f64) -> Option<Duration> {
        match self.normalize(source_hz) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / f64::from(hz))),
        }
    }
}
