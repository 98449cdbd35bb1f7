//! Connection liveness from the header status bit and snapshot freshness.
//!
//! The simulator sets the connected bit while a session is loaded but can stall or die
//! without clearing it. The monitor therefore also requires a fresh snapshot within the
//! liveness window. Until the first snapshot arrives the window runs from the moment the
//! status bit was first seen set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

/// Connection state reported by [`LivenessMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("disconnected"),
            ConnectionState::Connected => f.write_str("connected"),
        }
    }
}

/// Tracks connected/disconnected transitions. Time is passed in by the caller.
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    window: Duration,
    last_capture: Option<Instant>,
    status_since: Option<Instant>,
    state: ConnectionState,
}

impl LivenessMonitor {
    pub fn new(window: Duration) -> Self {
        Self { window, last_capture: None, status_since: None, state: ConnectionState::Disconnected }
    }

    /// Record a successful snapshot capture.
    pub fn record_capture(&mut self, at: Instant) {
        self.last_capture = Some(at);
    }

    /// Update the state from the header status bit at `now`.
    pub fn observe(&mut self, status_connected: bool, now: Instant) -> ConnectionState {
        let next = if status_connected {
            let since = *self.status_since.get_or_insert(now);
            let reference = self.last_capture.unwrap_or(since);
            if now.saturating_duration_since(reference) <= self.window {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            }
        } else {
            self.status_since = None;
            self.last_capture = None;
            ConnectionState::Disconnected
        };

        if next != self.state {
            info!(
                from = %self.state,
                to = %next,
                status_connected,
                window_ms = self.window.as_millis() as u64,
                "Connection state changed"
            );
            self.state = next;
        }

        next
    }

    /// The state as of the last [`observe`](Self::observe).
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn last_capture(&self) -> Option<Instant> {
        self.last_capture
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.last_capture = None;
        self.status_since = None;
        self.state = ConnectionState::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const WINDOW: Duration = Duration::from_secs(3);

    #[test]
    fn stale_capture_is_disconnected() {
        let start = Instant::now();
        let mut monitor = LivenessMonitor::new(WINDOW);

        assert_eq!(monitor.observe(true, start), ConnectionState::Connected);
        monitor.record_capture(start);
        assert_eq!(monitor.observe(true, start + Duration::from_secs(10)), ConnectionState::Disconnected);
    }

    #[test]
    fn fresh_capture_keeps_connection() {
        let start = Instant::now();
        let mut monitor = LivenessMonitor::new(WINDOW);

        monitor.record_capture(start);
        assert_eq!(monitor.observe(true, start + Duration::from_secs(2)), ConnectionState::Connected);

        monitor.record_capture(start + Duration::from_secs(9));
        assert_eq!(monitor.observe(true, start + Duration::from_secs(10)), ConnectionState::Connected);
    }

    #[test]
    fn cleared_status_bit_disconnects_immediately() {
        let start = Instant::now();
        let mut monitor = LivenessMonitor::new(WINDOW);

        monitor.record_capture(start);
        assert_eq!(monitor.observe(true, start), ConnectionState::Connected);
        assert_eq!(monitor.observe(false, start), ConnectionState::Disconnected);
        assert_eq!(monitor.last_capture(), None);
    }

    #[test]
    fn status_without_captures_gets_one_window_of_grace() {
        let start = Instant::now();
        let mut monitor = LivenessMonitor::new(WINDOW);

        assert!(monitor.observe(true, start).is_connected());
        assert!(monitor.observe(true, start + Duration::from_secs(3)).is_connected());
        assert!(!monitor.observe(true, start + Duration::from_secs(4)).is_connected());
    }

    #[test]
    fn reconnect_after_status_drop_restarts_grace() {
        let start = Instant::now();
        let mut monitor = LivenessMonitor::new(WINDOW);

        monitor.record_capture(start);
        monitor.observe(false, start + Duration::from_secs(20));
        assert!(monitor.observe(true, start + Duration::from_secs(21)).is_connected());
    }

    proptest! {
        #[test]
        fn connected_iff_capture_within_window(age_ms in 0u64..10_000, window_ms in 1u64..5_000) {
            let start = Instant::now();
            let window = Duration::from_millis(window_ms);
            let mut monitor = LivenessMonitor::new(window);

            monitor.observe(true, start);
            monitor.record_capture(start);
            let state = monitor.observe(true, start + Duration::from_millis(age_ms));
            prop_assert_eq!(state.is_connected(), age_ms <= window_ms);
            prop_assert_eq!(monitor.state(), state);
        }
    }
}
