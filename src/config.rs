//! Reader configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of fence-and-retry attempts per poll
pub const DEFAULT_MAX_READ_ATTEMPTS: u32 = 3;

/// Default time without a fresh snapshot before the connection counts as lost
pub const DEFAULT_LIVENESS_WINDOW: Duration = Duration::from_secs(3);

/// Default wait for the writer's new-data signal
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Configuration for a [`crate::Telemetry`] context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Attempts to copy a buffer row before giving up with a torn read
    pub max_read_attempts: u32,
    /// Connection is considered lost after this long without a fresh snapshot
    pub liveness_window: Duration,
    /// How long `wait_for_data` blocks on the writer's signal
    pub wait_timeout: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_read_attempts: DEFAULT_MAX_READ_ATTEMPTS,
            liveness_window: DEFAULT_LIVENESS_WINDOW,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl ReaderConfig {
    /// At least one attempt is always made.
    pub fn with_max_read_attempts(mut self, attempts: u32) -> Self {
        self.max_read_attempts = attempts.max(1);
        self
    }

    pub fn with_liveness_window(mut self, window: Duration) -> Self {
        self.liveness_window = window;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_sdk() {
        let config = ReaderConfig::default();
        assert_eq!(config.wait_timeout, Duration::from_millis(500));
        assert_eq!(config.max_read_attempts, 3);
        assert_eq!(config.liveness_window, Duration::from_secs(3));
    }

    #[test]
    fn builders_override_fields() {
        let config = ReaderConfig::default()
            .with_max_read_attempts(0)
            .with_liveness_window(Duration::from_secs(1))
            .with_wait_timeout(Duration::from_millis(16));

        assert_eq!(config.max_read_attempts, 1);
        assert_eq!(config.liveness_window, Duration::from_secs(1));
        assert_eq!(config.wait_timeout, Duration::from_millis(16));
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config: ReaderConfig = serde_yaml_ng::from_str("max_read_attempts: 5\n").unwrap();
        assert_eq!(config.max_read_attempts, 5);
        assert_eq!(config.wait_timeout, DEFAULT_WAIT_TIMEOUT);
        assert_eq!(config.liveness_window, DEFAULT_LIVENESS_WINDOW);
    }

    #[test]
    fn region_length_comes_from_the_source() {
        // Older documents may still carry a region length; the mapped source decides it.
        let config: ReaderConfig =
            serde_yaml_ng::from_str("region_len: 4096\nmax_read_attempts: 2\n").unwrap();
        assert_eq!(config, ReaderConfig::default().with_max_read_attempts(2));
    }
}
