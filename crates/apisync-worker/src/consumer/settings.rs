use std::time::Duration;

use crate::{Result, WorkerError};

/// Tracing target for loop configuration.
const TRACING_TARGET: &str = "apisync_worker::config";

/// Validated pacing of the consumption loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSettings {
    batch_size: usize,
    poll_timeout: Duration,
    idle_threshold: Duration,
}

impl LoopSettings {
    /// Validates and creates loop settings.
    ///
    /// The idle threshold must cover at least one poll timeout. A threshold
    /// below two timeouts is accepted but ends a run after a single empty
    /// poll, which is logged as a warning.
    pub fn new(batch_size: usize, poll_timeout: Duration, idle_threshold: Duration) -> Result<Self> {
        if batch_size == 0 {
            return Err(WorkerError::invalid_config("batch size must be at least 1"));
        }
        if poll_timeout < Duration::from_secs(1) {
            return Err(WorkerError::invalid_config(
                "poll timeout must be at least one second",
            ));
        }
        if idle_threshold < poll_timeout {
            return Err(WorkerError::invalid_config(format!(
                "idle threshold ({}s) must not be shorter than the poll timeout ({}s)",
                idle_threshold.as_secs(),
                poll_timeout.as_secs()
            )));
        }

        if idle_threshold < poll_timeout.saturating_mul(2) {
            tracing::warn!(
                target: TRACING_TARGET,
                poll_timeout_secs = poll_timeout.as_secs(),
                idle_threshold_secs = idle_threshold.as_secs(),
                "Idle threshold is shorter than two poll timeouts, a single empty poll ends the run"
            );
        }

        Ok(Self {
            batch_size,
            poll_timeout,
            idle_threshold,
        })
    }

    /// Returns the maximum number of messages per poll.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns how long one poll waits.
    pub fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }

    /// Returns the accumulated quiet time that ends a run.
    pub fn idle_threshold(&self) -> Duration {
        self.idle_threshold
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            poll_timeout: Duration::from_secs(5),
            idle_threshold: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_values() {
        let second = Duration::from_secs(1);
        assert!(LoopSettings::new(0, second, second).is_err());
        assert!(LoopSettings::new(1, Duration::ZERO, second).is_err());
        assert!(LoopSettings::new(1, Duration::from_millis(500), second).is_err());
    }

    #[test]
    fn test_threshold_must_cover_one_poll() {
        assert!(LoopSettings::new(10, Duration::from_secs(5), Duration::from_secs(4)).is_err());
        assert!(LoopSettings::new(10, Duration::from_secs(5), Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_default_matches_documented_values() {
        let settings = LoopSettings::default();
        assert_eq!(
            LoopSettings::new(10, Duration::from_secs(5), Duration::from_secs(10)).unwrap(),
            settings
        );
    }
}
