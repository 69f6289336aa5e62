use std::time::Duration;

/// Time the stream has been quiet, measured in poll timeouts.
///
/// The clock is not wall time: it only moves when an empty poll is
/// reported, by exactly the timeout of that poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleClock {
    elapsed: Duration,
    threshold: Duration,
}

impl IdleClock {
    /// Creates a clock that trips once `threshold` has accumulated.
    pub const fn new(threshold: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            threshold,
        }
    }

    /// Restarts counting after a poll that returned something.
    pub fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    /// Records an empty poll and returns whether the threshold is reached.
    pub fn advance(&mut self, by: Duration) -> bool {
        self.elapsed = self.elapsed.saturating_add(by);
        self.is_idle()
    }

    /// Returns true once the threshold is reached.
    pub fn is_idle(&self) -> bool {
        self.elapsed >= self.threshold
    }

    /// Returns the accumulated idle time.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns the threshold.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_empty_polls_reach_threshold() {
        let mut clock = IdleClock::new(Duration::from_secs(10));
        assert!(!clock.advance(Duration::from_secs(5)));
        assert!(clock.advance(Duration::from_secs(5)));
        assert_eq!(clock.elapsed(), Duration::from_secs(10));
    }

    #[test]
    fn test_reset_restarts_counting() {
        let mut clock = IdleClock::new(Duration::from_secs(10));
        clock.advance(Duration::from_secs(5));
        clock.reset();
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert!(!clock.advance(Duration::from_secs(5)));
        assert!(!clock.is_idle());
    }

    #[test]
    fn test_uneven_threshold_trips_on_overshoot() {
        let mut clock = IdleClock::new(Duration::from_secs(7));
        assert!(!clock.advance(Duration::from_secs(5)));
        assert!(clock.advance(Duration::from_secs(5)));
    }
}
