//! Exponential reconnect backoff.
//!
//! Owns the consecutive-failure counter: incremented on every connection
//! loss, reset to zero on every successful open. No jitter; this is a
//! single-client tool, not a fleet.

use crate::config::BackoffConfig;
use std::time::Duration;

/// Reconnect delay schedule with an attempt counter.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    config: BackoffConfig,
    attempts: u32,
}

impl ReconnectBackoff {
    /// Create a fresh schedule with zero recorded failures.
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Record one connection loss and return the delay to wait before the
    /// next attempt.
    pub fn record_failure(&mut self) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.delay()
    }

    /// Reset the counter after a successful open.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Consecutive failures since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay for the current attempt count:
    /// `growth^min(attempts, max_exponent) * base_delay`.
    pub fn delay(&self) -> Duration {
        let exponent = self.attempts.min(self.config.max_exponent);
        self.config
            .base_delay
            .mul_f64(self.config.growth.powi(exponent as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backoff() -> ReconnectBackoff {
        ReconnectBackoff::new(BackoffConfig::default())
    }

    #[test]
    fn first_failure_waits_twelve_seconds() {
        let mut backoff = backoff();
        let delay = backoff.record_failure();
        assert_eq!(delay, Duration::from_secs(10).mul_f64(1.2));
        assert_eq!(backoff.attempts(), 1);
    }

    #[test]
    fn delay_is_monotonically_non_decreasing() {
        let mut backoff = backoff();
        let mut last = Duration::ZERO;
        for _ in 0..20 {
            let delay = backoff.record_failure();
            assert!(delay >= last);
            last = delay;
        }
    }

    #[test]
    fn delay_is_capped_at_the_max_exponent() {
        let mut backoff = backoff();
        for _ in 0..10 {
            backoff.record_failure();
        }
        let at_cap = backoff.delay();

        for _ in 0..10 {
            backoff.record_failure();
        }
        assert_eq!(backoff.delay(), at_cap);

        // 1.2^10 * 10s, a hair under 62 seconds.
        assert!(at_cap > Duration::from_secs(61));
        assert!(at_cap < Duration::from_secs(62));
    }

    #[test]
    fn reset_restarts_the_schedule() {
        let mut backoff = backoff();
        for _ in 0..5 {
            backoff.record_failure();
        }
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.record_failure(), Duration::from_secs(10).mul_f64(1.2));
    }
}
