//! Retry policy: decides backoff delays.

use std::time::Duration;

use crate::config::RetryConfig;

/// Backoff policy for failed publish attempts.
///
/// Pure and stateless; the engine owns the waiting, the policy only computes
/// how long. Kept separate so the delay curve is testable on its own.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Multiplier applied per additional retry (exponential backoff).
    pub multiplier: f64,
}

impl RetryPolicy {
    pub fn new(initial_delay: Duration, multiplier: f64) -> Self {
        Self {
            initial_delay,
            multiplier,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_delay_ms),
            config.backoff_multiplier,
        )
    }

    /// Delay before the attempt with the given retry count.
    ///
    /// `delay(n) = initial_delay * multiplier^(n - 1)` for `n >= 1`.
    /// A first attempt (`retry_count == 0`) never waits; callers skip the
    /// policy entirely in that case.
    pub fn delay(&self, retry_count: u32) -> Duration {
        let exponent = retry_count.saturating_sub(1);
        let secs = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent as i32);
        Duration::from_secs_f64(secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_retry_waits_the_initial_delay() {
        let policy = RetryPolicy::new(Duration::from_millis(1000), 2.0);
        assert_eq!(policy.delay(1), Duration::from_millis(1000));
    }

    #[test]
    fn delay_grows_geometrically() {
        let policy = RetryPolicy::new(Duration::from_millis(1000), 2.0);
        assert_eq!(policy.delay(2), Duration::from_millis(2000));
        assert_eq!(policy.delay(3), Duration::from_millis(4000));
    }

    #[test]
    fn delay_is_monotonic() {
        let policy = RetryPolicy::default();
        let mut last = Duration::ZERO;
        for n in 1..=6 {
            let d = policy.delay(n);
            assert!(d >= last);
            last = d;
        }
    }

    #[test]
    fn defaults_match_the_shipped_config() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_millis(1000));
        assert_eq!(policy.multiplier, 2.0);
    }
}
