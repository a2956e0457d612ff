//! Connect Retry Policy
//!
//! Linear backoff for bridge handshakes: after the n-th failed attempt the
//! caller waits `step * n` before trying again, until `max_attempts`
//! handshakes have been made. Data requests are never retried.

use std::time::Duration;

use rand::Rng;

/// Configuration for handshake retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total handshake attempts, including the first (minimum 1).
    pub max_attempts: u32,
    /// Linear backoff step.
    pub backoff_step: Duration,
    /// Jitter factor as a fraction (e.g., 0.1 = ±10% randomization).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_secs(2),
            jitter_factor: 0.0,
        }
    }
}

impl RetryConfig {
    /// Create a new configuration with custom values.
    #[must_use]
    pub const fn new(max_attempts: u32, backoff_step: Duration, jitter_factor: f64) -> Self {
        Self {
            max_attempts,
            backoff_step,
            jitter_factor,
        }
    }

    /// Retry without waiting between attempts.
    #[must_use]
    pub const fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, 0.0)
    }
}

/// Linear backoff over a bounded number of attempts.
///
/// # Example
///
/// ```rust
/// use bridge_client::infrastructure::retry::{LinearBackoff, RetryConfig};
/// use std::time::Duration;
///
/// let mut backoff = LinearBackoff::new(RetryConfig::default());
///
/// // First handshake failed: wait one step.
/// assert_eq!(backoff.next_delay(), Some(Duration::from_secs(2)));
/// // Second failed: wait two steps.
/// assert_eq!(backoff.next_delay(), Some(Duration::from_secs(4)));
/// // Third failed: budget exhausted.
/// assert_eq!(backoff.next_delay(), None);
/// ```
#[derive(Debug)]
pub struct LinearBackoff {
    config: RetryConfig,
    failed_attempts: u32,
}

impl LinearBackoff {
    /// Create a new backoff schedule.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self {
            config,
            failed_attempts: 0,
        }
    }

    /// Record a failed attempt and get the delay before the next one.
    ///
    /// Returns `None` once `max_attempts` attempts have failed.
    #[must_use]
    pub fn next_delay(&mut self) -> Option<Duration> {
        self.failed_attempts = self.failed_attempts.saturating_add(1);

        if self.failed_attempts >= self.config.max_attempts.max(1) {
            return None;
        }

        let delay = self.config.backoff_step.saturating_mul(self.failed_attempts);
        Some(self.apply_jitter(delay))
    }

    /// Number of failed attempts recorded so far.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.failed_attempts
    }

    /// Apply jitter to a duration.
    fn apply_jitter(&self, duration: Duration) -> Duration {
        if self.config.jitter_factor <= 0.0 || duration.is_zero() {
            return duration;
        }

        #[allow(clippy::cast_precision_loss)]
        let base_millis = duration.as_millis() as f64;
        let jitter_range = base_millis * self.config.jitter_factor;
        let mut rng = rand::rng();
        let jitter: f64 = rng.random_range(-jitter_range..=jitter_range);
        let adjusted_millis = (base_millis + jitter).max(1.0);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let adjusted_u64 = adjusted_millis as u64;
        Duration::from_millis(adjusted_u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_step, Duration::from_secs(2));
        assert!(config.jitter_factor.abs() < f64::EPSILON);
    }

    #[test]
    fn linear_schedule() {
        let mut backoff = LinearBackoff::new(RetryConfig::new(
            5,
            Duration::from_millis(100),
            0.0,
        ));

        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(300)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(400)));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempt_count(), 5);
    }

    #[test]
    fn single_attempt_never_waits() {
        let mut backoff = LinearBackoff::new(RetryConfig::immediate(1));
        assert_eq!(backoff.next_delay(), None);
    }

    #[test]
    fn zero_attempts_treated_as_one() {
        let mut backoff = LinearBackoff::new(RetryConfig::immediate(0));
        assert_eq!(backoff.next_delay(), None);
        assert_eq!(backoff.attempt_count(), 1);
    }

    #[test]
    fn jitter_bounds() {
        for _ in 0..100 {
            let mut backoff = LinearBackoff::new(RetryConfig::new(
                3,
                Duration::from_millis(1000),
                0.1,
            ));

            let millis = backoff.next_delay().unwrap().as_millis();
            assert!(millis >= 900, "delay {millis}ms is below minimum 900ms");
            assert!(millis <= 1100, "delay {millis}ms is above maximum 1100ms");
        }
    }
}
