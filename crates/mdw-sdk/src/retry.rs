use std::time::Duration;

use crate::classify::ErrorClass;
use crate::config::SaveConfig;

/// Bounded retry with capped exponential backoff.
///
/// Delay before attempt `n + 1` is `min(base * 2^(n-1), cap)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl RetryPolicy {
    /// Policy from save settings. At least one attempt is always made.
    pub fn from_config(config: &SaveConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base: Duration::from_millis(config.backoff_base_ms),
            cap: Duration::from_millis(config.backoff_cap_ms),
        }
    }

    /// Delay after failed attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.cap)
            .min(self.cap)
    }

    /// Whether a failure on `attempt` (1-based) gets another try.
    pub fn should_retry(&self, attempt: u32, class: ErrorClass) -> bool {
        class.is_retryable() && attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SaveConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(1_000));
        assert_eq!(policy.backoff(2), Duration::from_millis(2_000));
        assert_eq!(policy.backoff(3), Duration::from_millis(4_000));
        assert_eq!(policy.backoff(4), Duration::from_millis(5_000));
        assert_eq!(policy.backoff(40), Duration::from_millis(5_000));
    }

    #[test]
    fn retries_only_network_class_within_budget() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1, ErrorClass::Network));
        assert!(policy.should_retry(2, ErrorClass::Network));
        assert!(!policy.should_retry(3, ErrorClass::Network));
        assert!(!policy.should_retry(1, ErrorClass::Other));
        assert!(!policy.should_retry(
            1,
            ErrorClass::InsufficientBalance { required: None }
        ));
    }

    #[test]
    fn zero_attempts_is_clamped() {
        let config = SaveConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);
    }
}
