//! Exponential reconnect backoff.

use std::time::Duration;

use heartline_core::config::FeedConfig;

/// Bounded exponential backoff: `min(base * 2^(attempt-1), max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry
    pub base: Duration,
    /// Delay cap
    pub max: Duration,
    /// Consecutive retries allowed before giving up
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    /// Build the policy from feed configuration.
    pub fn from_config(config: &FeedConfig) -> Self {
        Self {
            base: config.base_backoff(),
            max: config.max_backoff(),
            max_attempts: config.max_reconnect_attempts,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 1u32.checked_shl(exponent).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }

    /// Whether another retry is allowed after `attempts_so_far` retries.
    pub fn allows(&self, attempts_so_far: u32) -> bool {
        attempts_so_far < self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&FeedConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double_then_cap() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u128> = (1..=6).map(|a| policy.delay_for(a).as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000, 10_000]);
    }

    #[test]
    fn test_large_attempt_does_not_overflow() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(64), Duration::from_secs(10));
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_allows_up_to_max_attempts() {
        let policy = ReconnectPolicy::default();
        assert!(policy.allows(0));
        assert!(policy.allows(2));
        assert!(!policy.allows(3));
    }
}
