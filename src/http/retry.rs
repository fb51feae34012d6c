//! Retry policies for exchange requests.
//!
//! Only idempotent calls (`GET`) are retried by default. Order placement,
//! cancellation and withdrawals go out exactly once.

use std::time::Duration;

use crate::describe::Verb;

#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// Single attempt.
    #[default]
    None,
    /// [`RetryConfig::idempotent`].
    Idempotent,
    Custom(RetryConfig),
}

impl RetryPolicy {
    /// Effective configuration, `None` when the call must not be retried.
    pub fn config(&self) -> Option<RetryConfig> {
        match self {
            RetryPolicy::None => None,
            RetryPolicy::Idempotent => Some(RetryConfig::idempotent()),
            RetryPolicy::Custom(config) => Some(config.clone()),
        }
    }

    /// The policy a call with `verb` runs under, given the policy configured
    /// for idempotent calls.
    pub fn for_verb(verb: Verb, idempotent: &RetryPolicy) -> RetryPolicy {
        match verb {
            Verb::Get => idempotent.clone(),
            _ => RetryPolicy::None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// ±25 % random spread on each delay.
    pub jitter: bool,
    /// Statuses answered by another attempt. When the last attempt still gets
    /// one, that response is handed to the error classifier.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            jitter: true,
            retryable_statuses: vec![502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Default for `GET` calls: the gateway errors plus 429.
    pub fn idempotent() -> Self {
        Self {
            retryable_statuses: vec![429, 502, 503, 504],
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }

    /// Backoff before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let final_ms = if self.jitter {
            let spread = capped * 0.25;
            let offset = (rand::random::<f64>() - 0.5) * 2.0 * spread;
            (capped + offset).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(final_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(initial_ms: u64, max_ms: u64, factor: f64) -> RetryConfig {
        RetryConfig {
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_millis(max_ms),
            backoff_factor: factor,
            jitter: false,
            ..RetryConfig::default()
        }
    }

    #[test]
    fn test_default_policy_does_not_retry() {
        assert!(RetryPolicy::default().config().is_none());
    }

    #[test]
    fn test_only_get_inherits_idempotent_policy() {
        let configured = RetryPolicy::Idempotent;
        assert!(RetryPolicy::for_verb(Verb::Get, &configured).config().is_some());
        assert!(RetryPolicy::for_verb(Verb::Post, &configured).config().is_none());
        assert!(RetryPolicy::for_verb(Verb::Delete, &configured).config().is_none());
    }

    #[test]
    fn test_idempotent_retries_rate_limits() {
        let config = RetryConfig::idempotent();
        for status in [429, 502, 503, 504] {
            assert!(config.is_retryable_status(status));
        }
        assert!(!config.is_retryable_status(500));
        assert!(!RetryConfig::default().is_retryable_status(429));
    }

    #[test]
    fn test_exponential_backoff_without_jitter() {
        let config = fixed(100, 10_000, 2.0);
        let delays: Vec<u128> = (0..3).map(|a| config.delay_for_attempt(a).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400]);
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(fixed(1000, 2000, 10.0).delay_for_attempt(3).as_millis(), 2000);
    }

    #[test]
    fn test_jitter_stays_within_quarter() {
        let config = RetryConfig { jitter: true, ..fixed(1000, 10_000, 1.0) };
        for _ in 0..50 {
            let ms = config.delay_for_attempt(0).as_millis();
            assert!((750..=1250).contains(&ms), "{}", ms);
        }
    }
}
