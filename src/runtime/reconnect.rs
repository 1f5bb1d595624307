//! Reconnection policy for push transports.
//!
//! Delays double from the base on every attempt:
//! `base_delay * 2^(attempt - 1)`. No jitter is added, so the schedule is
//! exactly reproducible. Once `max_attempts` reconnects have been tried
//! without a message getting through, the policy gives up and the adapter
//! stays down until the caller connects again.

use std::time::Duration;

use crate::infrastructure::config::reconnection::ReconnectionConfig;

/// A reconnect the policy has approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    /// 1-based attempt number.
    pub attempt: u32,
    /// How long to wait before reconnecting.
    pub delay: Duration,
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    base_delay: Duration,
    max_attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(config: &ReconnectionConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_attempts: config.max_attempts,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the given 1-based attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Every delay the policy will wait, in attempt order.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_attempts).map(|attempt| self.delay_for(attempt))
    }

    /// Decide the next retry given how many attempts were already made.
    ///
    /// Returns `None` once the budget is spent.
    pub fn next_retry(&self, attempts_made: u32) -> Option<Retry> {
        if attempts_made >= self.max_attempts {
            return None;
        }
        let attempt = attempts_made + 1;
        Some(Retry {
            attempt,
            delay: self.delay_for(attempt),
        })
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(&ReconnectionConfig::default())
    }
}
