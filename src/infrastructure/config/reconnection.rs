//! Reconnection configuration.

use serde::Deserialize;

/// Backoff settings for push transports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReconnectionConfig {
    /// Delay before the first reconnection attempt (milliseconds).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Consecutive failed attempts after which reconnection is abandoned.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

const fn default_base_delay_ms() -> u64 {
    2000
}

const fn default_max_attempts() -> u32 {
    5
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}
