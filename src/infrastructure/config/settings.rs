//! Application configuration loading and validation.
//!
//! Provides the [`Config`] struct that aggregates all settings of the
//! `freightfeed` binary. Configuration is loaded from a TOML file; the
//! `FREIGHTFEED_ENDPOINT` environment variable overrides `[stream].endpoint`.
//!
//! # Example
//!
//! ```no_run
//! use freightfeed::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("freightfeed.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::logging::LoggingConfig;
use super::reconnection::ReconnectionConfig;
use crate::adapter::outbound::validate_endpoint;
use crate::error::{ConfigError, Result};
use crate::runtime::{ConnectionConfig, DEFAULT_MAX_AGE_MINUTES};

/// Environment variable overriding the configured endpoint.
pub const ENDPOINT_ENV: &str = "FREIGHTFEED_ENDPOINT";

/// Freshness window used when reporting on the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FreshnessConfig {
    #[serde(default = "default_max_age_minutes")]
    pub max_age_minutes: u32,
}

const fn default_max_age_minutes() -> u32 {
    DEFAULT_MAX_AGE_MINUTES
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            max_age_minutes: default_max_age_minutes(),
        }
    }
}

/// Main application configuration.
///
/// Every section is optional. Load from a file with [`Config::load`] or
/// parse directly with [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// The data source to stream from.
    #[serde(default)]
    pub stream: ConnectionConfig,

    /// Backoff for push transports.
    #[serde(default)]
    pub reconnection: ReconnectionConfig,

    #[serde(default)]
    pub freshness: FreshnessConfig,
}

impl Config {
    /// Parse and validate configuration from TOML content.
    ///
    /// Environment overrides are not applied; see [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config = Self::parse_unvalidated(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, apply environment overrides and
    /// validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let mut config = Self::parse_unvalidated(&content)?;
        config.override_endpoint(std::env::var(ENDPOINT_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    fn parse_unvalidated(content: &str) -> Result<Self> {
        Ok(toml::from_str(content).map_err(ConfigError::Parse)?)
    }

    /// Replace the endpoint when `endpoint` is non-blank.
    pub fn override_endpoint(&mut self, endpoint: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.stream.endpoint = Some(endpoint);
        }
    }

    /// Validate configuration values.
    ///
    /// A missing endpoint is allowed; the adapter then stays idle.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = self.stream.endpoint() {
            validate_endpoint(endpoint, self.stream.transport)?;
        }
        if self.stream.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.stream.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.reconnection.base_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "base_delay_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.reconnection.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_attempts",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !self.logging.is_known_format() {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: format!("unknown log format '{}'", self.logging.format),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
