//! Handler for the `config` command group.

use std::path::Path;

use anyhow::{Context, Result};
use freightfeed::infrastructure::config::settings::{Config, ENDPOINT_ENV};
use freightfeed::port::TransportKind;
use freightfeed::runtime::ReconnectPolicy;

use crate::cli::output;

/// Execute `config validate`.
pub fn execute_validate(path: &Path) -> Result<()> {
    let config = Config::load(path)
        .with_context(|| format!("invalid configuration in {}", path.display()))?;

    output::ok(&format!("{} is valid", path.display()));

    output::section("Stream");
    match config.stream.endpoint() {
        Some(endpoint) => output::key_value("Endpoint", endpoint),
        None => output::warn(&format!(
            "No endpoint configured; set [stream].endpoint or {ENDPOINT_ENV}"
        )),
    }
    output::key_value("Transport", config.stream.transport);
    if config.stream.transport == TransportKind::Polling {
        output::key_value("Poll interval", output::millis(config.stream.poll_interval_ms));
        output::key_value("Timeout", output::millis(config.stream.request_timeout_ms));
    }

    output::section("Reconnection");
    if config.stream.transport.is_push() {
        let policy = ReconnectPolicy::new(&config.reconnection);
        output::key_value("Max attempts", policy.max_attempts());
        output::key_value("Delays", output::schedule(policy.schedule()));
    } else {
        output::key_value("Delays", "not used; polling retries on its interval");
    }

    output::section("Freshness");
    output::key_value(
        "Max age",
        format!("{} min", config.freshness.max_age_minutes),
    );
    Ok(())
}
