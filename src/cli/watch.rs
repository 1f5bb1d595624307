//! Handler for the `watch` command.

use std::time::Duration;

use anyhow::{Context, Result};
use freightfeed::domain::Snapshot;
use freightfeed::error::ConfigError;
use freightfeed::infrastructure::config::settings::Config;
use freightfeed::runtime::{Hooks, StreamAdapter};
use tokio::signal;
use tracing::{error, info, warn};

use crate::cli::WatchArgs;

/// How often the freshness of the snapshot is reported.
const FRESHNESS_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Execute the watch command.
pub async fn execute(args: &WatchArgs) -> Result<()> {
    let mut config = Config::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;

    // Apply CLI overrides
    config.override_endpoint(args.endpoint.clone());
    if let Some(transport) = args.transport {
        config.stream.transport = transport;
    }
    if let Some(interval) = args.poll_interval_ms {
        config.stream.poll_interval_ms = interval;
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    config.validate().context("invalid command-line override")?;
    if config.stream.endpoint().is_none() {
        return Err(ConfigError::MissingField { field: "endpoint" }.into());
    }

    config.init_logging();

    let adapter = StreamAdapter::builder()
        .reconnection(config.reconnection.clone())
        .build();
    let max_age = config.freshness.max_age_minutes;

    info!(
        adapter = %adapter.id(),
        endpoint = config.stream.endpoint().unwrap_or_default(),
        transport = %config.stream.transport,
        "freightfeed watching"
    );

    let mut stream = config.stream.clone();
    stream.hooks = Hooks::new()
        .on_connect(|| info!("Feed connected"))
        .on_disconnect(|| info!("Feed disconnected"))
        .on_error(|err| error!(error = %err, "Feed error"));

    let mut updates = adapter.subscribe();
    let mut freshness = tokio::time::interval(FRESHNESS_CHECK_INTERVAL);
    freshness.tick().await;

    adapter.connect(stream);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let revision = *updates.borrow_and_update();
                info!(revision, summary = %summarize(&adapter.data()), "Update received");
            }
            _ = freshness.tick() => {
                if adapter.is_data_fresh(max_age) {
                    info!(age_secs = adapter.data_age().map(|a| a.num_seconds()), "Data is fresh");
                } else {
                    warn!(
                        max_age_minutes = max_age,
                        connected = adapter.is_connected(),
                        "Data is stale"
                    );
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    adapter.disconnect();
    info!("freightfeed stopped");
    Ok(())
}

/// One-line description of what the snapshot holds.
pub fn summarize(snapshot: &Snapshot) -> String {
    let mut parts = Vec::new();
    if let Some(freight) = &snapshot.freight {
        parts.push(format!(
            "forwarders={} routes={}",
            freight.forwarders.len(),
            freight.routes.len()
        ));
    }
    if let Some(cargo) = &snapshot.cargo {
        parts.push(format!("cargo={}", cargo.cargo_type));
    }
    if let Some(market) = &snapshot.market {
        parts.push(format!("fuel={}", market.fuel_costs));
    }
    if let Some(corridors) = &snapshot.corridors {
        parts.push(format!("corridors={}", corridors.len()));
    }
    if parts.is_empty() {
        "empty".to_string()
    } else {
        parts.join(" ")
    }
}
