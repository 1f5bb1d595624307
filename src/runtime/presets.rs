//! Ready-made configurations for the three known feeds.
//!
//! Each preset picks the transport its source speaks and installs hooks that
//! log lifecycle events under a feed-specific target name.

use tracing::{error, info};

use super::connection::{ConnectionConfig, Hooks};
use crate::port::TransportKind;

/// Polling interval of the market-conditions feed.
pub const MARKET_POLL_INTERVAL_MS: u64 = 60_000;

impl ConnectionConfig {
    /// Freight forwarder/route stream over SSE.
    pub fn freight(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, TransportKind::Sse).with_hooks(logging_hooks(
            "freight",
            "Freight data stream connected",
        ))
    }

    /// Market conditions, polled once a minute.
    pub fn market(endpoint: impl Into<String>) -> Self {
        let mut config = Self::new(endpoint, TransportKind::Polling)
            .with_hooks(logging_hooks("market", "Market data polling started"));
        config.poll_interval_ms = MARKET_POLL_INTERVAL_MS;
        config
    }

    /// Corridor status over WebSocket.
    pub fn corridors(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, TransportKind::WebSocket).with_hooks(logging_hooks(
            "corridors",
            "Corridor status stream connected",
        ))
    }
}

fn logging_hooks(feed: &'static str, connected: &'static str) -> Hooks {
    Hooks::new()
        .on_connect(move || info!(feed, "{connected}"))
        .on_disconnect(move || info!(feed, "Feed disconnected"))
        .on_error(move |err| error!(feed, error = %err, "Feed error"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn presets_pick_their_transport() {
        let freight = ConnectionConfig::freight("https://freight.example/stream");
        assert_eq!(freight.transport, TransportKind::Sse);

        let market = ConnectionConfig::market("https://market.example/conditions");
        assert_eq!(market.transport, TransportKind::Polling);
        assert_eq!(market.poll_interval(), Duration::from_secs(60));

        let corridors = ConnectionConfig::corridors("wss://corridors.example/ws");
        assert_eq!(corridors.transport, TransportKind::WebSocket);
        assert_eq!(corridors.endpoint(), Some("wss://corridors.example/ws"));
    }

    #[test]
    fn preset_hooks_are_installed() {
        let config = ConnectionConfig::corridors("wss://corridors.example/ws");
        let debug = format!("{:?}", config.hooks);
        assert!(debug.contains("on_connect: true"));
        assert!(debug.contains("on_error: true"));
    }
}
