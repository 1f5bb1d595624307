//! Canonical test configurations.

use crate::infrastructure::config::reconnection::ReconnectionConfig;
use crate::port::TransportKind;
use crate::runtime::ConnectionConfig;

/// Short backoff for tests that run in real time: 10, 20, 40 ms.
pub fn fast_reconnection(max_attempts: u32) -> ReconnectionConfig {
    ReconnectionConfig {
        base_delay_ms: 10,
        max_attempts,
    }
}

/// Connection config pointing at a placeholder endpoint.
///
/// The endpoint only needs to be non-blank; test factories never dial it.
pub fn connection(kind: TransportKind) -> ConnectionConfig {
    let endpoint = match kind {
        TransportKind::WebSocket => "ws://feed.test/stream",
        TransportKind::Sse | TransportKind::Polling => "http://feed.test/stream",
    };
    ConnectionConfig::new(endpoint, kind)
}
