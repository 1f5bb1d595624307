//! Transport construction from a [`ConnectionConfig`].

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use super::polling::PollingTransport;
use super::sse::SseTransport;
use super::websocket::WebSocketTransport;
use crate::error::{ConfigError, Result};
use crate::port::{Transport, TransportKind};
use crate::runtime::{ConnectionConfig, TransportFactory};

/// Timeout for establishing the TCP/TLS connection of HTTP transports.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Factory producing network transports.
pub fn default_factory() -> TransportFactory {
    Arc::new(|config: &ConnectionConfig| build(config))
}

/// Build the transport named by `config.transport`.
///
/// # Errors
///
/// Returns a configuration error if the endpoint is missing, is not a URL,
/// has a scheme the transport cannot use, or if polling settings are
/// invalid.
pub fn build(config: &ConnectionConfig) -> Result<Box<dyn Transport>> {
    let endpoint = config
        .endpoint()
        .ok_or(ConfigError::MissingField { field: "endpoint" })?;
    let url = validate_endpoint(endpoint, config.transport)?;

    let transport: Box<dyn Transport> = match config.transport {
        TransportKind::Sse => {
            let client = reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()?;
            Box::new(SseTransport::new(url, client))
        }
        TransportKind::WebSocket => Box::new(WebSocketTransport::new(url)),
        TransportKind::Polling => {
            if config.poll_interval_ms == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "poll_interval_ms",
                    reason: "must be greater than 0".into(),
                }
                .into());
            }
            let client = reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(config.request_timeout())
                .build()?;
            Box::new(PollingTransport::new(
                url,
                client,
                config.poll_interval(),
                header_map(config)?,
            ))
        }
    };
    Ok(transport)
}

/// Parse `endpoint` and check its scheme suits `kind`.
///
/// # Errors
///
/// Returns [`Error::Url`](crate::error::Error::Url) if the endpoint does not
/// parse, or a configuration error if the scheme does not match.
pub fn validate_endpoint(endpoint: &str, kind: TransportKind) -> Result<Url> {
    let url = Url::parse(endpoint)?;
    let allowed: &[&str] = match kind {
        TransportKind::WebSocket => &["ws", "wss"],
        TransportKind::Sse | TransportKind::Polling => &["http", "https"],
    };
    if !allowed.contains(&url.scheme()) {
        return Err(ConfigError::InvalidValue {
            field: "endpoint",
            reason: format!(
                "scheme '{}' is not usable with {kind}; expected {}",
                url.scheme(),
                allowed.join(" or ")
            ),
        }
        .into());
    }
    Ok(url)
}

fn header_map(config: &ConnectionConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(config.headers.len());
    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidValue {
            field: "headers",
            reason: format!("invalid header name '{name}': {e}"),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidValue {
            field: "headers",
            reason: format!("invalid value for header '{name}': {e}"),
        })?;
        headers.insert(name, value);
    }
    Ok(headers)
}
