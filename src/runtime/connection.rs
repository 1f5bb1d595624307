//! Per-connection configuration and lifecycle hooks.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::StreamError;
use crate::port::TransportKind;

/// Default polling interval for generic feeds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Default timeout for one polling request.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

type Hook = Arc<dyn Fn() + Send + Sync>;
type ErrorHook = Arc<dyn Fn(&StreamError) + Send + Sync>;

/// Side-effecting callbacks fired on lifecycle transitions.
///
/// Hooks run on the adapter's event task. They may read the adapter and
/// may call `connect`/`disconnect` on it, but should return quickly.
#[derive(Clone, Default)]
pub struct Hooks {
    on_connect: Option<Hook>,
    on_disconnect: Option<Hook>,
    on_error: Option<ErrorHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Arc::new(hook));
        self
    }

    pub fn on_disconnect(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_disconnect = Some(Arc::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl Fn(&StreamError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub(crate) fn connected(&self) {
        if let Some(hook) = &self.on_connect {
            hook();
        }
    }

    pub(crate) fn disconnected(&self) {
        if let Some(hook) = &self.on_disconnect {
            hook();
        }
    }

    pub(crate) fn failed(&self, error: &StreamError) {
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Settings for one connection attempt.
///
/// Immutable once handed to `connect()`; reconnects reuse the same value.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    /// Address of the data source.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Wire mechanism.
    #[serde(default)]
    pub transport: TransportKind,
    /// Interval between polls. Only used by the polling transport.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Timeout for one polling request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Headers attached to polling requests.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(skip)]
    pub hooks: Hooks,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            transport: TransportKind::default(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            headers: BTreeMap::new(),
            hooks: Hooks::default(),
        }
    }
}

impl ConnectionConfig {
    /// Config for `endpoint` over the given transport, other fields default.
    pub fn new(endpoint: impl Into<String>, transport: TransportKind) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            transport,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The endpoint, if one is set and non-blank.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}
