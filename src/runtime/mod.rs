//! Connection lifecycle, reconnection and the read-only accessor facade.

mod accessor;
mod adapter;
mod connection;
mod presets;
mod reconnect;
mod state;

pub use accessor::DEFAULT_MAX_AGE_MINUTES;
pub use adapter::{StreamAdapter, StreamAdapterBuilder, TransportFactory, DEFAULT_CHANNEL_CAPACITY};
pub use connection::{ConnectionConfig, Hooks, DEFAULT_POLL_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_MS};
pub use presets::MARKET_POLL_INTERVAL_MS;
pub use reconnect::{ReconnectPolicy, Retry};
pub use state::{ConnectionState, Phase};
