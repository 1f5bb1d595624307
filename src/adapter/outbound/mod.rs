//! Outbound adapters (driven side): the network transports.

pub mod factory;
pub mod polling;
pub mod sse;
pub mod websocket;

pub use factory::{build, default_factory, validate_endpoint};
pub use polling::PollingTransport;
pub use sse::SseTransport;
pub use websocket::WebSocketTransport;
