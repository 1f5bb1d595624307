//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! # Available Ports
//!
//! - [`Transport`] - A live channel to the data source (SSE, WebSocket, polling)
//! - [`Clock`] - Wall-clock time, injectable for freshness tests

mod clock;
mod transport;

pub use clock::{Clock, SystemClock};
pub use transport::{Envelope, EventSink, Transport, TransportEvent, TransportKind};
