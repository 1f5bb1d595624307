//! Freightfeed - real-time freight data adapter.
//!
//! Keeps a merged [`Snapshot`](domain::Snapshot) of freight, cargo, market
//! and corridor data current from a remote feed, over Server-Sent Events, a
//! WebSocket or fixed-interval HTTP polling.
//!
//! # Architecture
//!
//! - **`domain`** - Snapshot records and the merge rules for partial updates
//! - **`port`** - The `Transport` and `Clock` traits
//! - **`adapter::outbound`** - SSE, WebSocket and polling transports
//! - **`runtime`** - `StreamAdapter`: connection lifecycle, bounded
//!   exponential reconnection and read-only accessors
//! - **`infrastructure`** - TOML configuration and logging setup
//!
//! # Example
//!
//! ```no_run
//! use freightfeed::runtime::{ConnectionConfig, StreamAdapter};
//!
//! # async fn run() {
//! let adapter = StreamAdapter::new();
//! adapter.connect(ConnectionConfig::corridors("wss://corridors.example/ws"));
//!
//! let mut updates = adapter.subscribe();
//! while updates.changed().await.is_ok() {
//!     println!("{} corridors", adapter.corridor_status().len());
//! }
//! # }
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;
pub mod runtime;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
