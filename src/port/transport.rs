//! Transport port.
//!
//! A transport owns one live channel to the data source and reports what
//! happens on it as [`TransportEvent`]s. Events travel through an
//! [`EventSink`] into the adapter's single bounded channel, stamped with the
//! epoch of the connection attempt that produced them so the adapter can
//! discard anything a superseded transport delivers late.

use serde::Deserialize;
use tokio::sync::mpsc;

use crate::domain::Payload;
use crate::error::StreamError;

/// Wire mechanism used to receive updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Server-Sent Events.
    #[default]
    Sse,
    /// WebSocket, receive-only.
    #[serde(alias = "ws")]
    WebSocket,
    /// Fixed-interval HTTP polling.
    Polling,
}

impl TransportKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Sse => "sse",
            TransportKind::WebSocket => "websocket",
            TransportKind::Polling => "polling",
        }
    }

    /// Push transports need an explicit reconnect after they drop; polling
    /// keeps its own schedule.
    pub const fn is_push(&self) -> bool {
        matches!(self, TransportKind::Sse | TransportKind::WebSocket)
    }
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sse" => Ok(TransportKind::Sse),
            "websocket" | "ws" => Ok(TransportKind::WebSocket),
            "polling" => Ok(TransportKind::Polling),
            other => Err(format!("unsupported transport '{other}'")),
        }
    }
}

/// Something that happened on a transport's channel.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The channel is open.
    Opened,
    /// A payload arrived.
    Message(Payload),
    /// The channel reported a failure.
    Error(StreamError),
    /// The channel closed.
    Closed,
}

/// A transport event stamped with the epoch that produced it.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub epoch: u64,
    pub event: TransportEvent,
}

/// Sending half handed to a transport when it starts.
#[derive(Debug, Clone)]
pub struct EventSink {
    epoch: u64,
    tx: mpsc::Sender<Envelope>,
}

impl EventSink {
    pub fn new(epoch: u64, tx: mpsc::Sender<Envelope>) -> Self {
        Self { epoch, tx }
    }

    /// Epoch this sink stamps on its events.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Deliver an event, waiting for channel capacity.
    ///
    /// Returns `false` once the adapter side is gone.
    pub async fn emit(&self, event: TransportEvent) -> bool {
        self.tx
            .send(Envelope {
                epoch: self.epoch,
                event,
            })
            .await
            .is_ok()
    }

    /// Deliver an event without waiting. Returns `false` if the channel is
    /// full or closed.
    pub fn try_emit(&self, event: TransportEvent) -> bool {
        self.tx
            .try_send(Envelope {
                epoch: self.epoch,
                event,
            })
            .is_ok()
    }
}

/// One live channel to the data source.
///
/// `start` must return immediately and deliver results asynchronously
/// through the sink. `stop` releases the underlying socket, stream or timer
/// synchronously and is idempotent: stopping twice, or stopping a transport
/// that never started, does nothing.
pub trait Transport: Send {
    /// Which wire mechanism this is.
    fn kind(&self) -> TransportKind;

    /// Begin delivering events into `sink`.
    fn start(&mut self, sink: EventSink);

    /// Release the channel.
    fn stop(&mut self);

    /// Whether the channel task is still alive.
    fn is_running(&self) -> bool;
}
