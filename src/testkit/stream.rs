//! In-process transports for testing the adapter without a network.
//!
//! - [`ChannelTransport`]: A [`Transport`] whose events are pushed by a
//!   [`ChannelTransportHandle`]. The handle keeps the sink it was started
//!   with even after `stop()`, so tests can simulate callbacks that arrive
//!   late from a transport the adapter already retired.
//!
//! - [`recording_factory`]: A [`TransportFactory`] that builds a
//!   `ChannelTransport` per connection attempt and records its handle.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::domain::Payload;
use crate::error::{ConfigError, Result, StreamError};
use crate::port::{EventSink, Transport, TransportEvent, TransportKind};
use crate::runtime::{ConnectionConfig, TransportFactory};

// ---------------------------------------------------------------------------
// ChannelTransport
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Shared {
    sink: Mutex<Option<EventSink>>,
    running: AtomicBool,
    start_count: AtomicU32,
    stop_count: AtomicU32,
}

/// A transport controlled externally via a [`ChannelTransportHandle`].
pub struct ChannelTransport {
    kind: TransportKind,
    shared: Arc<Shared>,
}

/// Control handle for a [`ChannelTransport`].
#[derive(Clone)]
pub struct ChannelTransportHandle {
    kind: TransportKind,
    shared: Arc<Shared>,
}

/// Create a [`ChannelTransport`] and its control handle.
pub fn channel_transport(kind: TransportKind) -> (ChannelTransport, ChannelTransportHandle) {
    let shared = Arc::new(Shared::default());
    (
        ChannelTransport {
            kind,
            shared: shared.clone(),
        },
        ChannelTransportHandle { kind, shared },
    )
}

impl Transport for ChannelTransport {
    fn kind(&self) -> TransportKind {
        self.kind
    }

    fn start(&mut self, sink: EventSink) {
        self.shared.start_count.fetch_add(1, Ordering::SeqCst);
        *self.shared.sink.lock() = Some(sink);
        self.shared.running.store(true, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        if self.shared.running.swap(false, Ordering::SeqCst) {
            self.shared.stop_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }
}

impl ChannelTransportHandle {
    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Push an event through the sink the transport was started with.
    ///
    /// Works after `stop()`; returns `false` only if the transport never
    /// started or the adapter's channel is full or gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        let sink = self.shared.sink.lock().clone();
        sink.is_some_and(|sink| sink.try_emit(event))
    }

    pub fn open(&self) -> bool {
        self.emit(TransportEvent::Opened)
    }

    /// Deliver `value` as a text frame.
    pub fn message(&self, value: &Value) -> bool {
        self.emit(TransportEvent::Message(Payload::Text(value.to_string())))
    }

    pub fn raw(&self, payload: Payload) -> bool {
        self.emit(TransportEvent::Message(payload))
    }

    pub fn error(&self, error: StreamError) -> bool {
        self.emit(TransportEvent::Error(error))
    }

    /// A runtime failure of this transport kind.
    pub fn fail(&self, reason: &str) -> bool {
        self.error(StreamError::TransportRuntime {
            transport: self.kind.as_str(),
            reason: reason.to_owned(),
        })
    }

    pub fn close(&self) -> bool {
        self.emit(TransportEvent::Closed)
    }

    /// Epoch of the sink the transport was last started with.
    pub fn epoch(&self) -> Option<u64> {
        self.shared.sink.lock().as_ref().map(EventSink::epoch)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> u32 {
        self.shared.start_count.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> u32 {
        self.shared.stop_count.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Recording factory
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorded {
    handles: Vec<ChannelTransportHandle>,
    configs: Vec<ConnectionConfig>,
    failures_left: u32,
}

/// Inspects what a [`recording_factory`] built.
#[derive(Clone, Default)]
pub struct FactoryHandle {
    recorded: Arc<Mutex<Recorded>>,
}

impl FactoryHandle {
    /// How many times the factory was invoked, failures included.
    pub fn builds(&self) -> usize {
        self.recorded.lock().configs.len()
    }

    /// Handle of the `index`-th transport built (0-based, failed builds
    /// not counted).
    pub fn transport(&self, index: usize) -> Option<ChannelTransportHandle> {
        self.recorded.lock().handles.get(index).cloned()
    }

    /// Handle of the most recent transport built.
    pub fn latest(&self) -> Option<ChannelTransportHandle> {
        self.recorded.lock().handles.last().cloned()
    }

    /// Transports currently running.
    pub fn running(&self) -> usize {
        self.recorded
            .lock()
            .handles
            .iter()
            .filter(|h| h.is_running())
            .count()
    }

    /// Config passed to the `index`-th build.
    pub fn config(&self, index: usize) -> Option<ConnectionConfig> {
        self.recorded.lock().configs.get(index).cloned()
    }

    /// Make the next `count` builds fail like an unreachable endpoint.
    pub fn fail_next(&self, count: u32) {
        self.recorded.lock().failures_left = count;
    }
}

/// A factory building [`ChannelTransport`]s of the configured kind.
pub fn recording_factory() -> (TransportFactory, FactoryHandle) {
    let handle = FactoryHandle::default();
    let recorded = handle.recorded.clone();
    let factory: TransportFactory = Arc::new(move |config: &ConnectionConfig| -> Result<Box<dyn Transport>> {
        let mut recorded = recorded.lock();
        recorded.configs.push(config.clone());
        if recorded.failures_left > 0 {
            recorded.failures_left -= 1;
            return Err(ConfigError::InvalidValue {
                field: "endpoint",
                reason: "refused by test factory".into(),
            }
            .into());
        }
        let (transport, transport_handle) = channel_transport(config.transport);
        recorded.handles.push(transport_handle);
        Ok(Box::new(transport))
    });
    (factory, handle)
}
