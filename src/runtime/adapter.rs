//! Connection lifecycle controller.
//!
//! [`StreamAdapter`] selects a transport from the [`ConnectionConfig`],
//! starts it, and applies what it reports to the shared snapshot and
//! connection state.
//!
//! # Architecture
//!
//! Every transport publishes into one bounded `mpsc` channel per adapter.
//! A single event task drains that channel and is the only writer of the
//! snapshot. Each connection attempt gets a new epoch; events carry the epoch
//! of the transport that produced them and anything stamped with an older
//! epoch is dropped, so a transport that has been stopped can never touch
//! state again.
//!
//! Two locks are involved:
//! - `control` (re-entrant) serializes lifecycle changes: epoch, active
//!   transport, pending reconnect timer. Hooks run while it is held, which is
//!   what makes `disconnect()` a hard barrier against late callbacks.
//! - `shared` (read/write) holds the snapshot and connection state. Readers
//!   only ever take this one, and it is never held across I/O or hooks.

use std::cell::RefCell;
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, RwLock};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::adapter::outbound::factory;
use crate::domain::{normalize, SnapshotUpdate};
use crate::error::{Result, StreamError};
use crate::infrastructure::config::reconnection::ReconnectionConfig;
use crate::port::{Clock, Envelope, EventSink, SystemClock, Transport, TransportEvent, TransportKind};

use super::connection::{ConnectionConfig, Hooks};
use super::reconnect::ReconnectPolicy;
use super::state::{Phase, SharedState};

/// Builds the transport named by a connection config.
pub type TransportFactory =
    Arc<dyn Fn(&ConnectionConfig) -> Result<Box<dyn Transport>> + Send + Sync>;

/// Capacity of the per-adapter event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Real-time data adapter.
///
/// Cheap to clone; clones share one connection and one snapshot. Independent
/// instances share nothing, including reconnect counters.
///
/// `connect`, `disconnect` and reconnects spawn tasks, so they must be called
/// from within a Tokio runtime.
#[derive(Clone)]
pub struct StreamAdapter {
    pub(super) inner: Arc<Inner>,
}

pub(super) struct Inner {
    pub(super) id: Uuid,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) shared: RwLock<SharedState>,
    pub(super) revision_tx: watch::Sender<u64>,
    control: ReentrantMutex<RefCell<Control>>,
    policy: ReconnectPolicy,
    factory: TransportFactory,
    channel_capacity: usize,
}

#[derive(Default)]
struct Control {
    epoch: u64,
    config: Option<ConnectionConfig>,
    transport: Option<Box<dyn Transport>>,
    reconnect_timer: Option<JoinHandle<()>>,
    driver: Option<JoinHandle<()>>,
    event_tx: Option<mpsc::Sender<Envelope>>,
}

/// Hook invocations decided while state was locked, run afterwards.
enum Effect {
    Connected,
    Disconnected,
    Failed(StreamError),
}

/// A transport event after payload decoding.
enum Incoming {
    Opened,
    Update(std::result::Result<SnapshotUpdate, StreamError>),
    Failed(StreamError),
    Closed,
}

impl From<TransportEvent> for Incoming {
    fn from(event: TransportEvent) -> Self {
        match event {
            TransportEvent::Opened => Incoming::Opened,
            TransportEvent::Message(payload) => Incoming::Update(normalize(&payload)),
            TransportEvent::Error(err) => Incoming::Failed(err),
            TransportEvent::Closed => Incoming::Closed,
        }
    }
}

/// Builder for [`StreamAdapter`].
pub struct StreamAdapterBuilder {
    reconnection: ReconnectionConfig,
    clock: Arc<dyn Clock>,
    factory: TransportFactory,
    channel_capacity: usize,
}

impl Default for StreamAdapterBuilder {
    fn default() -> Self {
        Self {
            reconnection: ReconnectionConfig::default(),
            clock: Arc::new(SystemClock),
            factory: factory::default_factory(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl StreamAdapterBuilder {
    #[must_use]
    pub fn reconnection(mut self, config: ReconnectionConfig) -> Self {
        self.reconnection = config;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace how transports are built (tests inject in-process transports).
    #[must_use]
    pub fn transport_factory(mut self, factory: TransportFactory) -> Self {
        self.factory = factory;
        self
    }

    #[must_use]
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> StreamAdapter {
        let (revision_tx, _) = watch::channel(0);
        StreamAdapter {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                clock: self.clock,
                shared: RwLock::new(SharedState::default()),
                revision_tx,
                control: ReentrantMutex::new(RefCell::new(Control::default())),
                policy: ReconnectPolicy::new(&self.reconnection),
                factory: self.factory,
                channel_capacity: self.channel_capacity,
            }),
        }
    }
}

impl Default for StreamAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAdapter {
    /// Adapter with default backoff, the system clock and network transports.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> StreamAdapterBuilder {
        StreamAdapterBuilder::default()
    }

    /// Identifier used on this adapter's log lines.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Epoch of the current connection attempt.
    pub fn epoch(&self) -> u64 {
        self.inner.control.lock().borrow().epoch
    }

    /// Transport of the active connection, if any.
    pub fn transport_kind(&self) -> Option<TransportKind> {
        let guard = self.inner.control.lock();
        let ctl = guard.borrow();
        ctl.transport.as_ref().map(|t| t.kind())
    }

    /// Start (or restart) streaming with `config`.
    ///
    /// Any previous transport is stopped first and the reconnect budget is
    /// reset. Never blocks and never fails: connection problems surface
    /// through the error state and the `on_error` hook.
    pub fn connect(&self, config: ConnectionConfig) {
        let inner = &self.inner;
        let guard = inner.control.lock();
        let (effects, hooks) = {
            let mut ctl = guard.borrow_mut();
            inner.teardown(&mut ctl);
            {
                let mut shared = inner.shared.write();
                let connection = &mut shared.connection;
                connection.is_connected = false;
                connection.last_error = None;
                connection.reconnect_attempts = 0;
                connection.phase = Phase::Idle;
            }

            let hooks = config.hooks.clone();
            let has_endpoint = config.endpoint().is_some();
            ctl.config = Some(config);
            if !has_endpoint {
                warn!(adapter = %inner.id, "No endpoint provided for real-time connection");
                return;
            }
            (inner.start_transport(&mut ctl), hooks)
        };
        Inner::dispatch(&hooks, effects);
        drop(guard);
    }

    /// Stop streaming.
    ///
    /// Safe from any state. Stops the transport, cancels a pending
    /// reconnect and fires `on_disconnect`. Once this returns, nothing from
    /// the stopped transport reaches the snapshot or the hooks.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        let guard = inner.control.lock();
        let hooks = {
            let mut ctl = guard.borrow_mut();
            inner.teardown(&mut ctl);
            let mut shared = inner.shared.write();
            let connection = &mut shared.connection;
            connection.is_connected = false;
            connection.reconnect_attempts = 0;
            connection.phase = Phase::Stopped;
            info!(adapter = %inner.id, epoch = ctl.epoch, "Real-time connection stopped");
            ctl.config.as_ref().map(|c| c.hooks.clone())
        };
        if let Some(hooks) = hooks {
            hooks.disconnected();
        }
        drop(guard);
    }
}

impl Inner {
    /// Retire the current epoch: stop the transport and any pending timer.
    fn teardown(&self, ctl: &mut Control) {
        ctl.epoch += 1;
        if let Some(mut transport) = ctl.transport.take() {
            debug!(adapter = %self.id, transport = %transport.kind(), "Stopping transport");
            transport.stop();
        }
        if let Some(timer) = ctl.reconnect_timer.take() {
            timer.abort();
        }
    }

    /// Build and start the configured transport under the current epoch.
    fn start_transport(self: &Arc<Self>, ctl: &mut Control) -> Vec<Effect> {
        let Some(config) = ctl.config.clone() else {
            return Vec::new();
        };
        let tx = self.ensure_driver(ctl);

        match (self.factory)(&config) {
            Ok(mut transport) => {
                info!(
                    adapter = %self.id,
                    epoch = ctl.epoch,
                    transport = %config.transport,
                    endpoint = config.endpoint().unwrap_or_default(),
                    "Connecting to real-time feed"
                );
                transport.start(EventSink::new(ctl.epoch, tx));
                ctl.transport = Some(transport);
                self.shared.write().connection.phase = Phase::Connecting;
                Vec::new()
            }
            Err(err) => {
                let err = StreamError::TransportConnect {
                    transport: config.transport.as_str(),
                    reason: err.to_string(),
                };
                self.on_failure(ctl, config.transport, err)
            }
        }
    }

    /// Sender into the event channel, spawning the event task on first use.
    fn ensure_driver(self: &Arc<Self>, ctl: &mut Control) -> mpsc::Sender<Envelope> {
        if let Some(tx) = &ctl.event_tx {
            if !tx.is_closed() {
                return tx.clone();
            }
        }
        let (tx, rx) = mpsc::channel(self.channel_capacity);
        ctl.driver = Some(tokio::spawn(drive(Arc::downgrade(self), rx)));
        ctl.event_tx = Some(tx.clone());
        tx
    }

    /// Apply one transport event if it belongs to the current epoch.
    fn handle(self: &Arc<Self>, envelope: Envelope) {
        let incoming = Incoming::from(envelope.event);

        let guard = self.control.lock();
        let (effects, hooks) = {
            let mut ctl = guard.borrow_mut();
            if envelope.epoch != ctl.epoch {
                trace!(
                    adapter = %self.id,
                    epoch = envelope.epoch,
                    current = ctl.epoch,
                    "Discarding event from superseded transport"
                );
                return;
            }
            let Some(config) = ctl.config.as_ref() else {
                return;
            };
            let kind = config.transport;
            let hooks = config.hooks.clone();

            let effects = match incoming {
                Incoming::Opened => self.on_opened(kind),
                Incoming::Update(Ok(update)) => self.on_update(update),
                Incoming::Update(Err(err)) => self.on_rejected(err),
                Incoming::Failed(err) => self.on_failure(&mut ctl, kind, err),
                Incoming::Closed => self.on_closed(&mut ctl, kind),
            };
            (effects, hooks)
        };
        Self::dispatch(&hooks, effects);
        drop(guard);
    }

    fn on_opened(&self, kind: TransportKind) -> Vec<Effect> {
        info!(adapter = %self.id, transport = %kind, "Real-time connection established");
        let mut shared = self.shared.write();
        shared.connection.last_error = None;
        Self::mark_connected(&mut shared).into_iter().collect()
    }

    fn on_update(&self, update: SnapshotUpdate) -> Vec<Effect> {
        if update.is_heartbeat() {
            trace!(adapter = %self.id, "Heartbeat received");
        }
        for skipped in &update.skipped {
            warn!(adapter = %self.id, key = skipped.key, reason = %skipped.reason, "Skipping unreadable key");
        }
        let now = self.clock.now();
        let mut shared = self.shared.write();
        shared.snapshot.merge(update);

        let connection = &mut shared.connection;
        connection.last_update = Some(match connection.last_update {
            Some(previous) if previous > now => previous,
            _ => now,
        });
        connection.last_error = None;
        connection.reconnect_attempts = 0;
        shared.revision += 1;

        let present = shared.snapshot.present_keys();
        debug!(
            adapter = %self.id,
            freight = present.freight,
            cargo = present.cargo,
            market = present.market,
            corridors = present.corridors,
            revision = shared.revision,
            "Real-time data updated"
        );

        let effect = Self::mark_connected(&mut shared);
        let revision = shared.revision;
        drop(shared);
        self.revision_tx.send_replace(revision);
        effect.into_iter().collect()
    }

    fn on_rejected(&self, err: StreamError) -> Vec<Effect> {
        warn!(adapter = %self.id, error = %err, "Dropping real-time payload");
        self.shared.write().connection.last_error = Some(err.clone());
        vec![Effect::Failed(err)]
    }

    fn on_failure(self: &Arc<Self>, ctl: &mut Control, kind: TransportKind, err: StreamError) -> Vec<Effect> {
        error!(adapter = %self.id, transport = %kind, error = %err, "Real-time transport error");
        let mut shared = self.shared.write();
        shared.connection.last_error = Some(err.clone());
        // A WebSocket error is followed by its own close event.
        if kind != TransportKind::WebSocket {
            shared.connection.is_connected = false;
            Self::mark_disconnected(&mut shared);
        }
        let mut effects = vec![Effect::Failed(err)];
        if kind.is_push() {
            effects.extend(self.schedule_reconnect(ctl, &mut shared));
        }
        effects
    }

    fn on_closed(self: &Arc<Self>, ctl: &mut Control, kind: TransportKind) -> Vec<Effect> {
        info!(adapter = %self.id, transport = %kind, "Real-time connection closed");
        let mut shared = self.shared.write();
        shared.connection.is_connected = false;
        Self::mark_disconnected(&mut shared);
        if kind.is_push() {
            // Already marked disconnected, so this never adds a second effect.
            self.schedule_reconnect(ctl, &mut shared);
        }
        vec![Effect::Disconnected]
    }

    fn mark_connected(shared: &mut SharedState) -> Option<Effect> {
        let connection = &mut shared.connection;
        connection.phase = Phase::Connected;
        if connection.is_connected {
            return None;
        }
        connection.is_connected = true;
        Some(Effect::Connected)
    }

    /// A pending reconnect keeps its phase until the timer fires.
    fn mark_disconnected(shared: &mut SharedState) {
        let phase = &mut shared.connection.phase;
        if !matches!(phase, Phase::Reconnecting { .. } | Phase::Exhausted) {
            *phase = Phase::Disconnected;
        }
    }

    /// Arm the reconnect timer unless one is already pending or the budget
    /// is spent.
    ///
    /// Giving up retires the current epoch; if the adapter still counted as
    /// connected, the returned effect reports the disconnect.
    fn schedule_reconnect(
        self: &Arc<Self>,
        ctl: &mut Control,
        shared: &mut SharedState,
    ) -> Option<Effect> {
        if ctl
            .reconnect_timer
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
        {
            debug!(adapter = %self.id, "Reconnect already scheduled");
            return None;
        }

        let attempts = shared.connection.reconnect_attempts;
        let Some(retry) = self.policy.next_retry(attempts) else {
            warn!(
                adapter = %self.id,
                attempts,
                "Reconnect attempts exhausted, staying disconnected"
            );
            // Anything the retired transport still has queued is discarded.
            self.teardown(ctl);
            let connection = &mut shared.connection;
            connection.phase = Phase::Exhausted;
            if std::mem::take(&mut connection.is_connected) {
                return Some(Effect::Disconnected);
            }
            return None;
        };

        shared.connection.reconnect_attempts = retry.attempt;
        shared.connection.phase = Phase::Reconnecting {
            attempt: retry.attempt,
            delay: retry.delay,
        };
        info!(
            adapter = %self.id,
            attempt = retry.attempt,
            delay_ms = retry.delay.as_millis() as u64,
            "Scheduling reconnect"
        );

        let weak = Arc::downgrade(self);
        let epoch = ctl.epoch;
        ctl.reconnect_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(retry.delay).await;
            if let Some(inner) = weak.upgrade() {
                inner.reconnect(epoch);
            }
        }));
        None
    }

    /// Timer callback: restart the transport if `epoch` is still current.
    fn reconnect(self: &Arc<Self>, epoch: u64) {
        let guard = self.control.lock();
        let (effects, hooks) = {
            let mut ctl = guard.borrow_mut();
            if ctl.epoch != epoch {
                debug!(adapter = %self.id, epoch, "Reconnect superseded");
                return;
            }
            // This task is the timer; detach rather than abort it.
            ctl.reconnect_timer = None;
            info!(
                adapter = %self.id,
                attempt = self.shared.read().connection.reconnect_attempts,
                "Reconnecting"
            );
            self.teardown(&mut ctl);
            let hooks = ctl
                .config
                .as_ref()
                .map(|c| c.hooks.clone())
                .unwrap_or_default();
            (self.start_transport(&mut ctl), hooks)
        };
        Self::dispatch(&hooks, effects);
        drop(guard);
    }

    fn dispatch(hooks: &Hooks, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Connected => hooks.connected(),
                Effect::Disconnected => hooks.disconnected(),
                Effect::Failed(err) => hooks.failed(&err),
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let ctl = self.control.get_mut().get_mut();
        if let Some(mut transport) = ctl.transport.take() {
            transport.stop();
        }
        if let Some(timer) = ctl.reconnect_timer.take() {
            timer.abort();
        }
        if let Some(driver) = ctl.driver.take() {
            driver.abort();
        }
    }
}

/// Event task: the single consumer of the adapter's channel.
async fn drive(inner: Weak<Inner>, mut rx: mpsc::Receiver<Envelope>) {
    while let Some(envelope) = rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.handle(envelope);
    }
}
