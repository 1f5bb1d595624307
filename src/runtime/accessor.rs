//! Read-only views over the adapter's snapshot and connection state.
//!
//! Every accessor takes the shared read lock briefly and returns an owned
//! copy. None of them block on I/O or fail; a key that has not arrived yet
//! reads as empty.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tokio::sync::watch;

use crate::domain::{CargoProfile, CorridorStatus, MarketConditions, Snapshot};
use crate::error::StreamError;

use super::adapter::StreamAdapter;
use super::state::{ConnectionState, Phase};

/// Default freshness window.
pub const DEFAULT_MAX_AGE_MINUTES: u32 = 5;

impl StreamAdapter {
    /// The merged snapshot.
    pub fn data(&self) -> Snapshot {
        self.inner.shared.read().snapshot.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.shared.read().connection.is_connected
    }

    /// When the last payload was merged.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner.shared.read().connection.last_update
    }

    /// The most recent failure, cleared by the next successful merge.
    pub fn error(&self) -> Option<StreamError> {
        self.inner.shared.read().connection.last_error.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.shared.read().connection.phase
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.shared.read().connection.reconnect_attempts
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.shared.read().connection.clone()
    }

    pub fn forwarders(&self) -> Vec<Value> {
        let shared = self.inner.shared.read();
        shared
            .snapshot
            .freight
            .as_ref()
            .map(|f| f.forwarders.clone())
            .unwrap_or_default()
    }

    pub fn routes(&self) -> Vec<Value> {
        let shared = self.inner.shared.read();
        shared
            .snapshot
            .freight
            .as_ref()
            .map(|f| f.routes.clone())
            .unwrap_or_default()
    }

    pub fn market_data(&self) -> Option<MarketConditions> {
        self.inner.shared.read().snapshot.market.clone()
    }

    pub fn cargo_data(&self) -> Option<CargoProfile> {
        self.inner.shared.read().snapshot.cargo.clone()
    }

    pub fn corridor_status(&self) -> Vec<CorridorStatus> {
        self.inner
            .shared
            .read()
            .snapshot
            .corridors
            .clone()
            .unwrap_or_default()
    }

    /// Whether a payload was merged within the last `max_age_minutes`.
    ///
    /// `false` until the first update. Without a new update the answer can
    /// only go from fresh to stale.
    pub fn is_data_fresh(&self, max_age_minutes: u32) -> bool {
        self.is_fresh_within(Duration::minutes(i64::from(max_age_minutes)))
    }

    /// [`is_data_fresh`](Self::is_data_fresh) with an arbitrary window.
    pub fn is_fresh_within(&self, max_age: Duration) -> bool {
        let Some(last_update) = self.last_update() else {
            return false;
        };
        self.inner.clock.now() - last_update <= max_age
    }

    /// Age of the snapshot, if anything has arrived.
    pub fn data_age(&self) -> Option<Duration> {
        self.last_update()
            .map(|last_update| self.inner.clock.now() - last_update)
    }

    /// Revision counter bumped on every successful merge.
    ///
    /// Receivers see `changed()` fire once per batch of updates; read the
    /// accessors afterwards for the data.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision_tx.subscribe()
    }
}
