//! Connection state and lifecycle phases.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::Snapshot;
use crate::error::StreamError;

/// Where the adapter is in its connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Never connected.
    Idle,
    /// A transport was started and nothing has arrived yet.
    Connecting,
    /// The channel is open or has delivered data.
    Connected,
    /// The channel dropped; a reconnect is scheduled.
    Reconnecting { attempt: u32, delay: Duration },
    /// The channel dropped and no reconnect is pending.
    Disconnected,
    /// Reconnect attempts were exhausted. Only `connect()` resumes.
    Exhausted,
    /// `disconnect()` was called. Only `connect()` resumes.
    Stopped,
}

impl Phase {
    /// Whether the adapter will not reconnect on its own.
    pub fn is_final(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Exhausted | Phase::Stopped)
    }
}

/// Ephemeral state owned by the lifecycle controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionState {
    pub phase: Phase,
    pub is_connected: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<StreamError>,
    /// Reconnects tried since the last message got through.
    pub reconnect_attempts: u32,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            is_connected: false,
            last_update: None,
            last_error: None,
            reconnect_attempts: 0,
        }
    }
}

/// Everything consumers can read, guarded by one lock.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedState {
    pub(crate) snapshot: Snapshot,
    pub(crate) connection: ConnectionState,
    /// Bumped on every successful merge.
    pub(crate) revision: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_idle_and_disconnected() {
        let state = ConnectionState::default();
        assert_eq!(state.phase, Phase::Idle);
        assert!(!state.is_connected);
        assert!(state.last_update.is_none());
        assert_eq!(state.reconnect_attempts, 0);
    }

    #[test]
    fn final_phases() {
        assert!(Phase::Stopped.is_final());
        assert!(Phase::Exhausted.is_final());
        assert!(!Phase::Connected.is_final());
        assert!(!Phase::Reconnecting {
            attempt: 1,
            delay: Duration::from_secs(2)
        }
        .is_final());
    }
}
