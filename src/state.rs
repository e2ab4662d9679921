//! Session lifecycle state
//!
//! The seven-value state machine driven by the event router and explicit
//! session manager actions. Callers observe the state; they never mutate it
//! directly.

use serde::{Deserialize, Serialize};

/// Current lifecycle state of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No transport channel exists (before `register` or after `unregister`)
    #[default]
    Unregistered,
    /// A channel exists but the transport reports the radio as disabled
    Disabled,
    /// The transport is enabled and the session is idle
    Enabled,
    /// Peer updates are flowing for an active discovery
    Discovering,
    /// A connection request has been issued and not yet resolved
    Connecting,
    /// A connection is established and connection info has been fetched
    Connected,
    /// A teardown request has been issued and not yet resolved
    Disconnecting,
}

impl SessionState {
    /// Check whether a transport channel exists in this state
    pub fn is_registered(&self) -> bool {
        !matches!(self, SessionState::Unregistered)
    }

    /// Check whether the session is engaged with a remote device (the
    /// states in which a current remote device may be tracked)
    pub fn is_engaged(&self) -> bool {
        matches!(
            self,
            SessionState::Connecting | SessionState::Connected | SessionState::Disconnecting
        )
    }

    /// Check whether the session is connected or has a connection attempt
    /// in flight
    pub fn is_connected_or_connecting(&self) -> bool {
        matches!(self, SessionState::Connecting | SessionState::Connected)
    }
}
