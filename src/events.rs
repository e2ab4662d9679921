//! Observer contract for session lifecycle notifications

use async_trait::async_trait;
use uuid::Uuid;

use crate::device::{ConnectionInfo, DeviceDescriptor};
use crate::error::SessionError;

/// Unique identifier for a registered listener
pub type ListenerId = Uuid;

/// Lifecycle notifications fanned out to every registered observer
///
/// All methods default to no-ops so observers implement only the subset
/// they care about. Any subset may be invoked zero or more times, in the
/// order events are processed. A listener that panics during delivery is
/// presumed broken and removed from the registry; the remaining listeners
/// still receive the notification.
#[async_trait]
pub trait SessionListener: Send + Sync {
    /// The transport was enabled or disabled
    async fn on_state_changed(&self, _enabled: bool) {}

    /// The peer set was replaced with a freshly reported list
    async fn on_update_devices(&self, _devices: Vec<DeviceDescriptor>) {}

    /// A connection was established and its info fetched
    async fn on_connect(&self, _info: ConnectionInfo) {}

    /// The active or pending connection went away
    async fn on_disconnect(&self) {}

    /// An asynchronous failure occurred (a rejected transport action or a
    /// failed event-processing step)
    async fn on_error(&self, _error: SessionError) {}
}
