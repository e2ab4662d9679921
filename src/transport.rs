//! Transport provider contract
//!
//! The seam between the session core and the platform's wireless-direct
//! API. Actions complete asynchronously; the provider pushes its event feed
//! into the handler registered at channel initialization, from whatever
//! task or thread the platform uses.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::device::{ConnectionInfo, DeviceDescriptor};
use crate::session::ConnectConfig;

/// Opaque token for a live registration with the transport provider
///
/// Exists only between `register()` and `unregister()`; every discovery and
/// connection action requires one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelHandle(Uuid);

impl ChannelHandle {
    /// Mint a fresh handle; called by transport providers on channel init
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChannelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to the host execution context a transport channel is bound to
///
/// The session manager keeps only a `Weak` reference to it: once the host
/// drops its `Arc`, `register()` becomes a silent no-op instead of
/// dereferencing a dead handle.
#[derive(Debug)]
pub struct HostContext {
    name: String,
}

impl HostContext {
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self { name: name.into() })
    }

    /// Identifier of the host environment, handed to the transport during
    /// channel initialization
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Failure codes reported by transport action completions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureReason {
    /// Internal transport error
    Internal,
    /// The platform does not support wireless-direct operation
    Unsupported,
    /// The transport is busy servicing another request
    Busy,
    /// No pending service requests exist for the operation
    NoServiceRequests,
}

impl FailureReason {
    /// Decode a provider failure code
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => FailureReason::Unsupported,
            2 => FailureReason::Busy,
            3 => FailureReason::NoServiceRequests,
            _ => FailureReason::Internal,
        }
    }

    /// The provider's numeric code for this failure
    pub fn code(&self) -> u32 {
        match self {
            FailureReason::Internal => 0,
            FailureReason::Unsupported => 1,
            FailureReason::Busy => 2,
            FailureReason::NoServiceRequests => 3,
        }
    }
}

/// Errors reported by the transport provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// An async action completed with a provider failure code
    #[error("transport rejected the request: {reason:?} (code {})", .reason.code())]
    ActionFailed { reason: FailureReason },

    /// The channel used for the request is no longer valid
    #[error("transport channel is closed")]
    ChannelClosed,
}

impl TransportError {
    /// Build an action failure from a raw provider code
    pub fn failure(code: u32) -> Self {
        TransportError::ActionFailed {
            reason: FailureReason::from_code(code),
        }
    }

    /// Check whether retrying the action later could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TransportError::ActionFailed {
                reason: FailureReason::Busy
            }
        )
    }
}

/// Event feed entries pushed by the transport provider
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The wireless-direct radio was enabled or disabled
    EnabledChanged { enabled: bool },
    /// The set of discoverable peers changed; the current list must be
    /// fetched with `request_peers`
    PeersChanged,
    /// The connection state of the wireless-direct network changed
    ConnectionChanged { network_active: bool },
    /// The local node's own device descriptor changed
    LocalDeviceChanged { device: DeviceDescriptor },
    /// The channel backing this session was torn down by the platform
    ChannelLost,
}

/// Consumer of the transport event feed
///
/// Installed at channel initialization; the provider may invoke it from
/// any task or thread.
#[async_trait]
pub trait TransportEventHandler: Send + Sync {
    async fn on_transport_event(&self, event: TransportEvent);
}

/// The platform's wireless-direct API surface consumed by the session core
///
/// Every action is asynchronous. A returned `Ok` means the provider
/// accepted the request, not that the requested effect (a formed group, a
/// finished discovery) has materialized; effects arrive through the event
/// feed.
#[async_trait]
pub trait TransportProvider: Send + Sync {
    /// Acquire a channel bound to the host context and install the event
    /// feed consumer
    async fn init_channel(
        &self,
        host: &HostContext,
        events: Arc<dyn TransportEventHandler>,
    ) -> Result<ChannelHandle, TransportError>;

    /// Release a channel and its event subscription
    async fn release_channel(&self, channel: &ChannelHandle);

    /// Start discovering peers
    async fn discover_peers(&self, channel: &ChannelHandle) -> Result<(), TransportError>;

    /// Request a connection to the device described by `config`
    async fn connect(
        &self,
        channel: &ChannelHandle,
        config: &ConnectConfig,
    ) -> Result<(), TransportError>;

    /// Tear down the current group
    async fn remove_group(&self, channel: &ChannelHandle) -> Result<(), TransportError>;

    /// Cancel a connection attempt that has not formed a group yet
    async fn cancel_connect(&self, channel: &ChannelHandle) -> Result<(), TransportError>;

    /// Fetch the current peer list
    async fn request_peers(
        &self,
        channel: &ChannelHandle,
    ) -> Result<Vec<DeviceDescriptor>, TransportError>;

    /// Fetch endpoint and group-role information for the active connection
    async fn request_connection_info(
        &self,
        channel: &ChannelHandle,
    ) -> Result<ConnectionInfo, TransportError>;
}
