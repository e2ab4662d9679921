//! The public session façade
//!
//! Owns the channel handle and session state, delegates discovery and
//! connection actions to the transport provider, and enforces the state
//! machine's legality rules. All mutating entry points and queries
//! serialize through one `tokio::sync::Mutex` per instance, so callbacks
//! arriving concurrently can never interleave partial state updates.

use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::config::{ConnectConfig, ConnectTarget, SessionConfig};
use super::registry::ListenerRegistry;
use super::router::EventRouter;
use crate::device::{DeviceDescriptor, DeviceStatus};
use crate::error::{SessionError, SessionResult};
use crate::events::{ListenerId, SessionListener};
use crate::state::SessionState;
use crate::transport::{ChannelHandle, HostContext, TransportEventHandler, TransportProvider};

/// Mutable session data guarded by the single critical section
#[derive(Debug, Default)]
pub(crate) struct SessionShared {
    pub(crate) state: SessionState,
    pub(crate) channel: Option<ChannelHandle>,
    pub(crate) enabled: bool,
    pub(crate) peers: Vec<DeviceDescriptor>,
    pub(crate) current_remote: Option<DeviceDescriptor>,
    pub(crate) local_device: Option<DeviceDescriptor>,
}

impl SessionShared {
    /// Drop the tracked remote device; the connection attempt or
    /// established connection it belonged to is gone
    pub(crate) fn reset_connection(&mut self) {
        self.current_remote = None;
    }
}

/// Point-in-time snapshot of session health
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub state: SessionState,
    pub enabled: bool,
    pub peer_count: usize,
    pub listener_count: usize,
}

/// Coordinates one peer-discovery-and-connection session against a
/// transport provider
///
/// Constructed through [`super::SessionManagerBuilder`]; independent
/// sessions can coexist against different transports or hosts.
pub struct SessionManager {
    transport: Arc<dyn TransportProvider>,
    config: SessionConfig,
    host: Weak<HostContext>,
    shared: Arc<Mutex<SessionShared>>,
    listeners: Arc<ListenerRegistry>,
    router: Arc<EventRouter>,
}

impl SessionManager {
    pub(crate) fn with_parts(
        transport: Arc<dyn TransportProvider>,
        config: SessionConfig,
        host: Weak<HostContext>,
    ) -> Arc<Self> {
        let shared = Arc::new(Mutex::new(SessionShared::default()));
        let listeners = Arc::new(ListenerRegistry::new());
        let router = Arc::new_cyclic(|self_ref| EventRouter {
            self_ref: self_ref.clone(),
            shared: shared.clone(),
            listeners: listeners.clone(),
            transport: transport.clone(),
            host: host.clone(),
            recovery: config.channel_recovery.clone(),
        });

        Arc::new(Self {
            transport,
            config,
            host,
            shared,
            listeners,
            router,
        })
    }

    /// Acquire a transport channel and subscribe to its event feed
    ///
    /// Replaces any prior registration, tearing the old channel down first.
    /// Silently no-ops when the host context has already been released.
    pub async fn register(&self) -> SessionResult<()> {
        let Some(host) = self.host.upgrade() else {
            debug!("host context released, ignoring register request");
            return Ok(());
        };

        let mut shared = self.shared.lock().await;
        if let Some(old) = shared.channel.take() {
            info!(channel = %old, "replacing existing registration");
            self.teardown_locked(&mut shared, &old).await;
        }

        let handler: Arc<dyn TransportEventHandler> = self.router.clone();
        let channel = self
            .transport
            .init_channel(&host, handler)
            .await
            .map_err(|e| SessionError::action_failed("register", e))?;

        info!(channel = %channel, host = host.name(), "registered with transport");
        shared.channel = Some(channel);
        shared.enabled = false;
        shared.state = SessionState::Disabled;
        Ok(())
    }

    /// Force disconnection of any active or pending connection, then
    /// release the subscription and channel
    ///
    /// The teardown is silent: listeners are not notified on this path.
    /// Safe to call repeatedly; further calls are no-ops.
    pub async fn unregister(&self) {
        let mut shared = self.shared.lock().await;
        let Some(channel) = shared.channel.take() else {
            debug!("unregister called without an active registration");
            return;
        };
        info!(channel = %channel, "unregistering from transport");
        self.teardown_locked(&mut shared, &channel).await;
    }

    /// Insert a listener; safe concurrently with an ongoing dispatch
    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Remove a listener; safe concurrently with an ongoing dispatch
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Ask the transport to start discovering peers
    ///
    /// Completion is observed only through peer-list-changed events. A
    /// transport-reported failure is delivered to listeners as `on_error`
    /// rather than returned; the session state is left untouched.
    pub async fn start_discovery(&self) -> SessionResult<()> {
        let channel = {
            let shared = self.shared.lock().await;
            shared.channel.clone().ok_or(SessionError::NotRegistered)?
        };

        debug!(channel = %channel, "starting peer discovery");
        if let Err(e) = self.transport.discover_peers(&channel).await {
            let error = SessionError::action_failed("start discovery", e);
            warn!(error = %error, "discovery request rejected");
            self.listeners.notify_error(error).await;
        }
        Ok(())
    }

    /// Request a connection to `target`: an address, a device descriptor,
    /// or a full connect configuration
    ///
    /// Tracks the target as the current remote device and enters
    /// `Connecting`. The request's own failure comes back through
    /// `on_error`; establishment is observed via connection-state-changed
    /// events.
    pub async fn connect(&self, target: impl Into<ConnectTarget>) -> SessionResult<()> {
        let (config, device) = self.canonicalize(target.into());
        if config.address.is_empty() {
            return Err(SessionError::InvalidConfiguration {
                field: "address".to_string(),
                reason: "connect target has an empty device address".to_string(),
            });
        }

        let (channel, previous) = {
            let mut shared = self.shared.lock().await;
            let channel = shared.channel.clone().ok_or(SessionError::NotRegistered)?;
            let previous = shared.state;
            let resolved = device
                .or_else(|| {
                    shared
                        .peers
                        .iter()
                        .find(|d| d.address == config.address)
                        .cloned()
                })
                .unwrap_or_else(|| DeviceDescriptor::unknown(config.address.clone()));
            info!(address = %config.address, "connecting to peer");
            shared.current_remote = Some(resolved);
            shared.state = SessionState::Connecting;
            (channel, previous)
        };

        if let Err(e) = self.transport.connect(&channel, &config).await {
            {
                let mut shared = self.shared.lock().await;
                shared.reset_connection();
                shared.state = previous;
            }
            let error = SessionError::action_failed("connect", e);
            warn!(error = %error, address = %config.address, "connect request rejected");
            self.listeners.notify_error(error).await;
        }
        Ok(())
    }

    /// Tear down the active connection or cancel a pending one
    ///
    /// An unformed (available/invited) invite gets a cancel request; an
    /// established group, or an untracked remote, gets a remove-group
    /// request. Action failures are delivered through `on_error`.
    pub async fn disconnect(&self) -> SessionResult<()> {
        let failure = {
            let mut shared = self.shared.lock().await;
            let channel = shared.channel.clone().ok_or(SessionError::NotRegistered)?;
            match self.issue_teardown(&shared, &channel).await {
                Ok(true) => {
                    if shared.state.is_engaged() {
                        shared.state = SessionState::Disconnecting;
                    }
                    None
                }
                Ok(false) => {
                    debug!("no active or pending connection to tear down");
                    None
                }
                Err(e) => Some(e),
            }
        };

        if let Some(error) = failure {
            warn!(error = %error, "disconnect request rejected");
            self.listeners.notify_error(error).await;
        }
        Ok(())
    }

    /// Whether the transport is enabled; false whenever unregistered,
    /// regardless of the last reported flag
    pub async fn is_enabled(&self) -> bool {
        let shared = self.shared.lock().await;
        shared.channel.is_some() && shared.enabled
    }

    /// Whether a connection is established
    pub async fn is_connected(&self) -> bool {
        self.shared.lock().await.state == SessionState::Connected
    }

    /// Whether a connection is established or an attempt is in flight
    pub async fn is_connected_or_connecting(&self) -> bool {
        self.shared.lock().await.state.is_connected_or_connecting()
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        self.shared.lock().await.state
    }

    /// The most recently reported peer set
    pub async fn peers(&self) -> Vec<DeviceDescriptor> {
        self.shared.lock().await.peers.clone()
    }

    /// The local node's own descriptor, once the transport has reported one
    pub async fn local_device(&self) -> Option<DeviceDescriptor> {
        self.shared.lock().await.local_device.clone()
    }

    /// Point-in-time snapshot of session health
    pub async fn stats(&self) -> SessionStats {
        let shared = self.shared.lock().await;
        SessionStats {
            state: shared.state,
            enabled: shared.enabled,
            peer_count: shared.peers.len(),
            listener_count: self.listeners.len(),
        }
    }

    /// Build the canonical connect configuration for a target, applying
    /// session defaults where the target carries none
    fn canonicalize(&self, target: ConnectTarget) -> (ConnectConfig, Option<DeviceDescriptor>) {
        match target {
            ConnectTarget::Address(address) => (self.default_config(address), None),
            ConnectTarget::Device(device) => {
                let config = self.default_config(device.address.clone());
                (config, Some(device))
            }
            ConnectTarget::Config(config) => (config, None),
        }
    }

    fn default_config(&self, address: String) -> ConnectConfig {
        ConnectConfig {
            address,
            pairing: self.config.pairing,
            group_owner_intent: self.config.group_owner_intent,
        }
    }

    /// Issue the teardown request matching the current remote's status: an
    /// unformed invite is cancelled, an established group (or an untracked
    /// remote) is removed, and statuses with nothing to tear down issue no
    /// request. Returns whether a request was issued.
    async fn issue_teardown(
        &self,
        shared: &SessionShared,
        channel: &ChannelHandle,
    ) -> SessionResult<bool> {
        match shared.current_remote.as_ref().map(|d| d.status) {
            None | Some(DeviceStatus::Connected) => {
                debug!("tearing down group");
                self.transport
                    .remove_group(channel)
                    .await
                    .map_err(|e| SessionError::action_failed("remove group", e))?;
                Ok(true)
            }
            Some(DeviceStatus::Available | DeviceStatus::Invited) => {
                debug!("cancelling pending connect");
                self.transport
                    .cancel_connect(channel)
                    .await
                    .map_err(|e| SessionError::action_failed("cancel connect", e))?;
                Ok(true)
            }
            Some(DeviceStatus::Failed | DeviceStatus::Unavailable) => Ok(false),
        }
    }

    /// Force disconnection, release the channel subscription, and reset
    /// all session data; runs on every channel-release path
    async fn teardown_locked(&self, shared: &mut SessionShared, channel: &ChannelHandle) {
        if let Err(e) = self.issue_teardown(shared, channel).await {
            warn!(error = %e, "teardown request failed during channel release");
        }
        self.transport.release_channel(channel).await;
        shared.enabled = false;
        shared.state = SessionState::Unregistered;
        shared.peers.clear();
        shared.current_remote = None;
        shared.local_device = None;
    }
}
