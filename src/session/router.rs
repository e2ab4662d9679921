//! Event router: the single consumer of the transport event feed
//!
//! Transport callbacks arrive on arbitrary tasks. Every state mutation runs
//! under the session lock; listener fan-out happens after the guard is
//! dropped so observers may re-enter session queries during a notification.

use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::manager::SessionShared;
use super::recovery::{retry_with_backoff, RetryConfig};
use super::registry::ListenerRegistry;
use crate::device::DeviceStatus;
use crate::error::{SessionError, SessionResult};
use crate::state::SessionState;
use crate::transport::{
    HostContext, TransportEvent, TransportEventHandler, TransportProvider,
};

pub(crate) struct EventRouter {
    pub(crate) self_ref: Weak<EventRouter>,
    pub(crate) shared: Arc<Mutex<SessionShared>>,
    pub(crate) listeners: Arc<ListenerRegistry>,
    pub(crate) transport: Arc<dyn TransportProvider>,
    pub(crate) host: Weak<HostContext>,
    pub(crate) recovery: Option<RetryConfig>,
}

#[async_trait]
impl TransportEventHandler for EventRouter {
    async fn on_transport_event(&self, event: TransportEvent) {
        debug!(?event, "transport event");
        if let Err(e) = self.route(event).await {
            warn!(error = %e, category = e.category(), "failed to process transport event");
            self.listeners.notify_error(e).await;
        }
    }
}

impl EventRouter {
    async fn route(&self, event: TransportEvent) -> SessionResult<()> {
        match event {
            TransportEvent::EnabledChanged { enabled } => self.on_enabled_changed(enabled).await,
            TransportEvent::PeersChanged => self.on_peers_changed().await,
            TransportEvent::ConnectionChanged { network_active } => {
                self.on_connection_changed(network_active).await
            }
            TransportEvent::LocalDeviceChanged { device } => {
                let mut shared = self.shared.lock().await;
                if shared.channel.is_some() {
                    debug!(address = %device.address, "local device updated");
                    shared.local_device = Some(device);
                }
                Ok(())
            }
            TransportEvent::ChannelLost => self.on_channel_lost().await,
        }
    }

    async fn on_enabled_changed(&self, enabled: bool) -> SessionResult<()> {
        let was_engaged = {
            let mut shared = self.shared.lock().await;
            if shared.channel.is_none() {
                return Ok(());
            }
            shared.enabled = enabled;
            if enabled {
                if shared.state == SessionState::Disabled {
                    shared.state = SessionState::Enabled;
                }
                false
            } else {
                let was_engaged = shared.state.is_engaged();
                shared.reset_connection();
                shared.state = SessionState::Disabled;
                was_engaged
            }
        };

        info!(enabled, "transport state changed");
        self.listeners.notify_state_changed(enabled).await;
        if was_engaged {
            self.listeners.notify_disconnect().await;
        }
        Ok(())
    }

    async fn on_peers_changed(&self) -> SessionResult<()> {
        let channel = {
            let shared = self.shared.lock().await;
            match shared.channel.clone() {
                Some(channel) => channel,
                None => return Ok(()),
            }
        };

        let peers = self
            .transport
            .request_peers(&channel)
            .await
            .map_err(|e| SessionError::event_processing(format!("peer list request failed: {e}")))?;

        let snapshot = {
            let mut shared = self.shared.lock().await;
            shared.peers = peers;
            if shared.state == SessionState::Enabled {
                shared.state = SessionState::Discovering;
            }
            if let Some(remote) = shared.current_remote.clone() {
                if let Some(update) = shared
                    .peers
                    .iter()
                    .find(|d| d.address == remote.address)
                    .cloned()
                {
                    shared.current_remote = Some(update);
                }
            }
            shared.peers.clone()
        };

        debug!(peer_count = snapshot.len(), "peer set replaced");
        self.listeners.notify_update_devices(&snapshot).await;
        Ok(())
    }

    async fn on_connection_changed(&self, network_active: bool) -> SessionResult<()> {
        if network_active {
            let channel = {
                let shared = self.shared.lock().await;
                match shared.channel.clone() {
                    Some(channel) => channel,
                    None => return Ok(()),
                }
            };

            let connection = self.transport.request_connection_info(&channel).await.map_err(|e| {
                SessionError::event_processing(format!("connection info request failed: {e}"))
            })?;

            {
                let mut shared = self.shared.lock().await;
                shared.state = SessionState::Connected;
                if let Some(remote) = shared.current_remote.as_mut() {
                    remote.status = DeviceStatus::Connected;
                }
            }

            info!(
                group_owner = connection.is_group_owner,
                "connection established"
            );
            self.listeners.notify_connect(&connection).await;
        } else {
            let was_engaged = {
                let mut shared = self.shared.lock().await;
                if shared.channel.is_none() {
                    return Ok(());
                }
                let was_engaged = shared.state.is_engaged();
                if was_engaged {
                    shared.reset_connection();
                    shared.state = if shared.enabled {
                        SessionState::Enabled
                    } else {
                        SessionState::Disabled
                    };
                }
                was_engaged
            };

            if was_engaged {
                info!("connection lost");
                self.listeners.notify_disconnect().await;
            }
        }
        Ok(())
    }

    async fn on_channel_lost(&self) -> SessionResult<()> {
        let was_engaged = {
            let mut shared = self.shared.lock().await;
            if shared.channel.is_none() {
                return Ok(());
            }
            let was_engaged = shared.state.is_engaged();
            shared.channel = None;
            shared.enabled = false;
            shared.reset_connection();
            shared.peers.clear();
            shared.state = SessionState::Unregistered;
            was_engaged
        };

        warn!("transport channel lost");
        self.listeners.notify_state_changed(false).await;
        if was_engaged {
            self.listeners.notify_disconnect().await;
        }

        if let Some(policy) = self.recovery.clone() {
            self.recover_channel(&policy).await;
        }
        Ok(())
    }

    /// Re-acquire the channel after the platform dropped it
    ///
    /// Only runs when a recovery policy is configured; without one, the
    /// session stays unregistered until the caller registers again.
    async fn recover_channel(&self, policy: &RetryConfig) {
        let Some(host) = self.host.upgrade() else {
            warn!("host context released, skipping channel recovery");
            return;
        };
        let Some(handler) = self.self_ref.upgrade() else {
            return;
        };

        info!("attempting channel recovery");
        let result = retry_with_backoff("channel recovery", policy, || {
            let transport = self.transport.clone();
            let host = host.clone();
            let handler: Arc<dyn TransportEventHandler> = handler.clone();
            async move { transport.init_channel(&host, handler).await }
        })
        .await;

        match result {
            Ok(channel) => {
                let mut shared = self.shared.lock().await;
                info!(channel = %channel, "channel recovered");
                shared.channel = Some(channel);
                shared.state = SessionState::Disabled;
            }
            Err(e) => {
                warn!(error = %e, "channel recovery failed");
                self.listeners
                    .notify_error(SessionError::action_failed("recover channel", e))
                    .await;
            }
        }
    }
}
