//! Concurrent listener registry with fault-isolating fan-out

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::device::{ConnectionInfo, DeviceDescriptor};
use crate::error::SessionError;
use crate::events::{ListenerId, SessionListener};

/// Concurrency-safe set of session observers
///
/// Add and remove are safe while a dispatch iteration is in progress:
/// dispatch operates on a snapshot, and membership changes never block it.
pub struct ListenerRegistry {
    listeners: DashMap<ListenerId, Arc<dyn SessionListener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
        }
    }

    /// Insert a listener and return its registry id
    pub fn add(&self, listener: Arc<dyn SessionListener>) -> ListenerId {
        let id = Uuid::new_v4();
        self.listeners.insert(id, listener);
        debug!(listener = %id, total = self.listeners.len(), "listener added");
        id
    }

    /// Remove a listener; returns whether it was present
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            debug!(listener = %id, total = self.listeners.len(), "listener removed");
        }
        removed
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub async fn notify_state_changed(&self, enabled: bool) {
        self.dispatch("state_changed", move |l| async move {
            l.on_state_changed(enabled).await
        })
        .await;
    }

    pub async fn notify_update_devices(&self, devices: &[DeviceDescriptor]) {
        let devices = devices.to_vec();
        self.dispatch("update_devices", move |l| {
            let devices = devices.clone();
            async move { l.on_update_devices(devices).await }
        })
        .await;
    }

    pub async fn notify_connect(&self, info: &ConnectionInfo) {
        let info = info.clone();
        self.dispatch("connect", move |l| {
            let info = info.clone();
            async move { l.on_connect(info).await }
        })
        .await;
    }

    pub async fn notify_disconnect(&self) {
        self.dispatch("disconnect", |l| async move { l.on_disconnect().await })
            .await;
    }

    pub async fn notify_error(&self, error: SessionError) {
        self.dispatch("error", move |l| {
            let error = error.clone();
            async move { l.on_error(error).await }
        })
        .await;
    }

    /// Deliver one notification to every currently registered listener
    ///
    /// Iterates a snapshot; each delivery runs in its own spawned task so a
    /// panicking listener cannot take the dispatch down with it. A listener
    /// that fails is unregistered before this returns, and the remaining
    /// listeners still receive the notification.
    async fn dispatch<F, Fut>(&self, event: &'static str, make_delivery: F)
    where
        F: Fn(Arc<dyn SessionListener>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let snapshot: Vec<(ListenerId, Arc<dyn SessionListener>)> = self
            .listeners
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let deliveries: Vec<_> = snapshot
            .into_iter()
            .map(|(id, listener)| (id, tokio::spawn(make_delivery(listener))))
            .collect();

        for (id, delivery) in deliveries {
            if let Err(e) = delivery.await {
                warn!(
                    listener = %id,
                    event,
                    error = %e,
                    "listener failed during dispatch, unregistering it"
                );
                self.listeners.remove(&id);
            }
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
