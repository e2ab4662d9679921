//! Shared test fixtures: a scriptable mock transport and recording listeners

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use p2p_session_core::{
    ChannelHandle, ConnectConfig, ConnectionInfo, DeviceDescriptor, DeviceStatus, FailureReason,
    HostContext, SessionError, SessionListener, SessionManager, SessionManagerBuilder,
    TransportError, TransportEvent, TransportEventHandler, TransportProvider,
};

/// Transport actions recorded by the mock, in invocation order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    InitChannel,
    ReleaseChannel,
    DiscoverPeers,
    Connect(String),
    RemoveGroup,
    CancelConnect,
    RequestPeers,
    RequestConnectionInfo,
}

/// Scriptable in-memory transport provider
///
/// Records every action and lets tests inject events through the handler
/// registered at channel initialization.
#[derive(Default)]
pub struct MockTransport {
    calls: Mutex<Vec<TransportCall>>,
    handler: Mutex<Option<Arc<dyn TransportEventHandler>>>,
    peers: Mutex<Vec<DeviceDescriptor>>,
    connection_info: Mutex<Option<ConnectionInfo>>,
    fail_discover: Mutex<Option<FailureReason>>,
    fail_connect: Mutex<Option<FailureReason>>,
    failing_inits: Mutex<u32>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, call: &TransportCall) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn set_peers(&self, peers: Vec<DeviceDescriptor>) {
        *self.peers.lock().unwrap() = peers;
    }

    pub fn set_connection_info(&self, info: ConnectionInfo) {
        *self.connection_info.lock().unwrap() = Some(info);
    }

    pub fn fail_next_discover(&self, reason: FailureReason) {
        *self.fail_discover.lock().unwrap() = Some(reason);
    }

    pub fn fail_next_connect(&self, reason: FailureReason) {
        *self.fail_connect.lock().unwrap() = Some(reason);
    }

    /// Make the next `count` channel initializations fail
    pub fn fail_inits(&self, count: u32) {
        *self.failing_inits.lock().unwrap() = count;
    }

    /// Push an event into the handler registered at channel init
    pub async fn emit(&self, event: TransportEvent) {
        let handler = self
            .handler
            .lock()
            .unwrap()
            .clone()
            .expect("no event handler registered");
        handler.on_transport_event(event).await;
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TransportProvider for MockTransport {
    async fn init_channel(
        &self,
        _host: &HostContext,
        events: Arc<dyn TransportEventHandler>,
    ) -> Result<ChannelHandle, TransportError> {
        self.record(TransportCall::InitChannel);
        {
            let mut remaining = self.failing_inits.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(TransportError::ChannelClosed);
            }
        }
        *self.handler.lock().unwrap() = Some(events);
        Ok(ChannelHandle::new())
    }

    async fn release_channel(&self, _channel: &ChannelHandle) {
        self.record(TransportCall::ReleaseChannel);
        *self.handler.lock().unwrap() = None;
    }

    async fn discover_peers(&self, _channel: &ChannelHandle) -> Result<(), TransportError> {
        self.record(TransportCall::DiscoverPeers);
        match self.fail_discover.lock().unwrap().take() {
            Some(reason) => Err(TransportError::ActionFailed { reason }),
            None => Ok(()),
        }
    }

    async fn connect(
        &self,
        _channel: &ChannelHandle,
        config: &ConnectConfig,
    ) -> Result<(), TransportError> {
        self.record(TransportCall::Connect(config.address.clone()));
        match self.fail_connect.lock().unwrap().take() {
            Some(reason) => Err(TransportError::ActionFailed { reason }),
            None => Ok(()),
        }
    }

    async fn remove_group(&self, _channel: &ChannelHandle) -> Result<(), TransportError> {
        self.record(TransportCall::RemoveGroup);
        Ok(())
    }

    async fn cancel_connect(&self, _channel: &ChannelHandle) -> Result<(), TransportError> {
        self.record(TransportCall::CancelConnect);
        Ok(())
    }

    async fn request_peers(
        &self,
        _channel: &ChannelHandle,
    ) -> Result<Vec<DeviceDescriptor>, TransportError> {
        self.record(TransportCall::RequestPeers);
        Ok(self.peers.lock().unwrap().clone())
    }

    async fn request_connection_info(
        &self,
        _channel: &ChannelHandle,
    ) -> Result<ConnectionInfo, TransportError> {
        self.record(TransportCall::RequestConnectionInfo);
        Ok(self
            .connection_info
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(default_connection_info))
    }
}

/// Listener that records every notification it receives
#[derive(Default)]
pub struct RecordingListener {
    pub state_changes: Mutex<Vec<bool>>,
    pub device_updates: Mutex<Vec<Vec<DeviceDescriptor>>>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    pub errors: Mutex<Vec<SessionError>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    pub fn device_update_count(&self) -> usize {
        self.device_updates.lock().unwrap().len()
    }
}

#[async_trait]
impl SessionListener for RecordingListener {
    async fn on_state_changed(&self, enabled: bool) {
        self.state_changes.lock().unwrap().push(enabled);
    }

    async fn on_update_devices(&self, devices: Vec<DeviceDescriptor>) {
        self.device_updates.lock().unwrap().push(devices);
    }

    async fn on_connect(&self, _info: ConnectionInfo) {
        self.connects.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_error(&self, error: SessionError) {
        self.errors.lock().unwrap().push(error);
    }
}

/// Listener whose device updates always panic
pub struct PanickingListener;

#[async_trait]
impl SessionListener for PanickingListener {
    async fn on_update_devices(&self, _devices: Vec<DeviceDescriptor>) {
        panic!("listener is broken");
    }
}

pub fn default_connection_info() -> ConnectionInfo {
    ConnectionInfo {
        group_formed: true,
        is_group_owner: false,
        group_owner_address: Some("192.168.49.1".parse().unwrap()),
        established_at: Utc::now(),
    }
}

pub fn device(address: &str, name: &str, status: DeviceStatus) -> DeviceDescriptor {
    DeviceDescriptor::new(address, name, status)
}

pub fn build_session(transport: &Arc<MockTransport>, host: &Arc<HostContext>) -> Arc<SessionManager> {
    SessionManagerBuilder::new()
        .transport(transport.clone())
        .host(host)
        .build()
        .expect("failed to build session manager")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("p2p_session_core=debug")
        .with_test_writer()
        .try_init();
}
