//! Fault isolation: one broken observer must not affect the others

mod common;

use std::sync::Arc;

use common::{
    build_session, device, init_tracing, MockTransport, PanickingListener, RecordingListener,
};
use p2p_session_core::{DeviceStatus, HostContext, TransportEvent};

#[tokio::test]
async fn panicking_listener_is_removed_and_others_still_notified() {
    init_tracing();
    let transport = MockTransport::new();
    let host = HostContext::new("test-host");
    let session = build_session(&transport, &host);

    let healthy = RecordingListener::new();
    session.add_listener(Arc::new(PanickingListener));
    session.add_listener(healthy.clone());
    assert_eq!(session.stats().await.listener_count, 2);

    session.register().await.expect("register failed");
    transport.set_peers(vec![device(
        "aa:bb:cc:00:11:22",
        "printer",
        DeviceStatus::Available,
    )]);
    transport.emit(TransportEvent::PeersChanged).await;

    // the broken listener is gone, the healthy one got the update
    assert_eq!(healthy.device_update_count(), 1);
    assert_eq!(session.stats().await.listener_count, 1);

    // a later event no longer reaches the removed listener
    transport.emit(TransportEvent::PeersChanged).await;
    assert_eq!(healthy.device_update_count(), 2);
    assert_eq!(session.stats().await.listener_count, 1);
}

#[tokio::test]
async fn removed_listener_stops_receiving_notifications() {
    init_tracing();
    let transport = MockTransport::new();
    let host = HostContext::new("test-host");
    let session = build_session(&transport, &host);

    let listener = RecordingListener::new();
    let id = session.add_listener(listener.clone());

    session.register().await.expect("register failed");
    transport
        .emit(TransportEvent::EnabledChanged { enabled: true })
        .await;
    assert_eq!(listener.state_changes.lock().unwrap().len(), 1);

    assert!(session.remove_listener(id));
    transport
        .emit(TransportEvent::EnabledChanged { enabled: false })
        .await;
    assert_eq!(listener.state_changes.lock().unwrap().as_slice(), &[true]);

    // removing twice reports absence
    assert!(!session.remove_listener(id));
}

#[tokio::test]
async fn listeners_added_during_a_session_receive_later_events() {
    init_tracing();
    let transport = MockTransport::new();
    let host = HostContext::new("test-host");
    let session = build_session(&transport, &host);

    session.register().await.expect("register failed");
    transport
        .emit(TransportEvent::EnabledChanged { enabled: true })
        .await;

    let late = RecordingListener::new();
    session.add_listener(late.clone());
    assert_eq!(late.state_changes.lock().unwrap().len(), 0);

    transport
        .emit(TransportEvent::EnabledChanged { enabled: false })
        .await;
    assert_eq!(late.state_changes.lock().unwrap().as_slice(), &[false]);
}
