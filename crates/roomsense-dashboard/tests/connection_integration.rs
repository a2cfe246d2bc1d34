//! Integration tests for the bridge connection and the frame pipeline.
//!
//! # Purpose
//!
//! These tests exercise the consumer through its *public* API against a real
//! WebSocket endpoint: a stub bridge bound to an ephemeral localhost port
//! that sends a scripted sequence of messages and then closes.  They verify:
//!
//! - The happy path: `Connected`, then one `FrameReceived` per well-formed
//!   message in order, then `Disconnected` when the bridge closes.
//! - Malformed messages are dropped without closing the connection.
//! - Frames delivered over the wire fold into the telemetry state the same
//!   way hand-built frames do.
//! - Teardown leaves no reconnect timer pending.
//!
//! # Why a stub bridge instead of the real one?
//!
//! The real bridge needs an MQTT broker behind it.  The consumer only sees
//! WebSocket text messages, so a scripted stub covers the same code paths
//! deterministically.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};

use roomsense_core::domain::topics;
use roomsense_core::Frame;
use roomsense_dashboard::infrastructure::network::{
    BridgeConnection, BridgeConnectionConfig, ConnectionEvent,
};
use roomsense_dashboard::infrastructure::ui_bridge::DashboardState;

// ── Stub bridge ───────────────────────────────────────────────────────────────

/// Binds an ephemeral port, accepts one WebSocket connection, sends the
/// scripted messages, then closes.  Returns the address to connect to.
async fn spawn_stub_bridge(messages: Vec<Message>) -> std::net::SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        if let Ok((stream, _peer)) = listener.accept().await {
            let mut ws = accept_async(stream).await.expect("ws handshake");
            for msg in messages {
                if ws.send(msg).await.is_err() {
                    return;
                }
            }
            let _ = ws.close(None).await;
        }
    });

    addr
}

/// Receives the next event or panics after two seconds.
async fn next_event(events: &mut tokio::sync::mpsc::Receiver<ConnectionEvent>) -> ConnectionEvent {
    timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("event within timeout")
        .expect("channel open")
}

fn text_frame(topic: &str, payload: &str, timestamp: u64) -> Message {
    Message::Text(
        Frame::with_timestamp(topic, payload, timestamp)
            .encode()
            .expect("encode"),
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_connection_delivers_frames_in_order_then_disconnects() {
    // Arrange: a stub bridge that sends two frames and closes.
    let addr = spawn_stub_bridge(vec![
        text_frame(topics::TEMPERATURE, "22.5", 1),
        text_frame(topics::HUMIDITY, "55", 2),
    ])
    .await;

    let running = Arc::new(AtomicBool::new(true));
    let connection = Arc::new(BridgeConnection::new(BridgeConnectionConfig {
        bridge_url: format!("ws://{addr}"),
        // Long enough that no second connection attempt interferes.
        reconnect_interval: Duration::from_secs(3600),
    }));

    // Act
    let mut events = Arc::clone(&connection).start(Arc::clone(&running)).await;

    // Assert: Connected first.
    assert!(matches!(next_event(&mut events).await, ConnectionEvent::Connected));

    // Both frames arrive, in the order the bridge sent them.
    let first = next_event(&mut events).await;
    let ConnectionEvent::FrameReceived(first) = first else {
        panic!("expected frame, got {first:?}");
    };
    assert_eq!(first.topic, topics::TEMPERATURE);
    assert_eq!(first.payload, "22.5");

    let second = next_event(&mut events).await;
    let ConnectionEvent::FrameReceived(second) = second else {
        panic!("expected frame, got {second:?}");
    };
    assert_eq!(second.topic, topics::HUMIDITY);

    // The bridge closing surfaces as Disconnected.
    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::Disconnected
    ));

    // Teardown.
    running.store(false, Ordering::Relaxed);
    connection.shutdown().await;
    assert!(!connection.timer().is_pending().await);
}

#[tokio::test]
async fn test_malformed_messages_are_dropped_without_closing() {
    // Arrange: a well-formed frame sandwiched between garbage.
    let addr = spawn_stub_bridge(vec![
        Message::Text("this is not json".to_string()),
        Message::Text(r#"{"payload":"22.5","timestamp":1}"#.to_string()),
        text_frame(topics::LIGHT, "47", 3),
    ])
    .await;

    let running = Arc::new(AtomicBool::new(true));
    let connection = Arc::new(BridgeConnection::new(BridgeConnectionConfig {
        bridge_url: format!("ws://{addr}"),
        reconnect_interval: Duration::from_secs(3600),
    }));

    // Act
    let mut events = Arc::clone(&connection).start(Arc::clone(&running)).await;

    // Assert: the only frame that surfaces is the well-formed one — the two
    // malformed messages neither appear nor end the connection early.
    assert!(matches!(next_event(&mut events).await, ConnectionEvent::Connected));

    let event = next_event(&mut events).await;
    let ConnectionEvent::FrameReceived(frame) = event else {
        panic!("expected the well-formed frame, got {event:?}");
    };
    assert_eq!(frame.topic, topics::LIGHT);

    assert!(matches!(
        next_event(&mut events).await,
        ConnectionEvent::Disconnected
    ));

    running.store(false, Ordering::Relaxed);
    connection.shutdown().await;
}

#[tokio::test]
async fn test_wire_frames_fold_into_telemetry_state() {
    // Arrange: the canonical two-metric sequence, delivered over a real
    // socket instead of hand-built frames.
    let addr = spawn_stub_bridge(vec![
        text_frame(topics::TEMPERATURE, "22.5", 1),
        text_frame(topics::HUMIDITY, "55", 2),
    ])
    .await;

    let running = Arc::new(AtomicBool::new(true));
    let connection = Arc::new(BridgeConnection::new(BridgeConnectionConfig {
        bridge_url: format!("ws://{addr}"),
        reconnect_interval: Duration::from_secs(3600),
    }));
    let state = DashboardState::new();

    // Act: fold every received frame, stop at disconnect.
    let mut events = Arc::clone(&connection).start(Arc::clone(&running)).await;
    loop {
        match next_event(&mut events).await {
            ConnectionEvent::FrameReceived(frame) => state.apply_frame(&frame).await,
            ConnectionEvent::Disconnected => break,
            ConnectionEvent::Connected => {}
        }
    }

    // Assert: both latest values and one history point each.
    let snapshot = state.snapshot().await;
    assert_eq!(snapshot.telemetry.temperature.latest_value, Some(22.5));
    assert_eq!(snapshot.telemetry.humidity.latest_value, Some(55.0));
    assert_eq!(snapshot.telemetry.temperature.history.len(), 1);
    assert_eq!(snapshot.telemetry.humidity.history.len(), 1);

    running.store(false, Ordering::Relaxed);
    connection.shutdown().await;
}
