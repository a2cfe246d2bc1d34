//! Network infrastructure for the dashboard consumer.
//!
//! Keeps a logical WebSocket connection to the telemetry bridge alive and
//! dispatches decoded frames to the application layer.
//!
//! Architecture:
//! - `BridgeConnection` owns the connection loop and its reconnect timer.
//! - Inbound WebSocket text messages are decoded into frames and forwarded
//!   on an `mpsc` channel as typed [`ConnectionEvent`]s.
//! - On any error or close the loop emits `Disconnected`, arms the explicit
//!   [`ReconnectTimer`] for the fixed delay, and tries again — it never
//!   gives up while the consumer is running.

pub mod reconnect;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info, warn};

use roomsense_core::Frame;

pub use reconnect::ReconnectTimer;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Configuration for the dashboard's bridge connection.
#[derive(Debug, Clone)]
pub struct BridgeConnectionConfig {
    /// WebSocket URL of the telemetry bridge, e.g. `ws://127.0.0.1:8080`.
    pub bridge_url: String,
    /// Fixed delay between reconnect attempts.
    pub reconnect_interval: Duration,
}

impl Default for BridgeConnectionConfig {
    fn default() -> Self {
        Self {
            bridge_url: "ws://127.0.0.1:8080".to_string(),
            reconnect_interval: Duration::from_secs(5),
        }
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Events emitted by the network layer to the application layer.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// The WebSocket connection to the bridge was established.
    Connected,
    /// The connection was lost (or an attempt failed); a reconnect is
    /// scheduled.
    Disconnected,
    /// A frame arrived and decoded successfully.
    FrameReceived(Frame),
}

// ── Bridge connection ─────────────────────────────────────────────────────────

/// Manages the WebSocket connection from the dashboard to the bridge.
pub struct BridgeConnection {
    config: BridgeConnectionConfig,
    timer: ReconnectTimer,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BridgeConnection {
    /// Creates a new (not yet connected) `BridgeConnection`.
    pub fn new(config: BridgeConnectionConfig) -> Self {
        Self {
            config,
            timer: ReconnectTimer::new(),
            task: Mutex::new(None),
        }
    }

    /// Connects to the bridge and begins delivering events.
    ///
    /// Returns a channel receiver that delivers [`ConnectionEvent`]s to the
    /// caller.  Runs a continuous reconnect loop until `running` is cleared
    /// or [`shutdown`](Self::shutdown) is called.
    pub async fn start(self: Arc<Self>, running: Arc<AtomicBool>) -> mpsc::Receiver<ConnectionEvent> {
        let (tx, rx) = mpsc::channel(128);
        let this = Arc::clone(&self);

        let handle = tokio::spawn(async move {
            while running.load(Ordering::Relaxed) {
                match connect_async(&this.config.bridge_url).await {
                    Ok((ws_stream, _response)) => {
                        info!("connected to bridge at {}", this.config.bridge_url);
                        let _ = tx.send(ConnectionEvent::Connected).await;

                        // Runs until the bridge closes or errors.
                        this.read_loop(ws_stream, &tx).await;

                        let _ = tx.send(ConnectionEvent::Disconnected).await;
                        info!(
                            "disconnected from bridge; reconnecting in {:?}",
                            this.config.reconnect_interval
                        );
                    }
                    Err(e) => {
                        warn!(
                            "could not connect to bridge at {}: {e}",
                            this.config.bridge_url
                        );
                        let _ = tx.send(ConnectionEvent::Disconnected).await;
                    }
                }

                if !running.load(Ordering::Relaxed) {
                    break;
                }

                // One explicit timer per attempt; scheduling replaces any
                // pending delay, so duplicate disconnects cannot stack.
                this.timer.schedule(this.config.reconnect_interval).await;
                this.timer.fired().await;
            }
        });

        *self.task.lock().await = Some(handle);
        rx
    }

    /// Tears the connection down: stops the connection task (closing the
    /// active connection if one is up), then cancels any reconnect timer it
    /// left armed.  No reconnect fires after this returns.  Safe to call
    /// twice.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
            // Wait until the task has actually stopped so it cannot arm a
            // new timer underneath the cancel below.
            let _ = handle.await;
        }
        self.timer.cancel().await;
    }

    /// The connection's reconnect timer (exposed for diagnostics).
    pub fn timer(&self) -> &ReconnectTimer {
        &self.timer
    }

    /// Reads frames from an established WebSocket until it closes or errors.
    ///
    /// Malformed text is dropped with a diagnostic — one bad message never
    /// takes the connection down.
    async fn read_loop(
        &self,
        ws_stream: tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        tx: &mpsc::Sender<ConnectionEvent>,
    ) {
        // The dashboard never writes; only the read half is driven.
        let (_ws_tx, mut ws_rx) = ws_stream.split();

        while let Some(item) = ws_rx.next().await {
            match item {
                Ok(WsMessage::Text(text)) => match Frame::decode(&text) {
                    Ok(frame) => {
                        if tx.send(ConnectionEvent::FrameReceived(frame)).await.is_err() {
                            // Consumer is gone; stop reading.
                            return;
                        }
                    }
                    Err(e) => {
                        // Keep the connection; just drop the bad message.
                        warn!("malformed frame dropped: {e}");
                    }
                },

                Ok(WsMessage::Close(_)) => {
                    debug!("bridge sent Close frame");
                    break;
                }

                Ok(WsMessage::Ping(_)) | Ok(WsMessage::Pong(_)) => {
                    // Protocol-level keepalive; tungstenite answers pings
                    // automatically.
                }

                Ok(other) => {
                    debug!("ignoring unexpected {} byte inbound frame", other.len());
                }

                Err(e) => {
                    warn!("bridge WebSocket error: {e}");
                    break;
                }
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_points_at_local_bridge() {
        // Arrange / Act
        let cfg = BridgeConnectionConfig::default();

        // Assert
        assert_eq!(cfg.bridge_url, "ws://127.0.0.1:8080");
    }

    #[test]
    fn test_default_reconnect_interval_is_five_seconds() {
        let cfg = BridgeConnectionConfig::default();
        assert_eq!(cfg.reconnect_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_connection_event_frame_received_holds_frame() {
        // Arrange
        let frame = Frame::with_timestamp("sala/umidade", "55", 7);
        let event = ConnectionEvent::FrameReceived(frame);

        // Assert – pattern-match to confirm the variant carries the value
        if let ConnectionEvent::FrameReceived(frame) = event {
            assert_eq!(frame.payload, "55");
        } else {
            panic!("unexpected event variant");
        }
    }

    #[tokio::test]
    async fn test_start_returns_receiver_immediately() {
        // Arrange: an address that refuses connections, and a cleared
        // running flag so the loop exits on its first check.
        let cfg = BridgeConnectionConfig {
            bridge_url: "ws://127.0.0.1:1".to_string(),
            reconnect_interval: Duration::from_secs(60),
        };
        let running = Arc::new(AtomicBool::new(false));
        let conn = Arc::new(BridgeConnection::new(cfg));

        // Act – start returns a receiver synchronously even when no
        // connection can be made.
        let rx = Arc::clone(&conn).start(running).await;

        // Assert – the receiver exists; clean up the task.
        drop(rx);
        conn.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_cancels_pending_reconnect() {
        // Arrange: connecting to a dead port fails immediately, so the loop
        // arms its reconnect timer right away.
        let cfg = BridgeConnectionConfig {
            bridge_url: "ws://127.0.0.1:1".to_string(),
            reconnect_interval: Duration::from_secs(3600),
        };
        let running = Arc::new(AtomicBool::new(true));
        let conn = Arc::new(BridgeConnection::new(cfg));
        let mut rx = Arc::clone(&conn).start(Arc::clone(&running)).await;

        // The first failed attempt emits Disconnected and arms the timer.
        let event = rx.recv().await.expect("disconnected event");
        assert!(matches!(event, ConnectionEvent::Disconnected));

        // Act
        running.store(false, Ordering::Relaxed);
        conn.shutdown().await;

        // Assert – nothing is pending after teardown.
        assert!(!conn.timer().is_pending().await);
    }
}
