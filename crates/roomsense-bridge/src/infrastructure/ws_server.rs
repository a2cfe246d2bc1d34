//! WebSocket server: accept loop and per-session task management.
//!
//! This module is responsible for:
//!
//! 1. Binding a TCP listener on the configured address.
//! 2. Accepting incoming TCP connections from browsers.
//! 3. Upgrading each connection to a WebSocket session.
//! 4. Opening a corresponding MQTT session to the broker.
//! 5. Running two concurrent tasks per session:
//!    - **Relay**: receives upstream events, encodes each publish as one JSON
//!      frame, and writes it to the WebSocket — one write per message, in
//!      arrival order, no batching.
//!    - **Downstream watch**: reads the browser side of the WebSocket so a
//!      close or error is noticed promptly.  The browser only listens; any
//!      data frames it sends are ignored.
//! 6. Tearing down *both* halves when either one ends.
//! 7. Gracefully shutting down when the `running` flag is cleared.
//!
//! # Scalability
//!
//! Each browser session runs in its own Tokio task.  The accept loop never
//! blocks: it accepts a connection and immediately spawns a task for it
//! before accepting the next one.  The only structure shared across session
//! lifecycles is the [`SessionRegistry`], whose mutations are serialized by
//! an async `RwLock`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::{frame_from_publish, BridgeSession};
use crate::domain::config::BridgeConfig;
use crate::infrastructure::upstream::{UpstreamEvent, UpstreamSession};

// ── Session registry ──────────────────────────────────────────────────────────

/// Diagnostic info about one live bridge session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// The browser's socket address.
    pub peer_addr: SocketAddr,
}

/// The set of currently live bridge sessions.
///
/// This is the only structure touched by more than one session lifecycle:
/// insert on accept, remove on close.  The async `RwLock` serializes those
/// mutations; everything else a session owns is exclusive to it.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: tokio::sync::RwLock<HashMap<Uuid, SessionInfo>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a newly established session.
    pub async fn insert(&self, id: Uuid, info: SessionInfo) {
        self.sessions.write().await.insert(id, info);
    }

    /// Removes a session on teardown.  Removing an unknown id is a no-op.
    pub async fn remove(&self, id: Uuid) {
        self.sessions.write().await.remove(&id);
    }

    /// Number of live sessions, for diagnostics logging.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// `true` when no sessions are live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Runs the main WebSocket accept loop until `running` is set to `false`.
///
/// Binds a TCP listener on `config.ws_bind_addr` and accepts incoming
/// connections in a loop.  Each accepted connection is handed off to a
/// dedicated Tokio task so that one slow client never blocks others.
///
/// # Parameters
///
/// - `config`  – Bridge configuration (addresses, reconnect interval).
/// - `running` – Shared flag; the loop exits when this is set to `false`.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot be bound (e.g., the port is
/// already in use or the process lacks permission to bind).
pub async fn run_server(config: BridgeConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.ws_bind_addr)
        .await
        .with_context(|| {
            format!(
                "failed to bind WebSocket listener on {}",
                config.ws_bind_addr
            )
        })?;

    info!("telemetry bridge listening on {}", config.ws_bind_addr);

    // Share config and registry cheaply across all session tasks.
    let config = Arc::new(config);
    let registry = Arc::new(SessionRegistry::new());

    loop {
        // Check the shutdown flag before each accept attempt.
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        // Use a short timeout on `accept()` so the loop can periodically
        // check the `running` flag even when no browsers are connecting.
        let accept_result = timeout(Duration::from_millis(200), listener.accept()).await;

        match accept_result {
            Ok(Ok((stream, peer_addr))) => {
                info!("new dashboard connection from {peer_addr}");
                let cfg = Arc::clone(&config);
                let reg = Arc::clone(&registry);

                // Spawn a dedicated Tokio task for this session so the
                // accept loop is never delayed by session I/O.
                tokio::spawn(async move {
                    handle_dashboard_session(stream, peer_addr, cfg, reg).await;
                });
            }
            Ok(Err(e)) => {
                // Transient accept error (e.g., too many open file
                // descriptors).  Log it and continue rather than crashing.
                error!("accept error: {e}");
            }
            Err(_) => {
                // Timeout — no new connection in the last 200 ms.
                // Loop back to check the `running` flag.
            }
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

/// Top-level handler for a single dashboard WebSocket session.
///
/// Wraps [`run_session`] and logs the outcome.  Using a separate outer/inner
/// function pair lets `run_session` use `?` for clean error propagation
/// while this outer function logs errors.
async fn handle_dashboard_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<BridgeConfig>,
    registry: Arc<SessionRegistry>,
) {
    match run_session(raw_stream, peer_addr, config, registry).await {
        Ok(()) => info!("session {peer_addr} closed normally"),
        Err(e) => warn!("session {peer_addr} closed with error: {e:#}"),
    }
}

/// Runs the complete lifecycle of a single dashboard WebSocket session.
///
/// 1. Completes the WebSocket HTTP upgrade handshake with the browser.
/// 2. Establishes the paired upstream MQTT session.  If that fails, the
///    function returns and the WebSocket is dropped — the browser is closed
///    immediately with no frames sent, never left on a half-open bridge.
/// 3. Runs the relay task and the downstream watch task concurrently.
/// 4. When either task ends, tears down the other half: the upstream pump is
///    aborted (cancelling any pending reconnect delay) and the WebSocket is
///    dropped.
///
/// # Errors
///
/// Returns an error if the WebSocket handshake fails or the upstream session
/// cannot be established.
async fn run_session(
    raw_stream: TcpStream,
    peer_addr: SocketAddr,
    config: Arc<BridgeConfig>,
    registry: Arc<SessionRegistry>,
) -> anyhow::Result<()> {
    // ── Step 1: Complete the WebSocket handshake ──────────────────────────────
    let ws_stream = accept_async(raw_stream)
        .await
        .with_context(|| format!("WebSocket handshake failed with {peer_addr}"))?;

    info!("WebSocket session established: {peer_addr}");

    let mut session = BridgeSession::new();
    let session_id = session.id().to_string();

    // ── Step 2: Establish the upstream MQTT session ───────────────────────────
    //
    // Fail-fast: on error, returning here drops `ws_stream`, which closes the
    // browser connection before any frame was sent.
    let (upstream, mut upstream_rx) = UpstreamSession::connect(&config, &session_id)
        .await
        .with_context(|| {
            format!(
                "session {peer_addr}: failed to reach broker at {}:{}",
                config.broker_host, config.broker_port
            )
        })?;
    session.mark_subscribed();

    registry
        .insert(session.id(), SessionInfo { peer_addr })
        .await;
    info!(
        "session {session_id}: bridge established for {peer_addr} ({} live)",
        registry.len().await
    );

    // ── Step 3: Split the WebSocket into read/write halves ────────────────────
    //
    // The relay task owns the write sink; the watch task owns the read
    // stream.  Subscribes are fire-and-forget on this transport, so the
    // session starts relaying as soon as both tasks are up.
    let (mut ws_tx, mut ws_rx) = ws_stream.split();
    session.mark_relaying();

    // ── Task A: Upstream → downstream relay ───────────────────────────────────
    //
    // Receives upstream events from the single session channel, so frames go
    // out in broker delivery order — one WebSocket write per message.
    let session_id_relay = session_id.clone();
    let mut relay_task = tokio::spawn(async move {
        while let Some(event) = upstream_rx.recv().await {
            match event {
                UpstreamEvent::Message { topic, payload } => {
                    let frame = match frame_from_publish(&topic, &payload) {
                        Ok(frame) => frame,
                        Err(e) => {
                            // Undecodable payloads are dropped; the session
                            // keeps relaying the other messages.
                            warn!("session {session_id_relay}: {e}");
                            continue;
                        }
                    };

                    let text = match frame.encode() {
                        Ok(text) => text,
                        Err(e) => {
                            error!("session {session_id_relay}: frame encode error: {e}");
                            continue;
                        }
                    };

                    // A failed send means the browser is gone; ending this
                    // task tears down the whole session.
                    if ws_tx.send(WsMessage::Text(text)).await.is_err() {
                        debug!(
                            "session {session_id_relay}: WebSocket send failed (browser disconnected)"
                        );
                        break;
                    }
                }

                UpstreamEvent::Connected => {
                    debug!("session {session_id_relay}: upstream connected");
                }

                UpstreamEvent::Disconnected => {
                    // Not terminal — the upstream session retries on its
                    // fixed delay while this session stays alive.
                    warn!("session {session_id_relay}: upstream lost; reconnect pending");
                }
            }
        }
    });

    // ── Task B: Downstream watch ──────────────────────────────────────────────
    //
    // The dashboard protocol is one-directional; the browser only listens.
    // This task exists to notice the browser closing or erroring promptly.
    let session_id_watch = session_id.clone();
    let mut watch_task = tokio::spawn(async move {
        loop {
            match ws_rx.next().await {
                Some(Ok(WsMessage::Close(_))) => {
                    debug!("session {session_id_watch}: WebSocket Close frame received");
                    break;
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    // tokio-tungstenite replies with Pong automatically when
                    // the sink flushes; nothing to do here.
                    debug!(
                        "session {session_id_watch}: WebSocket ping ({} bytes)",
                        data.len()
                    );
                }
                Some(Ok(WsMessage::Pong(_))) => {
                    debug!("session {session_id_watch}: WebSocket pong received");
                }
                Some(Ok(msg)) => {
                    // Text/binary from the browser is not part of the
                    // protocol; ignore rather than closing the session.
                    debug!(
                        "session {session_id_watch}: ignoring unexpected {} byte inbound frame",
                        msg.len()
                    );
                }
                Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                    debug!("session {session_id_watch}: browser WebSocket closed");
                    break;
                }
                Some(Err(e)) => {
                    warn!("session {session_id_watch}: browser WebSocket error: {e}");
                    break;
                }
                None => {
                    debug!("session {session_id_watch}: browser stream ended");
                    break;
                }
            }
        }
    });

    // ── Step 4: Wait for either half to end, then tear down the other ─────────
    tokio::select! {
        _ = &mut relay_task => {
            debug!("session {session_id}: relay task ended");
        }
        _ = &mut watch_task => {
            debug!("session {session_id}: downstream watch task ended");
        }
    }

    // Teardown is symmetric: whichever half ended first, the other half is
    // closed here.  Aborting a task that already finished is a no-op, as is
    // the second close of the session state.
    relay_task.abort();
    watch_task.abort();
    upstream.shutdown().await;
    registry.remove(session.id()).await;

    if session.close() {
        info!(
            "session {session_id}: torn down ({} live)",
            registry.len().await
        );
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn info(port: u16) -> SessionInfo {
        SessionInfo {
            peer_addr: format!("127.0.0.1:{port}").parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_registry_starts_empty() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty().await);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn test_registry_insert_increments_len() {
        let registry = SessionRegistry::new();
        registry.insert(Uuid::new_v4(), info(50_000)).await;
        registry.insert(Uuid::new_v4(), info(50_001)).await;
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_registry_remove_decrements_len() {
        let registry = SessionRegistry::new();
        let id = Uuid::new_v4();
        registry.insert(id, info(50_000)).await;
        registry.remove(id).await;
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_registry_remove_unknown_id_is_noop() {
        let registry = SessionRegistry::new();
        registry.insert(Uuid::new_v4(), info(50_000)).await;
        registry.remove(Uuid::new_v4()).await;
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_registry_concurrent_mutations_are_serialized() {
        // Many session lifecycles inserting and removing at once must leave
        // the registry consistent.
        let registry = Arc::new(SessionRegistry::new());

        let mut handles = Vec::new();
        for i in 0..32u16 {
            let reg = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                let id = Uuid::new_v4();
                reg.insert(id, info(40_000 + i)).await;
                reg.remove(id).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(registry.is_empty().await);
    }
}
