//! Upstream MQTT session management.
//!
//! Each browser WebSocket session gets its own MQTT connection to the broker.
//! The broker treats the bridge as just another subscriber; sessions never
//! share a connection, so tearing one down cannot disturb another.
//!
//! # Connection lifecycle
//!
//! [`UpstreamSession::connect`] drives the rumqttc event loop until the
//! broker's first `CONNACK` arrives — or fails fast on the first connection
//! error, so the caller can close the half-open bridge immediately.  After
//! that, a pump task polls the event loop forever:
//!
//! - `Publish` packets are forwarded as [`UpstreamEvent::Message`].
//! - Connection errors emit [`UpstreamEvent::Disconnected`], wait the fixed
//!   reconnect delay, and poll again — rumqttc re-dials the broker on the
//!   next poll.  Retries repeat for as long as the owning session is alive.
//! - Each re-`CONNACK` re-issues the fixed topic subscriptions (the session
//!   is clean, so the broker forgets them across reconnects) and emits
//!   [`UpstreamEvent::Connected`].
//!
//! [`UpstreamSession::shutdown`] aborts the pump task — which also cancels
//! any reconnect delay currently sleeping — and sends an MQTT disconnect.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS, SubscribeReasonCode};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use roomsense_core::domain::topics::BRIDGE_TOPICS;

use crate::domain::BridgeConfig;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur in the upstream session layer.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The initial broker connection could not be established.
    ///
    /// Only the *first* connection fails fast; once a session is up, lost
    /// connections are retried on a fixed delay instead of surfacing here.
    #[error("failed to connect to MQTT broker at {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: rumqttc::ConnectionError,
    },
}

// ── Events ────────────────────────────────────────────────────────────────────

/// Events emitted by the upstream session to its owning bridge session.
#[derive(Debug)]
pub enum UpstreamEvent {
    /// The broker (re)accepted the connection and subscriptions were issued.
    Connected,
    /// A message arrived on a subscribed topic.
    Message {
        /// The topic the message was published on.
        topic: String,
        /// Raw payload bytes as delivered by the broker.
        payload: Vec<u8>,
    },
    /// The broker connection was lost; a reconnect attempt is scheduled.
    Disconnected,
}

// ── Upstream session ──────────────────────────────────────────────────────────

/// One MQTT connection owned by one bridge session.
///
/// Dropping the session does not stop the pump task — call
/// [`UpstreamSession::shutdown`] during teardown so no reconnect timer
/// outlives the owning bridge session.
pub struct UpstreamSession {
    client: AsyncClient,
    pump: JoinHandle<()>,
}

impl UpstreamSession {
    /// Opens a new broker connection and subscribes to the fixed topic set.
    ///
    /// Returns the session handle together with the receiver that delivers
    /// [`UpstreamEvent`]s to the owning bridge session.  Events arrive in
    /// broker delivery order — a single channel with a single producer, so
    /// per-topic ordering is preserved end to end.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Connect`] if the broker cannot be reached
    /// (fail-fast; the caller closes the downstream connection with no
    /// frames sent).
    pub async fn connect(
        config: &BridgeConfig,
        session_id: &str,
    ) -> Result<(Self, mpsc::Receiver<UpstreamEvent>), UpstreamError> {
        // Every session carries a distinct client id; brokers disconnect the
        // older of two clients sharing an id.
        let mut opts = MqttOptions::new(
            format!("roomsense-bridge-{session_id}"),
            config.broker_host.clone(),
            config.broker_port,
        );
        opts.set_keep_alive(config.keep_alive);
        opts.set_clean_session(true);

        let (client, mut eventloop) = AsyncClient::new(opts, 64);

        // Drive the event loop until the broker's CONNACK confirms the
        // connection.  The first error fails the whole construction — the
        // bridge server refuses the browser rather than holding a half-open
        // bridge that will never relay anything.
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    debug!("session {session_id}: broker accepted connection");
                    break;
                }
                Ok(_) => continue,
                Err(source) => {
                    return Err(UpstreamError::Connect {
                        host: config.broker_host.clone(),
                        port: config.broker_port,
                        source,
                    });
                }
            }
        }

        subscribe_all(&client, session_id).await;

        let (tx, rx) = mpsc::channel(128);
        let pump = tokio::spawn(pump_events(
            eventloop,
            client.clone(),
            tx,
            config.reconnect_interval,
            session_id.to_string(),
        ));

        Ok((Self { client, pump }, rx))
    }

    /// Tears the session down: aborts the pump task (cancelling any pending
    /// reconnect delay) and asks the broker for a clean disconnect.
    ///
    /// Safe to call more than once; aborting a finished task and
    /// disconnecting a dead client are both no-ops.
    pub async fn shutdown(&self) {
        self.pump.abort();
        // The disconnect request fails if the connection is already gone;
        // that is exactly the situation teardown handles, so ignore it.
        let _ = self.client.disconnect().await;
    }
}

// ── Pump loop ─────────────────────────────────────────────────────────────────

/// Polls the rumqttc event loop and forwards packets as [`UpstreamEvent`]s.
///
/// Runs until the receiver side of `tx` is dropped (session teardown) or the
/// pump task is aborted.
async fn pump_events(
    mut eventloop: EventLoop,
    client: AsyncClient,
    tx: mpsc::Sender<UpstreamEvent>,
    reconnect_interval: Duration,
    session_id: String,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                info!("session {session_id}: broker connection (re)established");
                // Clean sessions lose their subscriptions across reconnects.
                subscribe_all(&client, &session_id).await;
                if tx.send(UpstreamEvent::Connected).await.is_err() {
                    break;
                }
            }

            Ok(Event::Incoming(Incoming::Publish(publish))) => {
                debug!(
                    "session {session_id}: {} ({} bytes)",
                    publish.topic,
                    publish.payload.len()
                );
                let event = UpstreamEvent::Message {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                };
                // If the receiver is gone, the bridge session is over.
                if tx.send(event).await.is_err() {
                    debug!("session {session_id}: event channel closed; exiting pump");
                    break;
                }
            }

            Ok(Event::Incoming(Incoming::SubAck(ack))) => {
                // Per-topic failures are logged and do not abort the session;
                // the remaining topics keep flowing.
                for code in &ack.return_codes {
                    if matches!(code, SubscribeReasonCode::Failure) {
                        warn!("session {session_id}: broker rejected a subscription");
                    }
                }
            }

            Ok(_) => {
                // PingResp, PubAck bookkeeping, outgoing echoes — nothing to relay.
            }

            Err(e) => {
                warn!(
                    "session {session_id}: broker connection lost: {e}; retrying in {:?}",
                    reconnect_interval
                );
                if tx.send(UpstreamEvent::Disconnected).await.is_err() {
                    break;
                }
                tokio::time::sleep(reconnect_interval).await;
                // The next poll() re-dials the broker.
            }
        }
    }
}

/// Issues one subscription per topic in the fixed table.
///
/// A failed subscribe *request* (client-side queueing error) is logged per
/// topic and skipped; the other topics are unaffected.
async fn subscribe_all(client: &AsyncClient, session_id: &str) {
    for topic in BRIDGE_TOPICS {
        // QoS 0 matches the at-most-once delivery the publisher uses.
        if let Err(e) = client.subscribe(topic, QoS::AtMostOnce).await {
            warn!("session {session_id}: subscribe request for {topic} failed: {e}");
        } else {
            debug!("session {session_id}: subscribed to {topic}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
