//! Bridge session lifecycle and publish-to-frame translation.
//!
//! A *bridge session* pairs one browser WebSocket connection with exactly one
//! upstream MQTT session.  This module models its lifecycle as an explicit
//! state machine and provides the pure translation from a raw MQTT publish to
//! the JSON frame sent downstream.  Nothing here performs I/O, so the whole
//! lifecycle is unit-testable without sockets or a broker.
//!
//! # Lifecycle
//!
//! ```text
//! Connecting ──(broker CONNACK)──> Subscribed ──(subscriptions issued)──> Relaying
//!     │                                 │                                    │
//!     └────────────── close() from any state is terminal ───────────────────┘
//!                                       ↓
//!                                    Closed
//! ```
//!
//! `close()` is idempotent: closing an already-closed session is a no-op, so
//! the downstream and upstream halves can both initiate teardown without
//! coordinating who goes first.

use thiserror::Error;
use uuid::Uuid;

use roomsense_core::Frame;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors that can occur while translating an upstream publish into a frame.
///
/// These are business-logic failures (bad data from the broker), not I/O
/// errors.  I/O errors are handled separately by the infrastructure layer.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The broker delivered a payload that is not valid UTF-8.
    ///
    /// The frame wire format carries payloads as JSON strings, so a binary
    /// payload cannot be relayed.  The message is dropped and logged; the
    /// session keeps running.
    #[error("payload on {topic} is not valid UTF-8")]
    NonUtf8Payload {
        /// The topic the undecodable payload arrived on.
        topic: String,
    },
}

// ── Session state machine ─────────────────────────────────────────────────────

/// Lifecycle state of one bridge session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The upstream MQTT session is being established; no frames relayed.
    Connecting,
    /// The broker accepted the connection and topic subscriptions were issued.
    Subscribed,
    /// Inbound publishes are being relayed as frames, in arrival order.
    Relaying,
    /// Terminal.  Both halves of the bridge are torn down.
    Closed,
}

/// Identity and lifecycle of one browser/upstream pairing.
///
/// The runtime half-handles (WebSocket sink, MQTT client) live in the
/// infrastructure layer; this type owns only the identity and the state so
/// the transition rules stay pure.
#[derive(Debug)]
pub struct BridgeSession {
    id: Uuid,
    state: SessionState,
}

impl BridgeSession {
    /// Creates a new session in `Connecting` with a fresh opaque id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Connecting,
        }
    }

    /// The opaque session identifier used in log messages.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Records that the broker accepted the connection and subscriptions
    /// were issued.  Only meaningful from `Connecting`; any other state is
    /// left untouched.
    pub fn mark_subscribed(&mut self) {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Subscribed;
        }
    }

    /// Records that the session began relaying frames.  The transport treats
    /// subscribe as fire-and-forget, so this follows `mark_subscribed`
    /// immediately.  Only meaningful from `Subscribed`.
    pub fn mark_relaying(&mut self) {
        if self.state == SessionState::Subscribed {
            self.state = SessionState::Relaying;
        }
    }

    /// Moves the session to `Closed`.
    ///
    /// Returns `true` if this call performed the close, `false` if the
    /// session was already closed.  Callers use the return value to make
    /// teardown side effects (closing the other half, deregistering) run
    /// exactly once.
    pub fn close(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        self.state = SessionState::Closed;
        true
    }

    /// `true` once the session has reached the terminal state.
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }
}

impl Default for BridgeSession {
    fn default() -> Self {
        Self::new()
    }
}

// ── Publish → Frame translation ───────────────────────────────────────────────

/// Translates one raw MQTT publish into the frame sent downstream.
///
/// The frame is stamped with the current wall-clock time — the timestamp
/// marks when the message crossed the bridge.
///
/// # Errors
///
/// Returns [`RelayError::NonUtf8Payload`] if the payload bytes are not valid
/// UTF-8.  The caller drops the message and keeps the session alive.
pub fn frame_from_publish(topic: &str, payload: &[u8]) -> Result<Frame, RelayError> {
    let text = std::str::from_utf8(payload).map_err(|_| RelayError::NonUtf8Payload {
        topic: topic.to_string(),
    })?;
    Ok(Frame::new(topic, text))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
