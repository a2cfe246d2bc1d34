//! The telemetry frame: one topic message crossing the bridge.
//!
//! The bridge receives raw MQTT publishes and forwards each one to the
//! browser as exactly one WebSocket text message containing a single JSON
//! object — no batching, no coalescing:
//!
//! ```json
//! {"topic":"sala/temperatura","payload":"22.5","timestamp":1722782400000}
//! ```
//!
//! The dashboard decodes that text back into a [`Frame`].  A frame is
//! immutable once constructed: the aggregator reads it, it is never patched
//! in place.
//!
//! # Malformed input
//!
//! [`Frame::decode`] rejects anything that is not a JSON object carrying
//! `topic` and `payload` strings.  Callers drop the message and log a
//! diagnostic; a bad frame never closes the connection.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error type ────────────────────────────────────────────────────────────────

/// Errors produced by the frame codec.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The frame could not be serialized to JSON.
    ///
    /// With `String` fields this is practically unreachable, but the relay
    /// path still propagates it instead of panicking.
    #[error("failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),

    /// Inbound text was not a JSON object with `topic` and `payload` fields.
    #[error("malformed frame: {0}")]
    Decode(#[source] serde_json::Error),
}

// ── Frame ─────────────────────────────────────────────────────────────────────

/// One relayed topic message.
///
/// The serde derive produces exactly the wire representation — field names
/// are the wire names, and there is no envelope around the object.
///
/// # Examples
///
/// ```rust
/// use roomsense_core::Frame;
///
/// let frame = Frame::with_timestamp("sala/umidade", "55", 1_000);
/// let text = frame.encode().unwrap();
/// assert_eq!(Frame::decode(&text).unwrap(), frame);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Slash-delimited topic name, e.g. `sala/temperatura`.
    pub topic: String,
    /// The raw message payload, passed through as text.
    pub payload: String,
    /// Milliseconds since the Unix epoch, stamped by the bridge on relay.
    pub timestamp: u64,
}

impl Frame {
    /// Builds a frame stamped with the current wall-clock time.
    ///
    /// This is what the bridge calls on the relay path: the timestamp marks
    /// when the message crossed the bridge, not when the sensor read it.
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::with_timestamp(topic, payload, now_ms())
    }

    /// Builds a frame with an explicit timestamp.
    pub fn with_timestamp(
        topic: impl Into<String>,
        payload: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            timestamp,
        }
    }

    /// Serializes the frame to its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Encode`] if serde_json fails.
    pub fn encode(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(FrameError::Encode)
    }

    /// Parses one WebSocket text message into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Decode`] for non-JSON input and for JSON that is
    /// missing `topic` or `payload` (or carries the wrong types).
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        serde_json::from_str(text).map_err(FrameError::Decode)
    }
}

// ── Clock helper ──────────────────────────────────────────────────────────────

/// Returns the current wall-clock time in milliseconds since the Unix epoch.
///
/// Falls back to 0 if the system clock reports a time before the epoch,
/// rather than propagating an error through the relay hot path.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_flat_json_object() {
        // Arrange
        let frame = Frame::with_timestamp("sala/temperatura", "22.5", 1000);

        // Act
        let text = frame.encode().unwrap();

        // Assert – the wire format is the bare object, no envelope
        assert_eq!(
            text,
            r#"{"topic":"sala/temperatura","payload":"22.5","timestamp":1000}"#
        );
    }

    #[test]
    fn test_decode_roundtrips_encoded_frame() {
        let frame = Frame::with_timestamp("sala/umidade", "55", 42);
        let decoded = Frame::decode(&frame.encode().unwrap()).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_rejects_non_json_text() {
        let result = Frame::decode("not json at all");
        assert!(matches!(result, Err(FrameError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_object_missing_topic() {
        let result = Frame::decode(r#"{"payload":"22.5","timestamp":1000}"#);
        assert!(matches!(result, Err(FrameError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_object_missing_payload() {
        let result = Frame::decode(r#"{"topic":"sala/temperatura","timestamp":1000}"#);
        assert!(matches!(result, Err(FrameError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_non_string_payload() {
        // A numeric payload is a type error, not silently coerced.
        let result = Frame::decode(r#"{"topic":"sala/temperatura","payload":22.5,"timestamp":1}"#);
        assert!(matches!(result, Err(FrameError::Decode(_))));
    }

    #[test]
    fn test_new_stamps_current_time() {
        let before = now_ms();
        let frame = Frame::new("sala/status", "online");
        let after = now_ms();
        assert!(frame.timestamp >= before && frame.timestamp <= after);
    }

    #[test]
    fn test_now_ms_is_positive() {
        assert!(now_ms() > 0);
    }

    #[test]
    fn test_decode_accepts_empty_payload_string() {
        // An empty payload is well-formed at the wire level; whether it is a
        // useful reading is the aggregator's decision.
        let frame = Frame::decode(r#"{"topic":"sala/alertas","payload":"","timestamp":0}"#).unwrap();
        assert_eq!(frame.payload, "");
    }
}
