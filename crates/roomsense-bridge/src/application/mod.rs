//! Application layer for roomsense-bridge.
//!
//! The application layer orchestrates the business logic: it knows *what* to
//! do, but delegates *how* to do it to the infrastructure layer.
//!
//! # Responsibilities
//!
//! - Tracking the lifecycle of one bridge session as an explicit state machine
//! - Translating raw MQTT publishes into the JSON [`roomsense_core::Frame`]
//! - Defining the `RelayError` type for application-level failures
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or listening for connections (that is infrastructure)
//! - Tokio task spawning (that happens in the infrastructure layer)
//! - WebSocket framing (handled by tokio-tungstenite)

pub mod session;

// Re-export so callers can write `application::frame_from_publish`.
pub use session::{frame_from_publish, BridgeSession, RelayError, SessionState};
