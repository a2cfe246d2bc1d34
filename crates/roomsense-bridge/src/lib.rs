//! roomsense-bridge library crate.
//!
//! This crate provides an MQTT-to-WebSocket bridge that lets web browsers
//! consume room telemetry published on an MQTT broker.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Browser (JSON frames over WebSocket)
//!         ↕
//! [roomsense-bridge]
//!   ├── domain/           Pure types: BridgeConfig
//!   ├── application/      Session state machine, publish → Frame translation
//!   └── infrastructure/
//!         ├── ws_server/  WebSocket accept loop (tokio-tungstenite)
//!         └── upstream/   MQTT session per browser client (rumqttc)
//!         ↕
//! MQTT broker (sala/* topics, port 1883)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no external dependencies (no I/O, no async, no frameworks).
//! - `application` depends on `domain` and `roomsense-core` only.
//! - `infrastructure` depends on all other layers plus `tokio`, `tungstenite`,
//!   and `rumqttc`.
//!
//! # Session model
//!
//! Every accepted browser connection gets its own upstream MQTT session —
//! sessions never share a broker connection, so one browser disconnecting
//! cannot disturb another.  Either half closing tears down the other half.

/// Domain layer: pure business-logic types (no I/O).
pub mod domain;

/// Application layer: session lifecycle and message translation logic.
pub mod application;

/// Infrastructure layer: WebSocket server and upstream MQTT session.
pub mod infrastructure;
