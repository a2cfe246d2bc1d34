//! Infrastructure layer for roomsense-bridge.
//!
//! The infrastructure layer handles all I/O: accepting WebSocket connections
//! from browsers and holding MQTT sessions against the broker.
//!
//! # Responsibilities
//!
//! - Binding a TCP listener for browser WebSocket connections
//! - Performing the WebSocket HTTP upgrade handshake
//! - Opening and managing MQTT sessions (one per browser connection)
//! - Spawning per-session Tokio tasks and tearing both halves down together
//! - Tracking the live session set
//! - Handling the graceful shutdown signal
//!
//! # What does NOT belong here?
//!
//! - Session lifecycle rules and frame translation (application layer)
//! - The frame wire type and topic table (roomsense-core)
//! - Configuration parsing (done in `main.rs`)

pub mod upstream;
pub mod ws_server;

// Re-export the primary entry points so `main.rs` can call them concisely.
pub use ws_server::run_server;
