//! roomsense-dashboard library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the dashboard consumer do? (for beginners)
//!
//! The *dashboard* is the consuming side of the telemetry bridge.  It keeps
//! a WebSocket connection to the bridge alive, decodes the JSON frames the
//! bridge relays, and folds them into an in-memory view of the room: latest
//! value per metric, a bounded history ring for the charts, and a bounded
//! alert queue.
//!
//! The consumer:
//!
//! 1. Connects to the bridge and retries forever on a fixed delay when the
//!    connection drops — the reconnect timer is an explicit, cancellable
//!    handle, never a leaked closure.
//! 2. Decodes each WebSocket text message into a frame; malformed messages
//!    are dropped with a diagnostic, never fatal.
//! 3. Applies each frame to the telemetry state with per-topic parse rules
//!    (a non-numeric temperature never overwrites the last good reading).
//! 4. Exposes a read-only snapshot — the rendering layer only ever sees the
//!    connection status and immutable snapshot values.

/// Application layer: the telemetry state reducer.
pub mod application;

/// Infrastructure layer: bridge connection, settings storage, and UI bridge.
pub mod infrastructure;
