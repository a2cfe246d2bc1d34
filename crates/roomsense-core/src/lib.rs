//! # roomsense-core
//!
//! Shared library for RoomSense containing the frame wire format, the static
//! telemetry topic table, and the comfort-range classification rules.
//!
//! This crate is used by both the bridge and the dashboard. It has zero
//! dependencies on async runtimes, network sockets, or OS APIs.
//!
//! # Architecture overview (for beginners)
//!
//! RoomSense streams environmental readings (temperature, humidity, light,
//! occupancy, alerts) from a sensor publisher to browser dashboards.  Browsers
//! cannot open raw MQTT connections, so a bridge process terminates WebSocket
//! connections on one side and holds an MQTT session on the other, relaying
//! each topic message as one JSON frame.
//!
//! This crate (`roomsense-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – How frames travel over the WebSocket link.  A [`Frame`]
//!   is one topic message: `{"topic":…,"payload":…,"timestamp":…}`, encoded
//!   and decoded as a single JSON object per WebSocket text message.
//!
//! - **`domain`** – Pure business rules with no I/O.  The telemetry topic
//!   table (a fixed, enumerated set — topics are configuration, never
//!   discovered at runtime) and the comfort ranges that classify a reading as
//!   normal, warning, or danger.

// Declare the two top-level modules.  Rust will look for each in a
// subdirectory with the same name (e.g., src/protocol/mod.rs).
pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `roomsense_core::Frame` instead of `roomsense_core::protocol::frame::Frame`.
pub use domain::ranges::{IdealRange, MetricStatus};
pub use domain::topics::TopicClass;
pub use protocol::frame::{now_ms, Frame, FrameError};
