//! Domain layer for roomsense-bridge.
//!
//! The domain layer contains pure business-logic types that have no
//! dependencies on I/O, networking, or external frameworks.
//!
//! # What belongs in the domain layer?
//!
//! - Configuration structures
//! - Error types that describe business-logic failures
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `WebSocket`, or `rumqttc` types
//! - File I/O or environment variable reading
//! - Anything that could block or fail due to external state

pub mod config;

// Re-export the most commonly needed types at the domain module boundary
// so callers can write `domain::BridgeConfig` instead of the longer path.
pub use config::BridgeConfig;
