//! Domain rules for RoomSense.
//!
//! This module contains pure business logic with no infrastructure
//! dependencies: the static topic table and the comfort-range rules.
//! Code here never imports network libraries, async runtimes, or OS APIs,
//! so it compiles and tests anywhere with no external setup.

/// The fixed telemetry topic table and topic classification.
pub mod topics;

/// Comfort ranges that classify a reading as normal, warning, or danger.
pub mod ranges;
