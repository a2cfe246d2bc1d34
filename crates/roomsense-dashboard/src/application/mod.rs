//! Application layer: use cases for the dashboard consumer.
//!
//! The only use case is folding the frame stream into the telemetry state.
//! Everything here is pure with respect to I/O — no sockets, no clocks
//! beyond the timestamps the frames already carry — which keeps the reducer
//! unit-testable with plain frames.

pub mod aggregate;

pub use aggregate::{
    HistoryPoint, MetricSeries, MetricSnapshot, TelemetrySnapshot, TelemetryState, ALERT_CAP,
    HISTORY_CAP,
};
