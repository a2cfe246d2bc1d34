//! Telemetry state aggregation.
//!
//! Folds the decoded frame stream into the dashboard's view of the room: the
//! latest value per metric, a bounded history ring per numeric metric (the
//! chart window), and a bounded most-recent-first alert queue.
//!
//! # Reducer shape
//!
//! [`TelemetryState::apply`] is a plain `(state, frame) → state` reducer.
//! It performs no I/O and reads no clock — history entries are stamped with
//! the timestamp the frame already carries — so every behaviour in this
//! module is testable with hand-built frames.
//!
//! # Parse rules per topic class
//!
//! | class       | rule                           | on failure                 |
//! |-------------|--------------------------------|----------------------------|
//! | numeric     | trimmed `f64` parse, finite    | frame dropped, prior value |
//! |             | values only                    | and history kept           |
//! | categorical | pass-through string            | always accepted            |
//! | alert       | pass-through string, prepended | always accepted            |
//! | count       | trimmed integer parse          | frame dropped              |
//! | event       | logged only                    | always accepted            |
//!
//! Rust's float parser happily accepts the literals `NaN` and `inf`; the
//! finiteness filter exists so a publisher bug can never park a NaN in the
//! latest-value slot or the chart history.

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, warn};

use roomsense_core::domain::ranges;
use roomsense_core::domain::topics::{self, TopicClass};
use roomsense_core::{Frame, MetricStatus};

/// Chart window: maximum history entries kept per numeric metric.
pub const HISTORY_CAP: usize = 20;

/// Maximum alerts kept, most recent first.
pub const ALERT_CAP: usize = 10;

// ── Per-metric series ─────────────────────────────────────────────────────────

/// One point in a metric's history ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    /// Frame timestamp, milliseconds since the Unix epoch.
    pub at_ms: u64,
    /// The accepted reading.
    pub value: f64,
}

/// Latest value and bounded history for one numeric metric.
#[derive(Debug, Default)]
pub struct MetricSeries {
    latest: Option<f64>,
    history: VecDeque<HistoryPoint>,
}

impl MetricSeries {
    /// Records an accepted reading: updates the latest value and appends to
    /// the history ring, evicting the oldest entry past [`HISTORY_CAP`].
    fn record(&mut self, at_ms: u64, value: f64) {
        self.latest = Some(value);
        self.history.push_back(HistoryPoint { at_ms, value });
        if self.history.len() > HISTORY_CAP {
            self.history.pop_front();
        }
    }

    /// The most recent successfully parsed reading, if any.
    pub fn latest(&self) -> Option<f64> {
        self.latest
    }

    /// The history ring, oldest first.
    pub fn history(&self) -> &VecDeque<HistoryPoint> {
        &self.history
    }
}

// ── Telemetry state ───────────────────────────────────────────────────────────

/// The aggregated view of the room, built by folding frames.
#[derive(Debug, Default)]
pub struct TelemetryState {
    temperature: MetricSeries,
    humidity: MetricSeries,
    light: MetricSeries,
    presence: Option<String>,
    occupancy: Option<String>,
    ac_suggestion: Option<String>,
    people_count: Option<u32>,
    alerts: VecDeque<String>,
    last_update_ms: Option<u64>,
}

impl TelemetryState {
    /// Creates an empty state: no readings, no alerts, no last update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one frame into the state.
    ///
    /// Frames on unknown topics and frames that fail their parse rule are
    /// dropped: they change nothing, including the last-update stamp.
    pub fn apply(&mut self, frame: &Frame) {
        let Some(class) = topics::classify(&frame.topic) else {
            debug!("frame on unknown topic {} dropped", frame.topic);
            return;
        };

        match class {
            TopicClass::Numeric => {
                let Some(value) = parse_reading(&frame.payload) else {
                    // The previous value and history stay untouched.
                    warn!(
                        "non-numeric payload {:?} on {} dropped",
                        frame.payload, frame.topic
                    );
                    return;
                };
                let series = match frame.topic.as_str() {
                    topics::TEMPERATURE => &mut self.temperature,
                    topics::HUMIDITY => &mut self.humidity,
                    topics::LIGHT => &mut self.light,
                    // classify() guarantees the three arms above are complete.
                    _ => return,
                };
                series.record(frame.timestamp, value);
            }

            TopicClass::Categorical => {
                let slot = match frame.topic.as_str() {
                    topics::PRESENCE => &mut self.presence,
                    topics::OCCUPANCY => &mut self.occupancy,
                    topics::AC_SUGGESTION => &mut self.ac_suggestion,
                    _ => return,
                };
                *slot = Some(frame.payload.clone());
            }

            TopicClass::Alert => {
                // Most recent first, oldest dropped past the cap.
                self.alerts.push_front(frame.payload.clone());
                self.alerts.truncate(ALERT_CAP);
            }

            TopicClass::Count => {
                let Some(count) = parse_count(&frame.payload) else {
                    warn!(
                        "non-integer payload {:?} on {} dropped",
                        frame.payload, frame.topic
                    );
                    return;
                };
                self.people_count = Some(count);
            }

            TopicClass::Event => {
                // Entry/exit pulses and publisher status carry no dashboard
                // state; surface them in the log stream only.
                debug!("{}: {}", frame.topic, frame.payload);
            }
        }

        // Reached only by accepted frames — drops return early above.
        self.last_update_ms = Some(frame.timestamp);
    }

    /// The temperature series.
    pub fn temperature(&self) -> &MetricSeries {
        &self.temperature
    }

    /// The humidity series.
    pub fn humidity(&self) -> &MetricSeries {
        &self.humidity
    }

    /// The light-level series.
    pub fn light(&self) -> &MetricSeries {
        &self.light
    }

    /// Alerts, most recent first.
    pub fn alerts(&self) -> &VecDeque<String> {
        &self.alerts
    }

    /// Timestamp of the most recent accepted frame.
    pub fn last_update_ms(&self) -> Option<u64> {
        self.last_update_ms
    }

    /// Produces the immutable snapshot handed to the rendering layer.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            temperature: metric_snapshot(&self.temperature, topics::TEMPERATURE),
            humidity: metric_snapshot(&self.humidity, topics::HUMIDITY),
            light: metric_snapshot(&self.light, topics::LIGHT),
            presence: self.presence.clone(),
            occupancy: self.occupancy.clone(),
            ac_suggestion: self.ac_suggestion.clone(),
            people_count: self.people_count,
            alerts: self.alerts.iter().cloned().collect(),
            last_update: self.last_update_ms.and_then(format_time_label),
            last_update_ms: self.last_update_ms,
        }
    }
}

// ── Snapshot DTOs ─────────────────────────────────────────────────────────────

/// Read-only view of one numeric metric.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSnapshot {
    /// The most recent successfully parsed reading.
    pub latest_value: Option<f64>,
    /// Comfort-range classification of the latest reading.
    pub status: Option<MetricStatus>,
    /// Chart history, oldest first, at most [`HISTORY_CAP`] entries.
    pub history: Vec<HistoryPoint>,
}

/// Read-only view of the whole room, serializable for any rendering layer.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub temperature: MetricSnapshot,
    pub humidity: MetricSnapshot,
    pub light: MetricSnapshot,
    pub presence: Option<String>,
    pub occupancy: Option<String>,
    pub ac_suggestion: Option<String>,
    pub people_count: Option<u32>,
    /// Most recent first, at most [`ALERT_CAP`] entries.
    pub alerts: Vec<String>,
    /// Wall-clock `HH:MM:SS` label (UTC) of the last accepted frame.
    pub last_update: Option<String>,
    /// Raw timestamp of the last accepted frame.
    pub last_update_ms: Option<u64>,
}

fn metric_snapshot(series: &MetricSeries, topic: &str) -> MetricSnapshot {
    MetricSnapshot {
        latest_value: series.latest(),
        status: series
            .latest()
            .and_then(|value| ranges::status_for(topic, value)),
        history: series.history().iter().copied().collect(),
    }
}

// ── Parse helpers ─────────────────────────────────────────────────────────────

/// Parses a numeric payload; returns `None` for anything that is not a
/// finite float (including the literals `NaN` and `inf`, which Rust's
/// parser would otherwise accept).
fn parse_reading(payload: &str) -> Option<f64> {
    payload.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a people-count payload; returns `None` for non-integers.
fn parse_count(payload: &str) -> Option<u32> {
    payload.trim().parse::<u32>().ok()
}

/// Formats a millisecond epoch timestamp as an `HH:MM:SS` label (UTC).
fn format_time_label(ms: u64) -> Option<String> {
    let seconds = i64::try_from(ms / 1000).ok()?;
    let datetime = time::OffsetDateTime::from_unix_timestamp(seconds).ok()?;
    datetime
        .format(&time::macros::format_description!(
            "[hour]:[minute]:[second]"
        ))
        .ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
