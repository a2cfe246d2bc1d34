//! Comfort ranges for the numeric metrics.
//!
//! The sensor firmware and the dashboard agree on the same ideal ranges: a
//! reading inside the comfort band is `Normal`, near its edge is `Warning`,
//! and outside the hard band is `Danger`.  The rendering layer maps these
//! directly to card colours; the firmware uses the same bands to decide when
//! to publish an alert.

use serde::{Deserialize, Serialize};

use crate::domain::topics;

// ── Status ────────────────────────────────────────────────────────────────────

/// Classification of a single reading against its comfort range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Normal,
    Warning,
    Danger,
}

// ── Ranges ────────────────────────────────────────────────────────────────────

/// Comfort band for one numeric metric.
///
/// `None` bounds are open: the light range, for example, has no upper limit
/// and no danger band at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdealRange {
    /// Readings below this are at least `Warning`.
    pub warn_low: Option<f64>,
    /// Readings above this are at least `Warning`.
    pub warn_high: Option<f64>,
    /// Readings below this are `Danger`.
    pub danger_low: Option<f64>,
    /// Readings above this are `Danger`.
    pub danger_high: Option<f64>,
}

/// Comfort band for room temperature: 21–24 °C comfortable, 20–25 °C hard.
pub const TEMPERATURE_RANGE: IdealRange = IdealRange {
    warn_low: Some(21.0),
    warn_high: Some(24.0),
    danger_low: Some(20.0),
    danger_high: Some(25.0),
};

/// Comfort band for relative humidity: 45–55 % comfortable, 40–60 % hard.
pub const HUMIDITY_RANGE: IdealRange = IdealRange {
    warn_low: Some(45.0),
    warn_high: Some(55.0),
    danger_low: Some(40.0),
    danger_high: Some(60.0),
};

/// Comfort band for light level: below 30 % warrants switching lights on.
/// There is no danger band for light.
pub const LIGHT_RANGE: IdealRange = IdealRange {
    warn_low: Some(30.0),
    warn_high: None,
    danger_low: None,
    danger_high: None,
};

impl IdealRange {
    /// Classifies a reading against this range.
    ///
    /// Bounds are exclusive on the comfortable side: a reading exactly on a
    /// boundary counts as inside the band.
    pub fn status(&self, value: f64) -> MetricStatus {
        let below = |bound: Option<f64>| bound.is_some_and(|b| value < b);
        let above = |bound: Option<f64>| bound.is_some_and(|b| value > b);

        if below(self.danger_low) || above(self.danger_high) {
            MetricStatus::Danger
        } else if below(self.warn_low) || above(self.warn_high) {
            MetricStatus::Warning
        } else {
            MetricStatus::Normal
        }
    }
}

/// Returns the status of a reading for a known numeric topic, or `None` for
/// topics that have no comfort band.
pub fn status_for(topic: &str, value: f64) -> Option<MetricStatus> {
    match topic {
        topics::TEMPERATURE => Some(TEMPERATURE_RANGE.status(value)),
        topics::HUMIDITY => Some(HUMIDITY_RANGE.status(value)),
        topics::LIGHT => Some(LIGHT_RANGE.status(value)),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_in_comfort_band_is_normal() {
        assert_eq!(TEMPERATURE_RANGE.status(22.5), MetricStatus::Normal);
    }

    #[test]
    fn test_temperature_near_edge_is_warning() {
        assert_eq!(TEMPERATURE_RANGE.status(20.5), MetricStatus::Warning);
        assert_eq!(TEMPERATURE_RANGE.status(24.5), MetricStatus::Warning);
    }

    #[test]
    fn test_temperature_outside_hard_band_is_danger() {
        assert_eq!(TEMPERATURE_RANGE.status(19.0), MetricStatus::Danger);
        assert_eq!(TEMPERATURE_RANGE.status(26.0), MetricStatus::Danger);
    }

    #[test]
    fn test_temperature_boundary_counts_as_inside() {
        // Exactly 21 °C and 24 °C are comfortable; exactly 20 °C and 25 °C
        // are warning, not danger.
        assert_eq!(TEMPERATURE_RANGE.status(21.0), MetricStatus::Normal);
        assert_eq!(TEMPERATURE_RANGE.status(24.0), MetricStatus::Normal);
        assert_eq!(TEMPERATURE_RANGE.status(20.0), MetricStatus::Warning);
        assert_eq!(TEMPERATURE_RANGE.status(25.0), MetricStatus::Warning);
    }

    #[test]
    fn test_humidity_bands() {
        assert_eq!(HUMIDITY_RANGE.status(50.0), MetricStatus::Normal);
        assert_eq!(HUMIDITY_RANGE.status(42.0), MetricStatus::Warning);
        assert_eq!(HUMIDITY_RANGE.status(35.0), MetricStatus::Danger);
        assert_eq!(HUMIDITY_RANGE.status(65.0), MetricStatus::Danger);
    }

    #[test]
    fn test_light_has_no_danger_band() {
        assert_eq!(LIGHT_RANGE.status(80.0), MetricStatus::Normal);
        assert_eq!(LIGHT_RANGE.status(10.0), MetricStatus::Warning);
        // Even zero light is only a warning.
        assert_eq!(LIGHT_RANGE.status(0.0), MetricStatus::Warning);
    }

    #[test]
    fn test_status_for_known_numeric_topics() {
        assert_eq!(
            super::status_for(topics::TEMPERATURE, 22.0),
            Some(MetricStatus::Normal)
        );
        assert_eq!(
            super::status_for(topics::LIGHT, 10.0),
            Some(MetricStatus::Warning)
        );
    }

    #[test]
    fn test_status_for_non_numeric_topic_is_none() {
        assert_eq!(super::status_for(topics::OCCUPANCY, 1.0), None);
        assert_eq!(super::status_for("sala/outro", 1.0), None);
    }

    #[test]
    fn test_metric_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MetricStatus::Warning).unwrap(),
            "\"warning\""
        );
    }
}
