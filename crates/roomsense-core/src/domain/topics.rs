//! The fixed telemetry topic table.
//!
//! The set of topics is configuration shared by every component — the sensor
//! publisher, the bridge, and the dashboard all agree on it at build time.
//! Nothing in the system discovers topics at runtime, and per-connection
//! dynamic topic strings are deliberately not supported.
//!
//! Topic names keep the publisher's original Portuguese vocabulary
//! (`sala` = room), because they are a wire contract with deployed firmware.

use serde::{Deserialize, Serialize};

// ── Topic names ───────────────────────────────────────────────────────────────

/// Room temperature in °C, published as a decimal string.
pub const TEMPERATURE: &str = "sala/temperatura";
/// Relative humidity in %, published as a decimal string.
pub const HUMIDITY: &str = "sala/umidade";
/// Light level in %, published as a decimal string.
pub const LIGHT: &str = "sala/luminosidade";
/// Motion detection state, e.g. `DETECTADA`.
pub const PRESENCE: &str = "sala/presenca";
/// Room occupancy state: `OCUPADA` or `VAZIA`.
pub const OCCUPANCY: &str = "sala/ocupacao";
/// Air-conditioning suggestion: `LIGAR` or `DESLIGAR`.
pub const AC_SUGGESTION: &str = "sala/sugestao_ac";
/// Free-text alert messages.
pub const ALERTS: &str = "sala/alertas";
/// Number of people currently in the room, published as an integer string.
pub const PEOPLE_COUNT: &str = "sala/pessoas";
/// Someone entered the room (edge event, payload `DETECTADA`).
pub const ENTRY: &str = "sala/entrada";
/// Someone left the room (edge event, payload `DETECTADA`).
pub const EXIT: &str = "sala/saida";
/// Publisher liveness announcements, free text.
pub const DEVICE_STATUS: &str = "sala/status";

/// The topics the bridge subscribes to for every browser session.
///
/// This is exactly the set the sensor firmware publishes on.
pub const BRIDGE_TOPICS: [&str; 9] = [
    TEMPERATURE,
    HUMIDITY,
    LIGHT,
    OCCUPANCY,
    ALERTS,
    PEOPLE_COUNT,
    ENTRY,
    EXIT,
    DEVICE_STATUS,
];

/// All topics the dashboard understands.
///
/// A superset of [`BRIDGE_TOPICS`]: `sala/presenca` and `sala/sugestao_ac`
/// are consumed when a deployment publishes them, even though the bridge's
/// own subscription list does not include them.
pub const DASHBOARD_TOPICS: [&str; 11] = [
    TEMPERATURE,
    HUMIDITY,
    LIGHT,
    PRESENCE,
    OCCUPANCY,
    AC_SUGGESTION,
    ALERTS,
    PEOPLE_COUNT,
    ENTRY,
    EXIT,
    DEVICE_STATUS,
];

// ── Classification ────────────────────────────────────────────────────────────

/// How the aggregator treats a topic's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TopicClass {
    /// Parsed as a floating-point reading; kept in a bounded history ring.
    /// A payload that does not parse (or is not finite) is dropped and the
    /// previous value is kept.
    Numeric,
    /// Passed through as a string; always accepted.
    Categorical,
    /// Prepended to the bounded alert queue; always accepted.
    Alert,
    /// Parsed as an integer count; dropped on parse failure, no history.
    Count,
    /// Logged only; carries no dashboard state.
    Event,
}

/// Returns the class of a known topic, or `None` for topics outside the
/// fixed table.
pub fn classify(topic: &str) -> Option<TopicClass> {
    match topic {
        TEMPERATURE | HUMIDITY | LIGHT => Some(TopicClass::Numeric),
        PRESENCE | OCCUPANCY | AC_SUGGESTION => Some(TopicClass::Categorical),
        ALERTS => Some(TopicClass::Alert),
        PEOPLE_COUNT => Some(TopicClass::Count),
        ENTRY | EXIT | DEVICE_STATUS => Some(TopicClass::Event),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_topics_are_all_classified() {
        for topic in BRIDGE_TOPICS {
            assert!(classify(topic).is_some(), "unclassified topic: {topic}");
        }
    }

    #[test]
    fn test_dashboard_topics_superset_of_bridge_topics() {
        for topic in BRIDGE_TOPICS {
            assert!(
                DASHBOARD_TOPICS.contains(&topic),
                "bridge topic missing from dashboard set: {topic}"
            );
        }
    }

    #[test]
    fn test_numeric_topics_classify_as_numeric() {
        assert_eq!(classify(TEMPERATURE), Some(TopicClass::Numeric));
        assert_eq!(classify(HUMIDITY), Some(TopicClass::Numeric));
        assert_eq!(classify(LIGHT), Some(TopicClass::Numeric));
    }

    #[test]
    fn test_categorical_topics_classify_as_categorical() {
        assert_eq!(classify(PRESENCE), Some(TopicClass::Categorical));
        assert_eq!(classify(OCCUPANCY), Some(TopicClass::Categorical));
        assert_eq!(classify(AC_SUGGESTION), Some(TopicClass::Categorical));
    }

    #[test]
    fn test_alerts_classify_as_alert() {
        assert_eq!(classify(ALERTS), Some(TopicClass::Alert));
    }

    #[test]
    fn test_people_count_classifies_as_count() {
        assert_eq!(classify(PEOPLE_COUNT), Some(TopicClass::Count));
    }

    #[test]
    fn test_unknown_topic_classifies_as_none() {
        assert_eq!(classify("sala/desconhecido"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_bridge_topics_have_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for topic in BRIDGE_TOPICS {
            assert!(seen.insert(topic), "duplicate topic: {topic}");
        }
    }
}
