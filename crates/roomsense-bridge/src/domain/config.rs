//! Bridge configuration types.
//!
//! [`BridgeConfig`] is the single source of truth for all runtime settings.
//! It can be constructed from CLI arguments (preferred for production) or
//! from sensible defaults (useful for local development and tests).
//!
//! Keeping configuration as a plain struct — no global state, no environment
//! variable reads inside the domain — makes the bridge easy to embed in tests.
//! The infrastructure layer is responsible for populating the struct from CLI
//! args or environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// All runtime configuration for the telemetry bridge.
///
/// Build this struct once at startup (via CLI args or defaults) and then
/// wrap it in an `Arc` so it can be shared cheaply across all session tasks.
///
/// # Example
///
/// ```rust
/// use roomsense_bridge::domain::BridgeConfig;
///
/// // Defaults are suitable for local development:
/// let cfg = BridgeConfig::default();
/// assert_eq!(cfg.ws_bind_addr.port(), 8080);
/// ```
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// The address and port the WebSocket server binds to.
    ///
    /// `0.0.0.0` accepts connections from any network interface (LAN +
    /// localhost).  Set to `127.0.0.1` to accept only local connections.
    pub ws_bind_addr: SocketAddr,

    /// Hostname or IP address of the MQTT broker.
    ///
    /// Kept as a string rather than a `SocketAddr` because rumqttc resolves
    /// hostnames itself (a Mosquitto container is often addressed by name).
    pub broker_host: String,

    /// TCP port of the MQTT broker (1883 for plain MQTT).
    pub broker_port: u16,

    /// Fixed delay before an upstream session retries a lost broker
    /// connection.  Retries repeat at this interval for as long as the
    /// owning browser session is alive.
    pub reconnect_interval: Duration,

    /// MQTT keep-alive interval advertised to the broker.
    pub keep_alive: Duration,
}

impl Default for BridgeConfig {
    /// Returns a `BridgeConfig` suitable for local development without any
    /// external configuration.
    ///
    /// | Field              | Default       |
    /// |--------------------|---------------|
    /// | ws_bind_addr       | `0.0.0.0:8080`|
    /// | broker_host        | `127.0.0.1`   |
    /// | broker_port        | `1883`        |
    /// | reconnect_interval | 5 seconds     |
    /// | keep_alive         | 15 seconds    |
    fn default() -> Self {
        Self {
            // The `.parse().unwrap()` call here is safe because this is a
            // compile-time-known valid socket address string.
            ws_bind_addr: "0.0.0.0:8080".parse().unwrap(),
            broker_host: "127.0.0.1".to_string(),
            broker_port: 1883,
            reconnect_interval: Duration::from_secs(5),
            keep_alive: Duration::from_secs(15),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ws_port_is_8080() {
        // Arrange / Act
        let cfg = BridgeConfig::default();
        // Assert
        assert_eq!(cfg.ws_bind_addr.port(), 8080);
    }

    #[test]
    fn test_default_broker_is_local_mosquitto() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.broker_host, "127.0.0.1");
        assert_eq!(cfg.broker_port, 1883);
    }

    #[test]
    fn test_default_reconnect_interval_is_5s() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.reconnect_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_config_can_be_cloned() {
        // Cloneability is required so an Arc<BridgeConfig> can be shared
        // across session tasks.
        let cfg = BridgeConfig::default();
        let cloned = cfg.clone();
        assert_eq!(cfg.ws_bind_addr, cloned.ws_bind_addr);
        assert_eq!(cfg.broker_host, cloned.broker_host);
    }

    #[test]
    fn test_config_custom_values() {
        let cfg = BridgeConfig {
            ws_bind_addr: "127.0.0.1:9000".parse().unwrap(),
            broker_host: "mosquitto".to_string(),
            broker_port: 8883,
            reconnect_interval: Duration::from_secs(10),
            keep_alive: Duration::from_secs(30),
        };
        assert_eq!(cfg.ws_bind_addr.port(), 9000);
        assert_eq!(cfg.broker_host, "mosquitto");
        assert_eq!(cfg.broker_port, 8883);
        assert_eq!(cfg.reconnect_interval, Duration::from_secs(10));
    }
}
