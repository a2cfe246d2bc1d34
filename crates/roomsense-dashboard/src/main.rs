//! RoomSense dashboard consumer — entry point.
//!
//! Wires together the bridge connection, the telemetry aggregator, and the
//! shared state surface, then runs the Tokio async event loop.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ DashboardState::new()      -- initialises shared state
//!  └─ BridgeConnection::start()  -- WebSocket reconnect loop
//!  └─ event dispatch loop
//!       ├─ Connected / Disconnected -> connection status
//!       └─ FrameReceived            -> TelemetryState::apply
//! ```
//!
//! # Event dispatch loop
//!
//! The `while let Some(event) = events.recv().await` loop is the heart of
//! the consumer.  It processes one connection event at a time, so the
//! aggregator never sees concurrent mutations — frames fold into the state
//! in exactly the order the bridge relayed them.
//!
//! # Rendering
//!
//! Rendering is out of scope for this binary; it logs snapshot summaries so
//! the consumer is usable headless.  A rendering layer embeds the library
//! crate and polls [`DashboardState::snapshot`] instead.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use roomsense_dashboard::infrastructure::network::{
    BridgeConnection, BridgeConnectionConfig, ConnectionEvent,
};
use roomsense_dashboard::infrastructure::storage::{load_or_default, DashboardSettings};
use roomsense_dashboard::infrastructure::ui_bridge::{DashboardConnectionStatus, DashboardState};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// RoomSense dashboard consumer.
///
/// Connects to a RoomSense telemetry bridge, aggregates the relayed frames,
/// and logs snapshot summaries.
#[derive(Debug, Parser)]
#[command(
    name = "roomsense-dashboard",
    about = "Headless RoomSense dashboard consumer",
    version
)]
struct Cli {
    /// WebSocket URL of the telemetry bridge.
    ///
    /// Overrides the settings file when given.
    #[arg(long, env = "ROOMSENSE_BRIDGE_URL")]
    bridge_url: Option<String>,

    /// Fixed delay in seconds between reconnect attempts.
    ///
    /// Overrides the settings file when given.
    #[arg(long, env = "ROOMSENSE_RECONNECT_INTERVAL")]
    reconnect_interval: Option<u64>,

    /// Path to a TOML settings file.
    ///
    /// Missing file is not an error — defaults apply.
    #[arg(long, env = "ROOMSENSE_CONFIG")]
    config: Option<PathBuf>,
}

/// Merges CLI flags over file settings: a flag that was given wins, every
/// other value comes from the file (or its defaults).
fn effective_settings(cli: &Cli, file: DashboardSettings) -> DashboardSettings {
    DashboardSettings {
        bridge_url: cli.bridge_url.clone().unwrap_or(file.bridge_url),
        reconnect_interval_secs: cli
            .reconnect_interval
            .unwrap_or(file.reconnect_interval_secs),
        log_level: file.log_level,
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Settings file first — its log level seeds the subscriber when RUST_LOG
    // is absent.
    let file_settings = match &cli.config {
        Some(path) => load_or_default(path)?,
        None => DashboardSettings::default(),
    };
    let settings = effective_settings(&cli, file_settings);

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .init();

    info!("RoomSense dashboard starting — bridge={}", settings.bridge_url);

    // Shared state read by whatever renders.
    let state = DashboardState::new();

    // Shutdown flag.
    let running = Arc::new(AtomicBool::new(true));

    // ── Bridge connection ─────────────────────────────────────────────────────
    let connection = Arc::new(BridgeConnection::new(BridgeConnectionConfig {
        bridge_url: settings.bridge_url.clone(),
        reconnect_interval: Duration::from_secs(settings.reconnect_interval_secs),
    }));
    let mut events = Arc::clone(&connection).start(Arc::clone(&running)).await;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // ── Main event dispatch loop ──────────────────────────────────────────────
    info!("RoomSense dashboard ready. Connecting to bridge…");

    while let Some(event) = events.recv().await {
        if !running.load(Ordering::Relaxed) {
            break;
        }

        match event {
            ConnectionEvent::Connected => {
                info!("bridge connection established");
                state
                    .set_connection_status(DashboardConnectionStatus::Connected)
                    .await;
            }

            ConnectionEvent::Disconnected => {
                warn!("bridge connection lost; reconnect in progress");
                state
                    .set_connection_status(DashboardConnectionStatus::Disconnected)
                    .await;
            }

            ConnectionEvent::FrameReceived(frame) => {
                debug!("frame: {} = {}", frame.topic, frame.payload);
                let is_alert = frame.topic == roomsense_core::domain::topics::ALERTS;
                state.apply_frame(&frame).await;

                // Alerts are worth surfacing even headless.
                if is_alert {
                    info!("alert: {}", frame.payload);
                }
            }
        }
    }

    // Teardown: no reconnect may fire past this point.
    connection.shutdown().await;

    let snapshot = state.snapshot().await;
    info!(
        "RoomSense dashboard stopped (last update: {})",
        snapshot.telemetry.last_update.as_deref().unwrap_or("never")
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_leave_overrides_unset() {
        let cli = Cli::parse_from(["roomsense-dashboard"]);
        assert!(cli.bridge_url.is_none());
        assert!(cli.reconnect_interval.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_bridge_url_override() {
        let cli = Cli::parse_from(["roomsense-dashboard", "--bridge-url", "ws://bridge:8080"]);
        assert_eq!(cli.bridge_url.as_deref(), Some("ws://bridge:8080"));
    }

    #[test]
    fn test_effective_settings_prefers_cli_over_file() {
        let cli = Cli::parse_from([
            "roomsense-dashboard",
            "--bridge-url",
            "ws://cli:1",
            "--reconnect-interval",
            "9",
        ]);
        let file = DashboardSettings {
            bridge_url: "ws://file:2".to_string(),
            reconnect_interval_secs: 30,
            log_level: "debug".to_string(),
        };

        let settings = effective_settings(&cli, file);

        assert_eq!(settings.bridge_url, "ws://cli:1");
        assert_eq!(settings.reconnect_interval_secs, 9);
        // Values without a CLI counterpart come from the file.
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_effective_settings_falls_back_to_file_values() {
        let cli = Cli::parse_from(["roomsense-dashboard"]);
        let file = DashboardSettings {
            bridge_url: "ws://file:2".to_string(),
            reconnect_interval_secs: 30,
            log_level: "warn".to_string(),
        };

        let settings = effective_settings(&cli, file);

        assert_eq!(settings.bridge_url, "ws://file:2");
        assert_eq!(settings.reconnect_interval_secs, 30);
    }
}
