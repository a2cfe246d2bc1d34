//! RoomSense telemetry bridge — entry point.
//!
//! This binary accepts WebSocket connections from dashboard browsers and
//! relays room telemetry from an MQTT broker to each of them as JSON frames.
//!
//! # Why a separate bridge process?
//!
//! Web browsers can only communicate over HTTP/WebSocket — they cannot open
//! raw TCP connections to an MQTT broker.  This bridge holds the MQTT side
//! on the browser's behalf: every accepted WebSocket connection gets its own
//! broker session subscribed to the fixed `sala/*` topic set, and every
//! inbound topic message is forwarded as one JSON frame.
//!
//! # Usage
//!
//! ```text
//! roomsense-bridge [OPTIONS]
//!
//! Options:
//!   --ws-port            <PORT>  WebSocket listener port [default: 8080]
//!   --ws-bind            <ADDR>  WebSocket bind address [default: 0.0.0.0]
//!   --broker-host        <HOST>  MQTT broker hostname or IP [default: 127.0.0.1]
//!   --broker-port        <PORT>  MQTT broker port [default: 1883]
//!   --reconnect-interval <SECS>  Upstream reconnect delay [default: 5]
//!   --keep-alive         <SECS>  MQTT keep-alive interval [default: 15]
//! ```
//!
//! # Environment variable overrides
//!
//! The CLI defaults can also be overridden with environment variables.
//! CLI args take precedence when both are present.
//!
//! | Variable                       | Default     | Description                |
//! |--------------------------------|-------------|----------------------------|
//! | `ROOMSENSE_WS_PORT`            | `8080`      | WebSocket listener port    |
//! | `ROOMSENSE_WS_BIND`            | `0.0.0.0`   | WebSocket bind address     |
//! | `ROOMSENSE_BROKER_HOST`        | `127.0.0.1` | MQTT broker host           |
//! | `ROOMSENSE_BROKER_PORT`        | `1883`      | MQTT broker port           |
//! | `ROOMSENSE_RECONNECT_INTERVAL` | `5`         | Reconnect delay (secs)     |
//! | `ROOMSENSE_KEEP_ALIVE`         | `15`        | MQTT keep-alive (secs)     |
//!
//! # Architecture overview
//!
//! ```text
//! Dashboard browser  (JSON frames over WebSocket)
//!       ↕
//! roomsense-bridge  ← this process
//!   domain/          BridgeConfig
//!   application/     Session state machine, publish → Frame
//!   infrastructure/
//!     ws_server/     Accept WebSocket connections
//!     upstream/      MQTT session per browser client
//!       ↕
//! MQTT broker  (sala/* topics, port 1883)
//! ```

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roomsense_bridge::domain::BridgeConfig;
use roomsense_bridge::infrastructure::run_server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// RoomSense telemetry bridge.
///
/// Accepts WebSocket connections from dashboard browsers and relays MQTT
/// topic messages to each of them as JSON frames.
///
/// The `#[derive(Parser)]` macro from `clap` generates the argument parser
/// automatically from the struct fields and their `#[arg(...)]` attributes.
#[derive(Debug, Parser)]
#[command(
    name = "roomsense-bridge",
    about = "MQTT-to-WebSocket telemetry bridge for RoomSense dashboards",
    version
)]
struct Cli {
    /// TCP port for the WebSocket server to listen on.
    ///
    /// Dashboards connect to this port via WebSocket (ws://host:PORT).
    #[arg(long, default_value_t = 8080, env = "ROOMSENSE_WS_PORT")]
    ws_port: u16,

    /// IP address to bind the WebSocket server to.
    ///
    /// Use `0.0.0.0` to accept connections from any network interface (LAN +
    /// localhost), or `127.0.0.1` to accept only local connections.
    #[arg(long, default_value = "0.0.0.0", env = "ROOMSENSE_WS_BIND")]
    ws_bind: String,

    /// Hostname or IP address of the MQTT broker.
    ///
    /// When the bridge and broker run on the same machine, use `127.0.0.1`.
    /// With a containerised Mosquitto, this is usually the service name.
    #[arg(long, default_value = "127.0.0.1", env = "ROOMSENSE_BROKER_HOST")]
    broker_host: String,

    /// TCP port of the MQTT broker.
    #[arg(long, default_value_t = 1883, env = "ROOMSENSE_BROKER_PORT")]
    broker_port: u16,

    /// Fixed delay in seconds before an upstream session retries a lost
    /// broker connection.  Retries repeat at this interval for as long as
    /// the owning browser session is alive.
    #[arg(long, default_value_t = 5, env = "ROOMSENSE_RECONNECT_INTERVAL")]
    reconnect_interval: u64,

    /// MQTT keep-alive interval in seconds.
    #[arg(long, default_value_t = 15, env = "ROOMSENSE_KEEP_ALIVE")]
    keep_alive: u64,
}

impl Cli {
    /// Converts the parsed CLI arguments into a [`BridgeConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if `--ws-bind` is not a valid IP address or the
    /// resulting socket address string cannot be parsed.  The broker host is
    /// deliberately *not* parsed here — rumqttc resolves hostnames itself.
    fn into_bridge_config(self) -> anyhow::Result<BridgeConfig> {
        let ws_bind_addr: SocketAddr = format!("{}:{}", self.ws_bind, self.ws_port)
            .parse()
            .with_context(|| {
                format!(
                    "invalid WebSocket bind address: '{}:{}'",
                    self.ws_bind, self.ws_port
                )
            })?;

        Ok(BridgeConfig {
            ws_bind_addr,
            broker_host: self.broker_host,
            broker_port: self.broker_port,
            reconnect_interval: Duration::from_secs(self.reconnect_interval),
            keep_alive: Duration::from_secs(self.keep_alive),
        })
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// The `#[tokio::main]` attribute sets up the Tokio multi-threaded async
/// runtime.  All async tasks (WebSocket sessions, MQTT pumps, reconnect
/// delays) run on this runtime's thread pool.
///
/// # What happens at startup
///
/// 1. `tracing_subscriber` is initialised; the log level is controlled by
///    the `RUST_LOG` environment variable (e.g., `RUST_LOG=debug`).
/// 2. CLI arguments are parsed with `clap` into a [`Cli`] struct.
/// 3. A [`BridgeConfig`] is constructed from the CLI arguments.
/// 4. A Ctrl+C handler is spawned; it clears a shared `AtomicBool` when the
///    user interrupts the process.
/// 5. [`run_server`] binds the WebSocket port and accepts dashboard
///    connections until the shutdown flag is cleared.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Parse CLI arguments ───────────────────────────────────────────────────
    let cli = Cli::parse();
    let config = cli.into_bridge_config()?;

    info!(
        "RoomSense telemetry bridge starting — ws={}, broker={}:{}",
        config.ws_bind_addr, config.broker_host, config.broker_port
    );

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    //
    // The accept loop in `run_server` checks this flag every 200 ms and
    // exits cleanly once it is cleared.
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C — initiating graceful shutdown");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    // ── Main server loop ──────────────────────────────────────────────────────
    run_server(config, running).await?;

    info!("RoomSense telemetry bridge stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
