//! Shared state surface between the consumer loop and a rendering layer.
//!
//! Rendering (cards, charts, layout) lives outside this crate.  Whatever
//! renders — a terminal view, a desktop shell, an HTTP endpoint — only ever
//! sees two things from here:
//!
//! 1. The connection status.
//! 2. An immutable [`DashboardSnapshot`] of the telemetry state.
//!
//! Nothing else escapes: transport errors, reconnect scheduling, and parse
//! failures are all contained below this surface.
//!
//! # Async Mutex vs std Mutex
//!
//! `DashboardState` uses `tokio::sync::Mutex` (not `std::sync::Mutex`)
//! because it is touched from async context.  Holding a `std::sync::Mutex`
//! guard across an `.await` point would block the Tokio thread pool; the
//! async mutex suspends the task instead.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use roomsense_core::Frame;

use crate::application::{TelemetrySnapshot, TelemetryState};

// ── Connection status ─────────────────────────────────────────────────────────

/// Connection status of the consumer as seen by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DashboardConnectionStatus {
    /// Not connected; a reconnect attempt is pending.
    Disconnected,
    /// Actively trying to reach the bridge.
    Connecting,
    /// Receiving frames from the bridge.
    Connected,
}

// ── Shared state ──────────────────────────────────────────────────────────────

/// Runtime state shared between the dispatch loop and snapshot readers.
pub struct DashboardState {
    /// The current connection state reported to the rendering layer.
    pub connection_status: Mutex<DashboardConnectionStatus>,
    /// The aggregated telemetry view.
    pub telemetry: Mutex<TelemetryState>,
}

impl DashboardState {
    /// Creates a new state: disconnected, no telemetry yet.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            connection_status: Mutex::new(DashboardConnectionStatus::Connecting),
            telemetry: Mutex::new(TelemetryState::new()),
        })
    }

    /// Updates the connection status.
    pub async fn set_connection_status(&self, status: DashboardConnectionStatus) {
        *self.connection_status.lock().await = status;
    }

    /// Folds one frame into the telemetry state.
    pub async fn apply_frame(&self, frame: &Frame) {
        self.telemetry.lock().await.apply(frame);
    }

    /// Produces the read-only snapshot handed to the rendering layer.
    ///
    /// Each lock is held only while reading, so a periodic snapshot poll
    /// never stalls the dispatch loop for long.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        let status = *self.connection_status.lock().await;
        let telemetry = self.telemetry.lock().await.snapshot();

        DashboardSnapshot {
            connected: status == DashboardConnectionStatus::Connected,
            status,
            telemetry,
        }
    }
}

// ── Snapshot DTO ──────────────────────────────────────────────────────────────

/// Full status snapshot returned to the rendering layer.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// `true` while the bridge connection is up.
    pub connected: bool,
    /// The full connection status behind the boolean.
    pub status: DashboardConnectionStatus,
    /// The aggregated telemetry view.
    pub telemetry: TelemetrySnapshot,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
