//! TOML-based settings for the dashboard consumer.
//!
//! A deployment usually points the consumer at its bridge with a small
//! settings file instead of repeating CLI flags:
//!
//! ```toml
//! bridge_url = "ws://10.0.0.5:8080"
//! reconnect_interval_secs = 5
//! log_level = "info"
//! ```
//!
//! # Serde default values
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return
//! value of `some_fn()` when the field is absent from the TOML file.  This
//! lets a settings file carry only the values it overrides, and lets old
//! files keep working when new fields are added.
//!
//! Telemetry itself is never persisted — only these operator settings live
//! on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error type ────────────────────────────────────────────────────────────────

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Settings schema ───────────────────────────────────────────────────────────

/// Operator settings for the dashboard consumer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSettings {
    /// WebSocket URL of the telemetry bridge.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,

    /// Fixed delay in seconds between reconnect attempts.
    #[serde(default = "default_reconnect_secs")]
    pub reconnect_interval_secs: u64,

    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`,
    /// `"trace"`.  Overridden by the `RUST_LOG` environment variable.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            bridge_url: default_bridge_url(),
            reconnect_interval_secs: default_reconnect_secs(),
            log_level: default_log_level(),
        }
    }
}

fn default_bridge_url() -> String {
    "ws://127.0.0.1:8080".to_string()
}

fn default_reconnect_secs() -> u64 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Loads settings from `path`, falling back to defaults when the file does
/// not exist (first run).
///
/// # Errors
///
/// Returns [`SettingsError::Io`] for I/O failures other than a missing file
/// and [`SettingsError::Parse`] for malformed TOML.  A malformed file is an
/// error rather than a silent fallback — an operator who wrote a settings
/// file wants to know it was ignored.
pub fn load_or_default(path: &Path) -> Result<DashboardSettings, SettingsError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            return Ok(DashboardSettings::default());
        }
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    Ok(toml::from_str(&text)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
