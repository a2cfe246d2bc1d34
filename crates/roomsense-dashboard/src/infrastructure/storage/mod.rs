//! Settings persistence for the dashboard consumer.

pub mod config;

pub use config::{load_or_default, DashboardSettings, SettingsError};
