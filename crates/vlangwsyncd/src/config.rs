//! Daemon configuration, loaded once at startup from a YAML file.

use crate::error::{SyncError, SyncResult};
use serde::Deserialize;
use std::path::Path;

/// Default seconds between sync cycles.
const DEFAULT_INTERVAL_SECS: u64 = 5;

/// Top-level daemon configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Catalog API settings.
    pub catalog: CatalogConfig,
    /// Agent loop settings.
    #[serde(default)]
    pub agent: AgentConfig,
    /// Managed devices.
    pub devices: Vec<DeviceConfig>,
    /// Optional error-telemetry reporting.
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

/// Where to reach the source-of-truth catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Base address, e.g. "http://ipam.example.net".
    pub address: String,
}

/// Agent loop settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AgentConfig {
    /// Seconds to wait between completed sync cycles.
    pub interval_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

/// One managed device.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Device family; selects the CLI adapter.
    pub kind: DeviceKind,
    /// Device address (SSH, port 22).
    pub address: String,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Privileged-mode escalation secret.
    pub enable_secret: String,
}

/// Supported device families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Cisco Catalyst 4948 family (IOS CLI dialect).
    Catalyst4948,
}

/// Optional error-telemetry reporting settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Ingest endpoint receiving error events.
    pub endpoint: String,
    /// Fraction of error events reported, in [0.0, 1.0].
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
}

fn default_sample_rate() -> f64 {
    1.0
}

impl Config {
    /// Loads and validates configuration from a YAML file.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SyncError::config(path.display().to_string(), format!("cannot read file: {}", e))
        })?;
        let config: Config = serde_yaml::from_str(&raw)
            .map_err(|e| SyncError::config(path.display().to_string(), e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> SyncResult<()> {
        if self.catalog.address.trim().is_empty() {
            return Err(SyncError::config("catalog.address", "must not be empty"));
        }
        if self.agent.interval_secs == 0 {
            return Err(SyncError::config("agent.interval_secs", "must be at least 1"));
        }
        for (index, device) in self.devices.iter().enumerate() {
            if device.address.trim().is_empty() {
                return Err(SyncError::config(
                    format!("devices[{}].address", index),
                    "must not be empty",
                ));
            }
        }
        if let Some(telemetry) = &self.telemetry {
            if !(0.0..=1.0).contains(&telemetry.sample_rate) {
                return Err(SyncError::config(
                    "telemetry.sample_rate",
                    "must be within [0.0, 1.0]",
                ));
            }
        }
        Ok(())
    }
}
