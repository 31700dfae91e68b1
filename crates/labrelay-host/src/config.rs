//! Host configuration loading

use anyhow::{Context, Result};
use labrelay_core::DeviceRegistry;
use labrelay_dispatch::{DispatchConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Host-side configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub dispatch: DispatchSection,
    #[serde(default)]
    pub audio: AudioConfig,
    /// Device table; the reference wiring when absent
    #[serde(default, rename = "device")]
    pub devices: Vec<labrelay_core::DeviceEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Controller address (`host` or `host:port`)
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    labrelay_dispatch::DEFAULT_CONTROLLER.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchSection {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Attempts per request, including the first
    #[serde(default = "default_budget")]
    pub retry_budget: u32,
    /// Backoff before the second attempt, doubling per retry
    #[serde(default = "default_backoff")]
    pub backoff_ms: u64,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            retry_budget: default_budget(),
            backoff_ms: default_backoff(),
        }
    }
}

fn default_timeout() -> u64 {
    5
}

fn default_budget() -> u32 {
    3
}

fn default_backoff() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Ambient-noise calibration window in seconds
    #[serde(default = "default_ambient")]
    pub ambient_secs: f64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ambient_secs: default_ambient(),
        }
    }
}

fn default_ambient() -> f64 {
    2.0
}

impl Config {
    /// Build the validated device registry from the config table.
    pub fn registry(&self) -> Result<DeviceRegistry> {
        if self.devices.is_empty() {
            return Ok(DeviceRegistry::reference());
        }
        DeviceRegistry::new(self.devices.clone()).context("Invalid device table")
    }

    /// Convert to the dispatch client configuration.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            controller: self.controller.address.clone(),
            timeout: Duration::from_secs(self.dispatch.timeout_secs),
            retry: RetryPolicy {
                budget: self.dispatch.retry_budget,
                base_backoff: Duration::from_millis(self.dispatch.backoff_ms),
            },
        }
    }
}

/// Load configuration from file, falling back to defaults when absent.
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}
