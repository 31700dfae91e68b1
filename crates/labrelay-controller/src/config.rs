//! Controller configuration loading

use anyhow::{Context, Result};
use labrelay_core::{DeviceEntry, DeviceRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Controller configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub link: LinkConfig,
    /// Device table; the reference wiring when absent
    #[serde(default, rename = "device")]
    pub devices: Vec<DeviceEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            link: LinkConfig::default(),
            devices: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Bind address for the relay service
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Bound on the startup wait for a routable address
    #[serde(default = "default_wait")]
    pub wait_secs: u64,
    /// Poll interval while waiting
    #[serde(default = "default_poll")]
    pub poll_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            wait_secs: default_wait(),
            poll_ms: default_poll(),
        }
    }
}

fn default_wait() -> u64 {
    10
}

fn default_poll() -> u64 {
    500
}

impl Config {
    /// Build the validated device registry from the config table.
    pub fn registry(&self) -> Result<DeviceRegistry> {
        if self.devices.is_empty() {
            return Ok(DeviceRegistry::reference());
        }
        DeviceRegistry::new(self.devices.clone()).context("Invalid device table")
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
