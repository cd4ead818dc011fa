// SPDX-License-Identifier: Apache-2.0

//! Configuration surface consumed by the core (§6). Loading from a TOML
//! file and merging CLI overrides is `titan-server`'s job; this module only
//! owns the shape and the defaults.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level configuration. Every field here is referenced somewhere in
/// the core per spec §6's "CLI/config surface used by core" table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub metrics: MetricsConfig,
    pub shutdown: ShutdownConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            metrics: MetricsConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 0 means "auto": use the logical CPU count.
    pub worker_threads: u32,
    pub listen_address: String,
    pub listen_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            listen_address: "0.0.0.0".to_string(),
            listen_port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
            path: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    pub graceful_timeout_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            graceful_timeout_ms: 30_000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file on disk.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_str(&text, path)
    }

    fn from_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.metrics.enabled && self.metrics.path.is_empty() {
            return Err(ConfigError::Invalid(
                "metrics.path must not be empty when metrics.enabled is true".to_string(),
            ));
        }
        if self.shutdown.graceful_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "shutdown.graceful_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
