// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while loading configuration, before any worker starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file at {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("could not parse config file at {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced from `run_multi_worker`/`run_single` before the event
/// loop can make progress. These always abort the process (§7).
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind listening socket on {addr}:{port}: {source}")]
    Bind {
        addr: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create readiness set: {0}")]
    Readiness(#[source] std::io::Error),

    #[error("failed to spawn worker thread {0}: {1}")]
    Spawn(usize, #[source] std::io::Error),
}
