// SPDX-License-Identifier: Apache-2.0

//! Installs the single process-wide `tracing` subscriber (§11.1).
//! Worker threads inherit the global dispatcher set here, so this must
//! run before any worker or admin thread is spawned.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
