// SPDX-License-Identifier: Apache-2.0

//! `titand`'s command-line surface (§6, §11.3). Precedence is CLI flag
//! > config file > built-in default: every field here is `Option` so
//! "not passed" is distinguishable from "explicitly set to the
//! default", and [`Cli::apply_overrides`] only touches fields that
//! were actually passed.

use std::path::PathBuf;

use clap::Parser;
use titan_core::config::Config;

#[derive(Parser, Debug)]
#[command(name = "titand", version, about = "Titan edge process: workers + admin listener")]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Run a single worker loop on the calling thread instead of
    /// spawning `server.worker_threads` worker threads (§4.2
    /// `run_single`, the degenerate single-worker case).
    #[arg(long)]
    pub single: bool,

    #[arg(long)]
    pub worker_threads: Option<u32>,

    #[arg(long)]
    pub listen_address: Option<String>,

    #[arg(long)]
    pub listen_port: Option<u16>,

    /// Disable the admin listener regardless of what the config file says.
    #[arg(long)]
    pub disable_metrics: bool,

    #[arg(long)]
    pub metrics_port: Option<u16>,

    #[arg(long)]
    pub metrics_path: Option<String>,

    #[arg(long)]
    pub graceful_timeout_ms: Option<u64>,
}

impl Cli {
    /// Apply this invocation's explicit flags onto a config already
    /// loaded from file (or defaults). Fields left unset on the CLI
    /// never touch `config`, so file values and built-in defaults show
    /// through untouched.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(worker_threads) = self.worker_threads {
            config.server.worker_threads = worker_threads;
        }
        if let Some(ref addr) = self.listen_address {
            config.server.listen_address = addr.clone();
        }
        if let Some(port) = self.listen_port {
            config.server.listen_port = port;
        }
        if self.disable_metrics {
            config.metrics.enabled = false;
        }
        if let Some(port) = self.metrics_port {
            config.metrics.port = port;
        }
        if let Some(ref path) = self.metrics_path {
            config.metrics.path = path.clone();
        }
        if let Some(timeout) = self.graceful_timeout_ms {
            config.shutdown.graceful_timeout_ms = timeout;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_flags_leave_config_untouched() {
        let cli = Cli::parse_from(["titand"]);
        let mut config = Config::default();
        let before = config.server.listen_port;
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.listen_port, before);
    }

    #[test]
    fn explicit_flags_override_config() {
        let cli = Cli::parse_from(["titand", "--listen-port", "9999", "--worker-threads", "4"]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.server.listen_port, 9999);
        assert_eq!(config.server.worker_threads, 4);
    }

    #[test]
    fn disable_metrics_flag_wins_over_config_default() {
        let cli = Cli::parse_from(["titand", "--disable-metrics"]);
        let mut config = Config::default();
        assert!(config.metrics.enabled);
        cli.apply_overrides(&mut config);
        assert!(!config.metrics.enabled);
    }
}
