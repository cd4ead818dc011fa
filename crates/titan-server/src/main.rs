// SPDX-License-Identifier: Apache-2.0

//! `titand`: the edge process. Loads configuration, installs logging
//! and signal handling, then orchestrates workers and the admin thread
//! (§4.2, §6, §10).

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod logging;
mod pipeline;
mod signals;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use titan_admin::{AdminListener, NullMetricsRenderer};
use titan_core::config::Config;
use titan_core::global_state::GlobalState;
use titan_core::revocation::RevocationBroadcast;
use tracing::info;

use cli::Cli;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);

    let global = GlobalState::new();
    let worker_count = titan_net::orchestrator::worker_count(&config);
    let broadcast = Arc::new(RevocationBroadcast::new(worker_count));

    let _signal_watcher = signals::spawn_watcher(global.clone())
        .context("failed to install SIGTERM/SIGINT handlers")?;

    // Admin must be ready before workers start accepting (§4.2
    // "Ordering"), so it starts first and is only stopped after every
    // worker has joined.
    let mut admin = if config.metrics.enabled {
        Some(
            AdminListener::start(
                &config,
                global.clone(),
                Arc::clone(&broadcast),
                Arc::new(NullMetricsRenderer),
            )
            .context("failed to start admin listener")?,
        )
    } else {
        None
    };

    let pipeline_factory = pipeline::demo_factory();

    if cli.single {
        info!("starting single worker loop on the calling thread");
        titan_net::orchestrator::run_single(
            &config,
            global.clone(),
            broadcast.queue(0),
            pipeline_factory,
        )?;
    } else {
        let handle = titan_net::orchestrator::run_multi_worker(
            &config,
            &global,
            &broadcast,
            pipeline_factory,
        )?;
        handle.join();
    }

    if let Some(admin) = admin.as_mut() {
        admin.stop();
    }

    info!("titand exited cleanly");
    Ok(())
}
