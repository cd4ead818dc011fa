// SPDX-License-Identifier: Apache-2.0

//! `titanctl`: a small operator binary that talks to Titan's admin
//! listener over loopback (§6, §10) — health checks, JWT revocation,
//! and metrics scrapes, for scripts and operators who'd rather not
//! hand-roll curl invocations against the admin port.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod client;
mod commands;
mod exit_error;

use clap::{Parser, Subcommand};

use client::AdminClient;
use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "titanctl", version, about = "Operator CLI for the Titan admin listener")]
struct Cli {
    /// Admin listener host.
    #[arg(long, global = true, default_value = "127.0.0.1")]
    host: String,

    /// Admin listener port (matches `metrics.port` in the server config).
    #[arg(long, global = true, default_value_t = 9090)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check `/health` on the admin listener.
    Health,
    /// Scrape a metrics path (defaults to `/metrics`).
    Metrics {
        #[arg(long, default_value = "/metrics")]
        path: String,
    },
    /// Revoke a JWT by `jti`, given its `exp` (seconds since epoch).
    Revoke {
        #[arg(long)]
        jti: String,
        #[arg(long)]
        exp: u64,
    },
}

fn main() {
    let cli = Cli::parse();
    let client = AdminClient::new(&cli.host, cli.port);

    let result = match cli.command {
        Command::Health => commands::health(&client),
        Command::Metrics { path } => commands::metrics(&client, &path),
        Command::Revoke { jti, exp } => commands::revoke(&client, &jti, exp),
    };

    if let Err(err) = result {
        if let Some(exit_error) = err.downcast_ref::<ExitError>() {
            eprintln!("error: {exit_error}");
            std::process::exit(exit_error.code);
        }
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
