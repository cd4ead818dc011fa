// SPDX-License-Identifier: Apache-2.0

//! SIGTERM/SIGINT handling (§6 "Process signals", §11.4, §9 "Global
//! mutable state"). `signal_hook::iterator::Signals` defers the actual
//! work to a normal thread rather than running inside the restricted
//! context of a real signal handler, so `GlobalState::request_shutdown`
//! (a couple of atomic stores, no allocation, no logging) can be called
//! directly and safely — no `unsafe` needed anywhere in this crate.

use std::io;
use std::thread::{self, JoinHandle};

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use titan_core::global_state::GlobalState;
use tracing::info;

/// Spawn the signal-watching thread. SIGTERM and SIGINT are the only
/// supported way to induce shutdown (§6); both do the same thing.
pub fn spawn_watcher(global: GlobalState) -> io::Result<JoinHandle<()>> {
    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    thread::Builder::new().name("titan-signals".to_string()).spawn(move || {
        for signal in signals.forever() {
            info!(signal, "shutdown signal received");
            global.request_shutdown();
        }
    })
}
