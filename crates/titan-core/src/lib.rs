// SPDX-License-Identifier: Apache-2.0

//! Data model and process-wide state shared by every Titan crate.
//!
//! `titan-core` has no I/O beyond what the [`revocation`] queue's allocation
//! failure path surfaces. Sockets, readiness polling, and thread spawning
//! live in `titan-net`; this crate only holds the types every other crate
//! agrees on.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod clock;
pub mod config;
pub mod error;
pub mod global_state;
pub mod revocation;

pub use clock::{Clock, SystemClock};
pub use config::Config;
pub use error::{ConfigError, StartupError};
pub use global_state::GlobalState;
pub use revocation::{RevocationBroadcast, RevocationEntry, RevocationList, RevocationQueue};
