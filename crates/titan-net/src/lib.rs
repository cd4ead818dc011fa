// SPDX-License-Identifier: Apache-2.0

//! Socket utilities, the mio-backed readiness implementation, the
//! dual-readiness worker event loop, CPU affinity, and the orchestrator
//! that spawns, joins, and shuts down workers (§4.1, §4.2, §4.6, §10).
//!
//! `titan-core` has no I/O; this crate is where the core's contracts
//! meet real sockets and real threads.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod affinity;
pub mod conn;
pub mod orchestrator;
pub mod readiness;
pub mod socket;
pub mod worker;

pub use orchestrator::{run_multi_worker, run_single, OrchestratorHandle};
pub use readiness::{Interests, ReadinessEvent, ReadinessSet};
pub use worker::{run_worker_loop, WorkerContext};
