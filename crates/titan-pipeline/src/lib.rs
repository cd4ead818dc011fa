// SPDX-License-Identifier: Apache-2.0

//! The worker event loop's sole external collaborator (§6).
//!
//! Everything the core explicitly treats as out of scope — request
//! parsing, router tables, upstream host selection, circuit-breaker
//! counters, JWKS fetching, and JWT validation itself — lives behind the
//! [`Pipeline`] trait, not inside `titan-net`. This crate defines that
//! trait plus a small reference implementation used by tests and by the
//! demo binary; a real deployment supplies its own.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

use std::net::IpAddr;
use std::os::fd::RawFd;
use std::sync::Arc;

use titan_core::clock::{Clock, SystemClock};
use titan_core::global_state::MetricsSource;
use titan_core::revocation::{RevocationList, RevocationQueue};

pub mod reference;

pub use reference::{EchoPipeline, NullPipeline};

/// A stable identifier for one connection. Assigned by whichever side
/// creates the connection (the worker loop for client sockets, the
/// pipeline itself for backend sockets) — not necessarily the raw OS fd
/// value, just a dense key both sides agree on for dispatch.
pub type ConnId = usize;

/// What a readiness registration cares about, mirrored by `titan-net`'s
/// concrete readiness sets. Lives here (rather than in `titan-net`) so
/// a `Pipeline` can request backend registrations without depending on
/// `titan-net` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interests {
    Readable,
    Writable,
    Both,
}

/// The worker loop's backend readiness set, exposed to the pipeline so
/// it can register and deregister the backend sockets it creates and
/// owns (§4.1, §4.6). The pipeline only ever passes a raw fd value in;
/// it never receives one back, so no reconstruction of an owning socket
/// ever happens on this side of the boundary. `titan-net`'s
/// `PipelineFactory` receives an `Arc<dyn BackendRegistry>` alongside the
/// worker id and revocation queue, so a pipeline implementation can
/// register backend fds as it opens them.
pub trait BackendRegistry: Send + Sync {
    fn register_backend(&self, id: ConnId, fd: RawFd, interests: Interests) -> std::io::Result<()>;
    fn reregister_backend(&self, id: ConnId, fd: RawFd, interests: Interests)
        -> std::io::Result<()>;
    fn deregister_backend(&self, fd: RawFd) -> std::io::Result<()>;
}

/// A client connection handed to the pipeline for the duration of one
/// callback. Backed by the worker loop's actual socket; the pipeline
/// never owns or reconstructs it, only reads and writes through it.
pub trait ClientConn {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize>;
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize>;
}

/// Everything the worker event loop invokes on a connection or tick
/// (§6, "Pipeline (consumed)"). Implementations own protocol parsing,
/// routing, upstream selection, and backend fd registration; the worker
/// loop only ever calls these five methods plus `upstream_manager`.
pub trait Pipeline: Send {
    /// A new client connection was accepted on the listen socket.
    fn on_accept(&mut self, id: ConnId, conn: &mut dyn ClientConn, client_ip: IpAddr, client_port: u16);

    /// `id` reported readable on the client readiness set.
    fn on_readable(&mut self, id: ConnId, conn: &mut dyn ClientConn);

    /// `id` reported peer-closed, error, or was otherwise torn down by
    /// the worker loop (e.g. during forced shutdown).
    fn on_close(&mut self, id: ConnId);

    /// `id` reported an event on the backend readiness set.
    fn on_backend_event(&mut self, id: ConnId, readable: bool, writable: bool, error: bool);

    /// Called once per loop iteration after both readiness sets have been
    /// drained, so connections that accumulated work without direct
    /// readiness (e.g. queued writes) can make progress.
    fn process_backend_operations(&mut self);

    /// A handle the admin thread can render into a metrics response.
    /// Worker 0 publishes this to `GlobalState` once at startup.
    fn upstream_manager(&self) -> Arc<dyn MetricsSource>;
}

/// Glue between a pipeline implementation and the revocation fabric
/// (§6, "Revocation contract (exposed)"): `sync_from_queue` then
/// `is_revoked` on every check, the two calls the pipeline layer owns.
/// A concrete [`Pipeline`] composes one of these rather than reaching
/// into the queue directly.
pub struct RevocationGate {
    list: RevocationList,
    queue: Arc<RevocationQueue>,
    clock: Arc<dyn Clock>,
}

impl RevocationGate {
    /// Uses the real wall clock for `cleanup_expired`'s opportunistic
    /// expiry boundary.
    pub fn new(queue: Arc<RevocationQueue>) -> Self {
        Self::with_clock(queue, Arc::new(SystemClock))
    }

    /// Same as [`RevocationGate::new`], but with an injected [`Clock`] so
    /// `cleanup_expired`'s boundary can be driven deterministically in
    /// tests rather than by the real wall clock.
    pub fn with_clock(queue: Arc<RevocationQueue>, clock: Arc<dyn Clock>) -> Self {
        Self {
            list: RevocationList::new(),
            queue,
            clock,
        }
    }

    /// Syncs from the shared queue (a no-op fast path when nothing is
    /// pending) and reports whether `jti` is currently blacklisted.
    pub fn check(&mut self, jti: &str) -> bool {
        self.list.sync_from_queue(&self.queue);
        self.list.is_revoked(jti)
    }

    /// Opportunistic maintenance; never required for correctness. Uses
    /// this gate's [`Clock`] rather than taking `now_seconds` from the
    /// caller, so every call site shares one notion of "now".
    pub fn cleanup_expired(&mut self) {
        self.list.cleanup_expired(self.clock.now_seconds());
    }
}

#[cfg(test)]
mod gate_tests {
    use titan_core::clock::FakeClock;
    use titan_core::revocation::RevocationEntry;

    use super::*;

    #[test]
    fn cleanup_expired_uses_the_injected_clock_boundary() {
        let queue = Arc::new(RevocationQueue::new());
        let clock = Arc::new(FakeClock::new(1_000));
        let mut gate = RevocationGate::with_clock(Arc::clone(&queue), clock.clone());

        queue.push(RevocationEntry::new("stale", 1_500)).unwrap();
        assert!(gate.check("stale"));

        clock.set(1_500);
        gate.cleanup_expired();
        assert!(!gate.check("stale"), "entry should expire once the clock reaches exp");
    }
}
