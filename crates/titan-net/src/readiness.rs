// SPDX-License-Identifier: Apache-2.0

//! A portable readiness abstraction (§4.1, §9): `register`/`modify`/
//! `deregister`/`wait`, normalized to {readable, writable, peer-closed,
//! error} regardless of backend.
//!
//! The spec calls for two implementations, one on Linux's scalable
//! readiness primitive (epoll) and one on BSD/macOS's kernel-event
//! primitive (kqueue). `mio` already is that abstraction — its `Poll`
//! compiles to epoll on Linux and kqueue on BSD/macOS behind one API,
//! and it registers everything edge-triggered with hang-up detection,
//! which is exactly the capability set §9 asks for. Wrapping `mio`
//! instead of hand-writing both backends keeps this crate free of
//! `unsafe`, which the workspace forbids.

use std::io;
use std::os::fd::{AsFd, AsRawFd, RawFd};
use std::time::Duration;

use mio::unix::SourceFd;
use mio::{event::Source, Events, Interest, Poll, Registry, Token};
use titan_pipeline::{BackendRegistry, ConnId};
pub use titan_pipeline::Interests;

fn to_mio(interests: Interests) -> Interest {
    match interests {
        Interests::Readable => Interest::READABLE,
        Interests::Writable => Interest::WRITABLE,
        Interests::Both => Interest::READABLE.add(Interest::WRITABLE),
    }
}

/// A single normalized readiness notification (§9: "Normalize event
/// flags to {readable, writable, peer-closed, error}").
#[derive(Debug, Clone, Copy)]
pub struct ReadinessEvent {
    pub id: ConnId,
    pub readable: bool,
    pub writable: bool,
    pub peer_closed: bool,
    pub error: bool,
}

/// One readiness set: either the worker's client set or its backend
/// set (§4.1 "the loop owns two readiness sets"). Each uses a bounded
/// event buffer to amortize syscall cost (§4.1: "bounded event buffer
/// (>=4096)").
pub struct ReadinessSet {
    poll: Poll,
    events: Events,
}

impl ReadinessSet {
    pub fn new(capacity: usize) -> io::Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(capacity),
        })
    }

    pub fn register<S: Source + ?Sized>(
        &self,
        source: &mut S,
        id: ConnId,
        interests: Interests,
    ) -> io::Result<()> {
        self.poll
            .registry()
            .register(source, Token(id), to_mio(interests))
    }

    pub fn reregister<S: Source + ?Sized>(
        &self,
        source: &mut S,
        id: ConnId,
        interests: Interests,
    ) -> io::Result<()> {
        self.poll
            .registry()
            .reregister(source, Token(id), to_mio(interests))
    }

    pub fn deregister<S: Source + ?Sized>(&self, source: &mut S) -> io::Result<()> {
        self.poll.registry().deregister(source)
    }

    /// Register an externally owned fd (one the pipeline created and
    /// still owns, e.g. a backend connection) by its raw value. Safe:
    /// `SourceFd` only borrows the fd for the duration of the syscall,
    /// it never reconstructs an owning object from it.
    pub fn register_raw(&self, fd: RawFd, id: ConnId, interests: Interests) -> io::Result<()> {
        self.register(&mut SourceFd(&fd), id, interests)
    }

    pub fn reregister_raw(&self, fd: RawFd, id: ConnId, interests: Interests) -> io::Result<()> {
        self.reregister(&mut SourceFd(&fd), id, interests)
    }

    pub fn deregister_raw(&self, fd: RawFd) -> io::Result<()> {
        self.deregister(&mut SourceFd(&fd))
    }

    /// Poll with a bounded timeout (<=1ms in steady state, per §4.1) and
    /// return the normalized events observed.
    pub fn wait(&mut self, timeout: Duration) -> io::Result<Vec<ReadinessEvent>> {
        match self.poll.poll(&mut self.events, Some(timeout)) {
            Ok(()) => Ok(self.events.iter().map(normalize).collect()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// A cheap, cloneable handle that can register/deregister raw fds
    /// into this set without touching `wait`. Used to give the pipeline
    /// access to the backend set (§4.1, §9) while the worker loop keeps
    /// exclusive ownership of polling it.
    pub fn handle(&self) -> io::Result<BackendRegistryHandle> {
        Ok(BackendRegistryHandle {
            registry: self.poll.registry().try_clone()?,
        })
    }
}

/// Implements [`titan_pipeline::BackendRegistry`] over a cloned
/// `mio::Registry`. The pipeline only ever hands in a raw fd value it
/// already owns; this never reconstructs an owning socket from it.
pub struct BackendRegistryHandle {
    registry: Registry,
}

impl BackendRegistry for BackendRegistryHandle {
    fn register_backend(&self, id: ConnId, fd: RawFd, interests: Interests) -> io::Result<()> {
        self.registry
            .register(&mut SourceFd(&fd), Token(id), to_mio(interests))
    }

    fn reregister_backend(&self, id: ConnId, fd: RawFd, interests: Interests) -> io::Result<()> {
        self.registry
            .reregister(&mut SourceFd(&fd), Token(id), to_mio(interests))
    }

    fn deregister_backend(&self, fd: RawFd) -> io::Result<()> {
        self.registry.deregister(&mut SourceFd(&fd))
    }
}

fn normalize(event: &mio::event::Event) -> ReadinessEvent {
    ReadinessEvent {
        id: event.token().0,
        readable: event.is_readable(),
        writable: event.is_writable(),
        peer_closed: event.is_read_closed() || event.is_write_closed(),
        error: event.is_error(),
    }
}

/// Convenience for callers that hold a safe `AsFd` handle (e.g. the
/// pipeline's own backend socket) and just want its raw value for
/// registration bookkeeping. `AsFd::as_fd` is a safe trait method; this
/// performs no unsafe reconstruction.
pub fn raw_fd_of(source: &impl AsFd) -> RawFd {
    source.as_fd().as_raw_fd()
}
