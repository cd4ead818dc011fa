// SPDX-License-Identifier: Apache-2.0

//! The dual-readiness worker event loop (§4.1): the 40% of the core this
//! whole crate exists to drive correctly.

use std::collections::HashSet;
use std::io;
use std::net::TcpListener as StdTcpListener;
use std::time::{Duration, Instant};

use mio::net::TcpListener as MioTcpListener;
use titan_core::global_state::GlobalState;
use titan_pipeline::{ConnId, Pipeline};
use tracing::{debug, info, info_span, warn};

use crate::conn::MioClientConn;
use crate::readiness::{Interests, ReadinessSet};

/// Reserved token for the listen socket; accepted connections get dense
/// ids starting at 1.
const LISTEN_ID: ConnId = 0;

/// Bounded event buffer, §4.1: "Each poll uses a bounded event buffer
/// (>=4096) to amortize syscall cost."
const MAX_EVENTS: usize = 4096;

/// Poll timeout in steady state (§4.1: "a short timeout (<=1 ms)").
const POLL_TIMEOUT: Duration = Duration::from_millis(1);

/// Graceful shutdown drain cadence and deadline (§4.1, overridable via
/// `shutdown.graceful_timeout_ms`, §6).
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Everything one worker owns: the listen socket, its two readiness
/// sets, the pipeline, and the set of currently tracked client fds
/// (§3's `WorkerContext`). The worker-local `RevocationList` named in
/// §3 lives inside the pipeline's `RevocationGate` instead of as a
/// separate field here — see `DESIGN.md` for why.
pub struct WorkerContext {
    worker_id: usize,
    listener: MioTcpListener,
    client_set: ReadinessSet,
    backend_set: ReadinessSet,
    conns: std::collections::HashMap<ConnId, mio::net::TcpStream>,
    next_id: ConnId,
}

impl WorkerContext {
    pub fn new(worker_id: usize, std_listener: StdTcpListener) -> io::Result<Self> {
        std_listener.set_nonblocking(true)?;
        let mut listener = MioTcpListener::from_std(std_listener);
        let client_set = ReadinessSet::new(MAX_EVENTS)?;
        let backend_set = ReadinessSet::new(MAX_EVENTS)?;
        client_set.register(&mut listener, LISTEN_ID, Interests::Readable)?;
        Ok(Self {
            worker_id,
            listener,
            client_set,
            backend_set,
            conns: std::collections::HashMap::new(),
            next_id: LISTEN_ID + 1,
        })
    }

    /// A handle the pipeline can use to register/deregister the backend
    /// sockets it creates (§4.1, §6). The orchestrator calls this once
    /// per worker, before the pipeline itself exists, and passes the
    /// result into `PipelineFactory` so a real pipeline can register
    /// backend fds as it opens them.
    pub fn backend_registry_handle(
        &self,
    ) -> io::Result<crate::readiness::BackendRegistryHandle> {
        self.backend_set.handle()
    }

    fn next_conn_id(&mut self) -> ConnId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn close_client(&mut self, id: ConnId, pipeline: &mut dyn Pipeline) {
        if let Some(mut stream) = self.conns.remove(&id) {
            let _ = self.client_set.deregister(&mut stream);
        }
        pipeline.on_close(id);
    }
}

/// Run one worker's event loop to completion. Returns once
/// `global.is_server_running()` is false, the graceful-shutdown drain
/// (if any) has finished, and every client fd has been closed.
///
/// `worker_id` is used for CPU affinity (by the caller, before this is
/// invoked) and for the tracing span so multi-worker logs stay
/// attributable.
pub fn run_worker_loop(
    mut ctx: WorkerContext,
    mut pipeline: Box<dyn Pipeline>,
    global: GlobalState,
    graceful_timeout: Duration,
) -> io::Result<()> {
    let span = info_span!("worker", id = ctx.worker_id);
    let _enter = span.enter();
    info!("worker loop starting");

    let mut active_clients: HashSet<ConnId> = HashSet::new();

    while global.is_server_running() {
        poll_client_set(&mut ctx, &mut pipeline, &mut active_clients)?;
        poll_backend_set(&mut ctx, &mut pipeline)?;
        pipeline.process_backend_operations();
    }

    if global.is_graceful_shutdown() && !active_clients.is_empty() {
        drain_on_shutdown(&mut ctx, &mut pipeline, &mut active_clients, graceful_timeout)?;
    }

    for id in active_clients.drain() {
        ctx.close_client(id, pipeline.as_mut());
    }
    info!("worker loop exited");
    Ok(())
}

fn poll_client_set(
    ctx: &mut WorkerContext,
    pipeline: &mut Box<dyn Pipeline>,
    active_clients: &mut HashSet<ConnId>,
) -> io::Result<()> {
    let events = ctx.client_set.wait(POLL_TIMEOUT)?;
    for event in events {
        if event.id == LISTEN_ID {
            accept_until_would_block(ctx, pipeline.as_mut(), active_clients)?;
            continue;
        }
        // A client that writes then closes in one packet reports
        // readable and peer-closed on the same event (§8 "Loop"
        // property): dispatch the read before the close so the
        // pipeline still sees the final bytes, never the reverse.
        if event.readable {
            if let Some(mut stream) = ctx.conns.remove(&event.id) {
                let mut conn = MioClientConn::new(&mut stream);
                pipeline.on_readable(event.id, &mut conn);
                ctx.conns.insert(event.id, stream);
            }
        }
        if event.peer_closed || event.error {
            active_clients.remove(&event.id);
            ctx.close_client(event.id, pipeline.as_mut());
        }
    }
    Ok(())
}

/// Edge-triggered discipline (§4.1): drain accepts until the kernel
/// reports "would block".
fn accept_until_would_block(
    ctx: &mut WorkerContext,
    pipeline: &mut dyn Pipeline,
    active_clients: &mut HashSet<ConnId>,
) -> io::Result<()> {
    loop {
        match ctx.listener.accept() {
            Ok((mut stream, addr)) => {
                let id = ctx.next_conn_id();
                if let Err(e) = ctx.client_set.register(&mut stream, id, Interests::Readable) {
                    warn!(error = %e, "failed to register accepted connection");
                    continue;
                }
                {
                    let mut conn = MioClientConn::new(&mut stream);
                    pipeline.on_accept(id, &mut conn, addr.ip(), addr.port());
                }
                ctx.conns.insert(id, stream);
                active_clients.insert(id);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "accept failed");
                break;
            }
        }
    }
    Ok(())
}

fn poll_backend_set(ctx: &mut WorkerContext, pipeline: &mut Box<dyn Pipeline>) -> io::Result<()> {
    let events = ctx.backend_set.wait(POLL_TIMEOUT)?;
    for event in events {
        pipeline.on_backend_event(event.id, event.readable, event.writable, event.error);
    }
    Ok(())
}

/// Graceful shutdown drain (§4.1): deregister the listen socket, then
/// keep polling both sets (dispatching only to existing fds) until the
/// active client set empties or `graceful_timeout` elapses, at which
/// point remaining fds are forced closed.
fn drain_on_shutdown(
    ctx: &mut WorkerContext,
    pipeline: &mut Box<dyn Pipeline>,
    active_clients: &mut HashSet<ConnId>,
    graceful_timeout: Duration,
) -> io::Result<()> {
    info!(
        active = active_clients.len(),
        "graceful shutdown: draining active connections"
    );
    let _ = ctx.client_set.deregister(&mut ctx.listener);

    let deadline = Instant::now() + graceful_timeout;
    while !active_clients.is_empty() && Instant::now() < deadline {
        let events = ctx.client_set.wait(SHUTDOWN_POLL_INTERVAL)?;
        for event in events {
            if event.id == LISTEN_ID {
                continue;
            }
            if event.readable {
                if let Some(mut stream) = ctx.conns.remove(&event.id) {
                    let mut conn = MioClientConn::new(&mut stream);
                    pipeline.on_readable(event.id, &mut conn);
                    ctx.conns.insert(event.id, stream);
                }
            }
            if event.peer_closed || event.error {
                active_clients.remove(&event.id);
                ctx.close_client(event.id, pipeline.as_mut());
            }
        }
        let backend_events = ctx.backend_set.wait(Duration::from_millis(1))?;
        for event in backend_events {
            pipeline.on_backend_event(event.id, event.readable, event.writable, event.error);
        }
        pipeline.process_backend_operations();
    }

    if !active_clients.is_empty() {
        debug!(
            remaining = active_clients.len(),
            "graceful shutdown deadline reached; forcing close"
        );
    }
    Ok(())
}
