// SPDX-License-Identifier: Apache-2.0

//! Worker lifecycle: choose worker count, bind listen sockets, spawn
//! threads, join them (§4.2). `titan-server`'s `main` sequences this
//! around the admin thread (admin up first, workers joined before admin
//! stops, §4.2 "Ordering") — this module only owns the worker half,
//! kept free of any dependency on `titan-admin` so the control-plane
//! crate can depend on `titan-core` alone.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use titan_core::config::Config;
use titan_core::error::StartupError;
use titan_core::global_state::GlobalState;
use titan_core::revocation::{RevocationBroadcast, RevocationQueue};
use titan_pipeline::{BackendRegistry, Pipeline};
use tracing::{error, info};

use crate::affinity::{get_cpu_count, pin_thread_to_core};
use crate::socket::{create_listening_socket, DEFAULT_BACKLOG};
use crate::worker::{run_worker_loop, WorkerContext};

/// Builds one worker's pipeline instance, given its id, the revocation
/// queue the broadcast fabric assigned it, and a handle onto that
/// worker's backend readiness set (§4.1 steps 3-4, §6 "the pipeline
/// provides ... backend fd registration"). Each worker gets its own
/// pipeline (shared-nothing, §1, §5) so this runs once per worker
/// rather than handing out a shared `Box<dyn Pipeline>`.
pub type PipelineFactory = dyn Fn(usize, Arc<RevocationQueue>, Arc<dyn BackendRegistry>) -> Box<dyn Pipeline>
    + Send
    + Sync;

/// `config.server.worker_threads`, or the logical CPU count when it is
/// `0` ("auto", §6, §12.4).
pub fn worker_count(config: &Config) -> usize {
    if config.server.worker_threads == 0 {
        get_cpu_count()
    } else {
        config.server.worker_threads as usize
    }
}

/// A handle an orchestrated run hands back once every worker thread has
/// been spawned, so the caller can sequence admin shutdown after
/// `join()` returns.
pub struct OrchestratorHandle {
    threads: Vec<(usize, thread::JoinHandle<()>)>,
}

impl OrchestratorHandle {
    /// Block until every worker thread exits. A worker panicking is
    /// logged, not propagated, because by the time threads are joined
    /// the process is already tearing down (§7: steady-state loops
    /// never return errors upward).
    pub fn join(self) {
        for (worker_id, handle) in self.threads {
            if handle.join().is_err() {
                error!(worker_id, "worker thread panicked");
            }
        }
    }
}

/// Spawn `N` worker threads (§4.2 `run_multi_worker`), each binding its
/// own listen socket with port sharing so the kernel distributes
/// accepts across them (§4.6). Returns once every thread has been
/// spawned (not joined) — call [`OrchestratorHandle::join`] to block
/// until they exit, after starting the admin thread.
///
/// Worker 0 publishes its pipeline's `upstream_manager()` to
/// `GlobalState` before its thread starts (§4.2, §12.2): the admin
/// thread reads it lazily on every `/metrics` request, never caching.
pub fn run_multi_worker(
    config: &Config,
    global: &GlobalState,
    broadcast: &RevocationBroadcast,
    pipeline_factory: Arc<PipelineFactory>,
) -> Result<OrchestratorHandle, StartupError> {
    let n = worker_count(config);
    let graceful_timeout = Duration::from_millis(config.shutdown.graceful_timeout_ms);
    global.set_server_running(true);

    let mut threads = Vec::with_capacity(n);
    for worker_id in 0..n {
        let std_listener = create_listening_socket(
            &config.server.listen_address,
            config.server.listen_port,
            DEFAULT_BACKLOG,
            true,
        )
        .map_err(|source| StartupError::Bind {
            addr: config.server.listen_address.clone(),
            port: config.server.listen_port,
            source,
        })?;

        let ctx = WorkerContext::new(worker_id, std_listener).map_err(StartupError::Readiness)?;
        let backend_registry: Arc<dyn BackendRegistry> =
            Arc::new(ctx.backend_registry_handle().map_err(StartupError::Readiness)?);
        let queue = broadcast.queue(worker_id);
        let pipeline = pipeline_factory(worker_id, queue, backend_registry);

        if worker_id == 0 {
            global.publish_metrics_source(pipeline.upstream_manager());
        }

        let global = global.clone();
        let handle = thread::Builder::new()
            .name(format!("titan-worker-{worker_id}"))
            .spawn(move || {
                pin_thread_to_core(worker_id);
                if let Err(e) = run_worker_loop(ctx, pipeline, global, graceful_timeout) {
                    error!(worker_id, error = %e, "worker loop exited with an I/O error");
                }
            })
            .map_err(|source| StartupError::Spawn(worker_id, source))?;
        threads.push((worker_id, handle));
    }

    info!(workers = n, "all worker threads spawned");
    Ok(OrchestratorHandle { threads })
}

/// The degenerate case (§4.2 `run_single`): one dual-readiness loop on
/// the calling thread, no thread spawned, no port sharing forced on
/// (`original_source/orchestrator.cpp`'s `run_simple_server` binds
/// once — §12.1). Treated as worker 0 for the metrics-publish handshake
/// so `/metrics` works identically whether Titan runs single- or
/// multi-worker.
pub fn run_single(
    config: &Config,
    global: GlobalState,
    queue: Arc<RevocationQueue>,
    pipeline_factory: Arc<PipelineFactory>,
) -> Result<(), StartupError> {
    let std_listener = create_listening_socket(
        &config.server.listen_address,
        config.server.listen_port,
        DEFAULT_BACKLOG,
        false,
    )
    .map_err(|source| StartupError::Bind {
        addr: config.server.listen_address.clone(),
        port: config.server.listen_port,
        source,
    })?;

    let ctx = WorkerContext::new(0, std_listener).map_err(StartupError::Readiness)?;
    let backend_registry: Arc<dyn BackendRegistry> =
        Arc::new(ctx.backend_registry_handle().map_err(StartupError::Readiness)?);
    let pipeline = pipeline_factory(0, queue, backend_registry);
    global.publish_metrics_source(pipeline.upstream_manager());
    global.set_server_running(true);

    let graceful_timeout = Duration::from_millis(config.shutdown.graceful_timeout_ms);
    run_worker_loop(ctx, pipeline, global, graceful_timeout).map_err(StartupError::Readiness)
}
