// SPDX-License-Identifier: Apache-2.0

//! The process-wide state every worker and the admin thread share (§3,
//! §5, §9). Exactly three pieces of mutable state cross thread
//! boundaries; everything else is worker-local or admin-local.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// An opaque handle to worker 0's upstream manager, published once so the
/// admin thread can render metrics from it. Titan core does not know the
/// shape of the upstream manager — rendering it to text is an external
/// collaborator's job (the pipeline crate and whatever `MetricsRenderer`
/// the binary wires up).
pub trait MetricsSource: Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

/// Shutdown flags plus the metrics-source handoff. Represented as a small
/// immutable handle (an `Arc` internally) passed to the orchestrator and
/// every worker at construction, never as a module-level singleton (§9).
#[derive(Clone, Default)]
pub struct GlobalState {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    server_running: AtomicBool,
    graceful_shutdown: AtomicBool,
    metrics_source: OnceLock<Arc<dyn MetricsSource>>,
}

impl GlobalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while workers should keep accepting new connections.
    pub fn is_server_running(&self) -> bool {
        self.inner.server_running.load(Ordering::Acquire)
    }

    pub fn set_server_running(&self, running: bool) {
        self.inner.server_running.store(running, Ordering::Release);
    }

    /// True once a graceful shutdown has been requested (SIGTERM/SIGINT).
    pub fn is_graceful_shutdown(&self) -> bool {
        self.inner.graceful_shutdown.load(Ordering::Acquire)
    }

    pub fn set_graceful_shutdown(&self, shutting_down: bool) {
        self.inner
            .graceful_shutdown
            .store(shutting_down, Ordering::Release);
    }

    /// Flip both shutdown flags atomically from the caller's perspective.
    /// Safe to call from a signal handler: no allocation, no logging.
    pub fn request_shutdown(&self) {
        self.inner.graceful_shutdown.store(true, Ordering::Release);
        self.inner.server_running.store(false, Ordering::Release);
    }

    /// Worker 0 publishes its upstream manager exactly once. Later calls
    /// are no-ops (mirrors the original's "first writer wins" handoff).
    pub fn publish_metrics_source(&self, source: Arc<dyn MetricsSource>) {
        let _ = self.inner.metrics_source.set(source);
    }

    /// The admin thread reads this lazily on every scrape, never caching
    /// (§12.2): `None` until worker 0 has published.
    pub fn metrics_source(&self) -> Option<Arc<dyn MetricsSource>> {
        self.inner.metrics_source.get().cloned()
    }
}
