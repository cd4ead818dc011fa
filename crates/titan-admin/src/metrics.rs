// SPDX-License-Identifier: Apache-2.0

//! Prometheus text encoding is an external collaborator (§1): this
//! module only owns the seam the admin listener calls through. A real
//! deployment renders circuit-breaker and upstream counters; Titan
//! ships [`NullMetricsRenderer`], used by tests and the demo binary,
//! which renders whatever a [`MetricsSource`] exposes as a trivial
//! count line rather than real Prometheus exposition format.

use std::sync::Arc;

use titan_core::global_state::MetricsSource;

/// Renders a worker's published [`MetricsSource`] into the body of a
/// `/metrics` response. `worker_id` is always `0` today (only worker 0
/// publishes, §12.2) but is threaded through so a renderer can label
/// output per-worker if Titan ever publishes more than one source.
pub trait MetricsRenderer: Send + Sync {
    fn render(&self, source: &Arc<dyn MetricsSource>, worker_id: usize) -> String;
}

/// A renderer with nothing real to report. Emits a single comment line
/// so `/metrics` always returns syntactically plausible Prometheus text
/// exposition format even with no counters wired up.
#[derive(Debug, Default)]
pub struct NullMetricsRenderer;

impl MetricsRenderer for NullMetricsRenderer {
    fn render(&self, _source: &Arc<dyn MetricsSource>, worker_id: usize) -> String {
        format!("# titan worker {worker_id} metrics source published, no renderer wired up\n")
    }
}
