// SPDX-License-Identifier: Apache-2.0

//! The pipeline factory `titand` wires into the orchestrator. Router
//! tables, upstream selection, circuit breaking, and JWT validation are
//! external collaborators the core never implements (§1, §6); the demo
//! binary ships `titan-pipeline`'s reference `EchoPipeline` so the
//! worker loop's accept/readable/close contract has something real to
//! drive end to end. A production deployment supplies its own
//! `Pipeline` here instead.

use std::sync::Arc;

use titan_core::revocation::RevocationQueue;
use titan_net::orchestrator::PipelineFactory;
use titan_pipeline::{BackendRegistry, EchoPipeline, Pipeline};

pub fn demo_factory() -> Arc<PipelineFactory> {
    Arc::new(
        |_worker_id: usize, _queue: Arc<RevocationQueue>, _backend: Arc<dyn BackendRegistry>| {
            Box::new(EchoPipeline::new()) as Box<dyn Pipeline>
        },
    )
}
