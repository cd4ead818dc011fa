// SPDX-License-Identifier: Apache-2.0

//! Cross-worker broadcast over [`RevocationQueue`] (§9 "Cross-worker
//! broadcast over a single-consumer queue"). A single queue delivers
//! each entry to exactly one drainer (§4.3), so true broadcast needs
//! either one queue per worker with the admin fanning out pushes, or a
//! versioned snapshot every worker reads at least once. This crate
//! takes the first option, the one §9 recommends: the orchestrator
//! owns one `RevocationQueue` per worker, and `push` writes a clone of
//! the entry into every queue so each worker's own `sync_from_queue`
//! observes it independently.

use std::sync::Arc;

use super::{QueueError, RevocationEntry, RevocationQueue};

/// Owns one [`RevocationQueue`] per worker. Constructed once by whatever
/// assembles the process (the orchestrator, in spec terms), then
/// borrowed by the admin listener (to push) and handed out one queue
/// per worker (to drain).
pub struct RevocationBroadcast {
    queues: Vec<Arc<RevocationQueue>>,
}

impl RevocationBroadcast {
    /// Build a broadcast fabric with `worker_count` independent queues.
    /// `worker_count` must be at least 1.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let queues = (0..worker_count).map(|_| Arc::new(RevocationQueue::new())).collect();
        Self { queues }
    }

    /// Push `entry` onto every worker's queue. Each queue allocates its
    /// own node, so a failure on one queue does not prevent pushing to
    /// the others; the first failure observed is what's returned (the
    /// admin endpoint maps this to a 503, §4.3).
    pub fn push(&self, entry: RevocationEntry) -> Result<(), QueueError> {
        let mut result = Ok(());
        for queue in &self.queues {
            if let Err(e) = queue.push(entry.clone()) {
                result = Err(e);
            }
        }
        result
    }

    /// The queue assigned to worker `id`. Panics if `id` is out of
    /// range; callers always iterate `0..worker_count()`.
    pub fn queue(&self, id: usize) -> Arc<RevocationQueue> {
        Arc::clone(&self.queues[id])
    }

    pub fn worker_count(&self) -> usize {
        self.queues.len()
    }

    /// True if any worker's queue has unconsumed entries (advisory, like
    /// the underlying queues' `has_pending`).
    pub fn has_pending(&self) -> bool {
        self.queues.iter().any(|q| q.has_pending())
    }
}
