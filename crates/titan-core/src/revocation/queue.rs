// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_queue::SegQueue;
use thiserror::Error;

use super::RevocationEntry;

/// The only failure a `RevocationQueue` can produce (§4.3): allocation
/// failure while pushing a new node. `crossbeam_queue::SegQueue` allocates
/// in fixed-size segments and aborts the process on true OOM rather than
/// returning an error, so in practice `push` here always succeeds; the
/// `Result` is kept because the admin endpoint's 503 path is part of the
/// contract and a future backing structure may make allocation fallible.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("failed to allocate revocation queue node")]
    AllocationFailed,
}

/// A multi-producer/multi-consumer set of [`RevocationEntry`] with LIFO
/// drain order (§3, §4.3, §9 "Intrusive atomic stack").
///
/// `push` is wait-free. `drain` is lock-free and returns every entry
/// observed at call time, most recently pushed first. Built on
/// [`SegQueue`] (a lock-free, safe, segment-allocated FIFO) rather than a
/// hand-rolled atomic intrusive linked list: `SegQueue::pop` already
/// detaches and reclaims nodes one at a time with no ABA hazard, so
/// draining it into a FIFO-order `Vec` and reversing reproduces the
/// spec's LIFO order without unsafe code.
pub struct RevocationQueue {
    inner: SegQueue<RevocationEntry>,
    // Approximate, advisory count (§4.3 `has_pending`). Relaxed ordering
    // throughout: callers must tolerate spurious positives and negatives.
    size: AtomicUsize,
}

impl Default for RevocationQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RevocationQueue {
    pub fn new() -> Self {
        Self {
            inner: SegQueue::new(),
            size: AtomicUsize::new(0),
        }
    }

    /// Enqueue an entry. Wait-free.
    pub fn push(&self, entry: RevocationEntry) -> Result<(), QueueError> {
        self.inner.push(entry);
        self.size.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Remove every entry observed at call time and return them ordered
    /// most-recently-pushed first. An entry pushed concurrently with a
    /// `drain` either appears in this result or is left for a later one
    /// (§3's ownership invariant).
    pub fn drain(&self) -> Vec<RevocationEntry> {
        let mut entries = Vec::new();
        while let Some(entry) = self.inner.pop() {
            entries.push(entry);
        }
        self.size.store(0, Ordering::Relaxed);
        entries.reverse();
        entries
    }

    /// An approximate, conservative-in-either-direction hint that entries
    /// may be pending. Only `drain` is authoritative.
    pub fn has_pending(&self) -> bool {
        self.size.load(Ordering::Relaxed) != 0
    }
}
