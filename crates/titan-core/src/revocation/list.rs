// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use super::{queue::RevocationQueue, RevocationEntry};

/// Worker-local mapping from `jti` to `exp` (§4.4). Exactly one thread may
/// call any method on a given list; nothing inside synchronizes access.
#[derive(Debug, Default)]
pub struct RevocationList {
    blacklist: HashMap<String, u64>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update. Last-writer-wins on repeated `revoke` for the
    /// same `jti`.
    pub fn revoke(&mut self, jti: &str, exp: u64) {
        self.blacklist.insert(jti.to_string(), exp);
    }

    /// No expiry check here: the pipeline separately rejects tokens whose
    /// own `exp` has passed, so blacklisting an expired token is harmless.
    pub fn is_revoked(&self, jti: &str) -> bool {
        self.blacklist.contains_key(jti)
    }

    /// Fast path every request pays for: if the queue has nothing
    /// pending, return without touching the queue further.
    pub fn sync_from_queue(&mut self, queue: &RevocationQueue) {
        if !queue.has_pending() {
            return;
        }
        for RevocationEntry { jti, exp } in queue.drain() {
            self.blacklist.insert(jti, exp);
        }
    }

    /// Remove every entry with `exp <= now_seconds`. O(n); called
    /// opportunistically, never required for correctness.
    pub fn cleanup_expired(&mut self, now_seconds: u64) {
        self.blacklist.retain(|_, exp| *exp > now_seconds);
    }

    pub fn len(&self) -> usize {
        self.blacklist.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blacklist.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoke_then_is_revoked() {
        let mut list = RevocationList::new();
        list.revoke("j", 1000);
        assert!(list.is_revoked("j"));
    }

    #[test]
    fn cleanup_at_or_past_exp_removes_entry() {
        let mut list = RevocationList::new();
        list.revoke("j", 1000);
        list.cleanup_expired(1000);
        assert!(!list.is_revoked("j"));
    }

    #[test]
    fn cleanup_before_exp_keeps_entry() {
        let mut list = RevocationList::new();
        list.revoke("j", 1000);
        list.cleanup_expired(999);
        assert!(list.is_revoked("j"));
    }

    #[test]
    fn repeated_revoke_updates_exp() {
        let mut list = RevocationList::new();
        list.revoke("j", 1000);
        list.revoke("j", 3000);
        list.cleanup_expired(2000);
        assert!(list.is_revoked("j"), "exp should have been updated to 3000");
    }

    #[test]
    fn sync_from_empty_queue_is_a_no_op() {
        let mut list = RevocationList::new();
        let queue = RevocationQueue::new();
        list.sync_from_queue(&queue);
        assert!(list.is_empty());
    }

    #[test]
    fn sync_from_queue_drains_and_inserts() {
        let mut list = RevocationList::new();
        let queue = RevocationQueue::new();
        queue.push(RevocationEntry::new("e", 1000)).unwrap();
        queue.push(RevocationEntry::new("a", 3000)).unwrap();
        list.sync_from_queue(&queue);
        list.cleanup_expired(2000);
        assert!(!list.is_revoked("e"));
        assert!(list.is_revoked("a"));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn queue_is_single_consumer_per_entry_across_two_lists() {
        // Scenario 6 (§8): two workers, one revocation pushed; one
        // worker's list observes it after syncing, the other's does not
        // because the queue already delivered the entry to the first
        // drainer. The broadcast layer (titan-admin's fan-out) is what
        // compensates for this, not the queue.
        let queue = RevocationQueue::new();
        queue.push(RevocationEntry::new("shared", 5000)).unwrap();

        let mut worker_a = RevocationList::new();
        let mut worker_b = RevocationList::new();

        worker_a.sync_from_queue(&queue);
        worker_b.sync_from_queue(&queue);

        assert!(worker_a.is_revoked("shared"));
        assert!(!worker_b.is_revoked("shared"));
    }
}
