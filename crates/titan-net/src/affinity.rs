// SPDX-License-Identifier: Apache-2.0

//! CPU pinning (§4.2) and logical CPU count, backing `worker_threads = 0`
//! ("auto", §12.4). The original pins via `pthread_setaffinity_np` on
//! Linux and no-ops on macOS; `core_affinity` gives us the same behavior
//! as a safe, already-cross-platform wrapper, so pinning failure is
//! logged and swallowed here exactly as the original does, never fatal.

use tracing::warn;

/// Pin the calling thread to logical core `worker_id`, wrapping around
/// if there are fewer cores than workers. Never fatal: a failure (or an
/// unsupported platform) is logged and ignored.
pub fn pin_thread_to_core(worker_id: usize) {
    let Some(core_ids) = core_affinity::get_core_ids() else {
        warn!(worker_id, "could not enumerate CPU cores; skipping affinity pinning");
        return;
    };
    if core_ids.is_empty() {
        return;
    }
    let target = core_ids[worker_id % core_ids.len()];
    if !core_affinity::set_for_current(target) {
        warn!(worker_id, core = target.id, "failed to pin worker to core");
    }
}

/// The logical CPU count, used when `server.worker_threads == 0`.
pub fn get_cpu_count() -> usize {
    core_affinity::get_core_ids()
        .map(|ids| ids.len())
        .filter(|&n| n > 0)
        .unwrap_or(1)
}
