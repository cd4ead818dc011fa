// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Startup failures for the admin listener (§7: resource-acquisition
/// errors on startup, surfaced from `start`, abort the process the same
/// way a worker bind failure does).
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("admin listener failed to bind 127.0.0.1:{port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}
