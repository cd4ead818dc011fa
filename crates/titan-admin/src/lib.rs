// SPDX-License-Identifier: Apache-2.0

//! The admin/control-plane surface (§4.5): health, metrics, and JWT
//! revocation over a loopback-only HTTP/1.1 listener. Not
//! performance-critical — single accepting thread, blocking I/O per
//! connection, a minimal hand-rolled request parser rather than a full
//! HTTP stack (§4.5, §12.3).

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod listener;
mod metrics;
mod request;
mod response;
mod revoke;

pub use error::AdminError;
pub use listener::AdminListener;
pub use metrics::{MetricsRenderer, NullMetricsRenderer};
pub use revoke::RevokeError;
