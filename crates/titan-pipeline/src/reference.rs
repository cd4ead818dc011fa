// SPDX-License-Identifier: Apache-2.0

//! Reference pipelines used by `titan-net`'s tests and by the demo
//! binary. Neither does real routing or upstream selection — that is
//! exactly the work the core leaves to an external collaborator — but
//! both are real enough to exercise the worker loop's contract.

use std::any::Any;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use titan_core::global_state::MetricsSource;

use crate::{ClientConn, ConnId, Pipeline};

/// A trivial metrics source with nothing to report; satisfies the
/// `upstream_manager()` contract without depending on any real upstream
/// bookkeeping.
#[derive(Debug, Default)]
pub struct NullMetricsSource;

impl MetricsSource for NullMetricsSource {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Does nothing with any connection. Useful for exercising the worker
/// loop's accept/readiness/shutdown behavior in isolation from protocol
/// logic.
#[derive(Default)]
pub struct NullPipeline {
    metrics: Arc<NullMetricsSource>,
}

impl NullPipeline {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Pipeline for NullPipeline {
    fn on_accept(&mut self, _id: ConnId, _conn: &mut dyn ClientConn, _ip: IpAddr, _port: u16) {}
    fn on_readable(&mut self, _id: ConnId, _conn: &mut dyn ClientConn) {}
    fn on_close(&mut self, _id: ConnId) {}
    fn on_backend_event(&mut self, _id: ConnId, _r: bool, _w: bool, _e: bool) {}
    fn process_backend_operations(&mut self) {}

    fn upstream_manager(&self) -> Arc<dyn MetricsSource> {
        self.metrics.clone()
    }
}

/// Counts bytes seen per connection and reports them as metrics;
/// `upstream_manager()` exposes the byte counter so admin `/metrics`
/// scrapes have something real to render in tests.
#[derive(Debug, Default)]
pub struct EchoMetrics {
    pub connections_accepted: std::sync::atomic::AtomicU64,
    pub bytes_echoed: std::sync::atomic::AtomicU64,
}

impl MetricsSource for EchoMetrics {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Echoes every byte it reads back to the same connection. Demonstrates
/// the accept -> readable -> close lifecycle the worker loop drives;
/// has no backend side (no router, no upstream selection), so
/// `on_backend_event`/`process_backend_operations` are no-ops.
pub struct EchoPipeline {
    metrics: Arc<EchoMetrics>,
    pending_ips: HashMap<ConnId, IpAddr>,
}

impl Default for EchoPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl EchoPipeline {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(EchoMetrics::default()),
            pending_ips: HashMap::new(),
        }
    }
}

impl Pipeline for EchoPipeline {
    fn on_accept(&mut self, id: ConnId, _conn: &mut dyn ClientConn, ip: IpAddr, _port: u16) {
        self.pending_ips.insert(id, ip);
        self.metrics
            .connections_accepted
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    fn on_readable(&mut self, _id: ConnId, conn: &mut dyn ClientConn) {
        let mut buf = [0u8; 4096];
        loop {
            match conn.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    self.metrics
                        .bytes_echoed
                        .fetch_add(n as u64, std::sync::atomic::Ordering::Relaxed);
                    if conn.write(&buf[..n]).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(_) => break,
            }
        }
    }

    fn on_close(&mut self, id: ConnId) {
        self.pending_ips.remove(&id);
    }

    fn on_backend_event(&mut self, _id: ConnId, _r: bool, _w: bool, _e: bool) {}
    fn process_backend_operations(&mut self) {}

    fn upstream_manager(&self) -> Arc<dyn MetricsSource> {
        self.metrics.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeConn {
        to_read: Vec<u8>,
        written: Vec<u8>,
    }

    impl ClientConn for FakeConn {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.to_read.is_empty() {
                return Err(std::io::Error::new(std::io::ErrorKind::WouldBlock, "empty"));
            }
            let n = self.to_read.len().min(buf.len());
            buf[..n].copy_from_slice(&self.to_read[..n]);
            self.to_read.drain(..n);
            Ok(n)
        }

        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    #[test]
    fn echo_pipeline_writes_back_what_it_reads() {
        let mut pipeline = EchoPipeline::new();
        let mut conn = FakeConn {
            to_read: b"hello".to_vec(),
            written: Vec::new(),
        };
        pipeline.on_accept(1, &mut conn, "127.0.0.1".parse().unwrap(), 1234);
        pipeline.on_readable(1, &mut conn);
        assert_eq!(conn.written, b"hello");
        pipeline.on_close(1);
    }

    #[test]
    fn null_pipeline_ignores_everything() {
        let mut pipeline = NullPipeline::new();
        let mut conn = FakeConn {
            to_read: b"x".to_vec(),
            written: Vec::new(),
        };
        pipeline.on_accept(1, &mut conn, "127.0.0.1".parse().unwrap(), 1234);
        pipeline.on_readable(1, &mut conn);
        assert!(conn.written.is_empty());
    }
}
