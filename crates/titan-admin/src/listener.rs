// SPDX-License-Identifier: Apache-2.0

//! The admin/control-plane HTTP listener (§4.5): a single accepting
//! thread, blocking I/O per connection, not performance-critical.
//! Binds 127.0.0.1 literally, resolving §9's Open Question in the
//! conservative direction the original already chose — the bind
//! itself is the enforcement, no separate 403 logic needed (§12.5).

use std::io::Read;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use serde::Serialize;
use socket2::{Domain, Protocol, Socket, Type};
use titan_core::config::Config;
use titan_core::global_state::GlobalState;
use titan_core::revocation::RevocationBroadcast;
use tracing::{debug, info, warn};

use crate::error::AdminError;
use crate::metrics::MetricsRenderer;
use crate::request::{self, MAX_REQUEST_BYTES};
use crate::response::write_response;
use crate::revoke::parse_revoke_body;

/// `listen(fd, 32)` in the original (`admin_server.cpp`); admin traffic
/// is low-volume and internal, so a small backlog is plenty.
const ADMIN_BACKLOG: i32 = 32;

#[derive(Serialize)]
struct HealthBody<'a> {
    status: &'a str,
    version: &'a str,
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

fn health_body() -> String {
    serde_json::to_string(&HealthBody {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
    .unwrap_or_default()
}

fn error_body(error: &str, message: &str) -> String {
    serde_json::to_string(&ErrorBody { error, message }).unwrap_or_default()
}

/// Shared, read-only context every accepted connection is handled
/// against. Cloned cheaply (an `Arc` clone) per connection rather than
/// passed by reference, so connection handling can be factored out of
/// the accept loop without lifetime gymnastics.
struct AdminCtx {
    metrics_path: String,
    global: GlobalState,
    broadcast: Arc<RevocationBroadcast>,
    renderer: Arc<dyn MetricsRenderer>,
}

/// The admin listener (§4.5). `start` binds and spawns the single
/// accepting thread; `stop` flips the running flag and shuts down a
/// duplicated socket handle to unblock the thread's in-progress
/// `accept()` (the safe equivalent of the original's `close(listen_fd_)`
/// waking a blocking accept on another thread).
pub struct AdminListener {
    running: Arc<AtomicBool>,
    shutdown_socket: Socket,
    thread: Option<thread::JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl AdminListener {
    pub fn start(
        config: &Config,
        global: GlobalState,
        broadcast: Arc<RevocationBroadcast>,
        renderer: Arc<dyn MetricsRenderer>,
    ) -> Result<Self, AdminError> {
        let addr: SocketAddr = format!("127.0.0.1:{}", config.metrics.port)
            .parse()
            .map_err(|_| AdminError::Bind {
                port: config.metrics.port,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "invalid metrics port",
                ),
            })?;

        let bind = |err_source: std::io::Error| AdminError::Bind {
            port: config.metrics.port,
            source: err_source,
        };

        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(bind)?;
        socket.set_reuse_address(true).map_err(bind)?;
        socket.bind(&addr.into()).map_err(bind)?;
        socket.listen(ADMIN_BACKLOG).map_err(bind)?;
        let shutdown_socket = socket.try_clone().map_err(bind)?;
        let listener: TcpListener = socket.into();
        let local_addr = listener.local_addr().map_err(bind)?;

        let running = Arc::new(AtomicBool::new(true));
        let ctx = Arc::new(AdminCtx {
            metrics_path: config.metrics.path.clone(),
            global,
            broadcast,
            renderer,
        });

        let thread_running = Arc::clone(&running);
        let thread = thread::Builder::new()
            .name("titan-admin".to_string())
            .spawn(move || run_accept_loop(listener, thread_running, ctx))
            .map_err(bind)?;

        info!(addr = %local_addr, "admin listener started");
        Ok(Self {
            running,
            shutdown_socket,
            thread: Some(thread),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting new connections and join the accept thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        let _ = self.shutdown_socket.shutdown(std::net::Shutdown::Both);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        info!("admin listener stopped");
    }
}

impl Drop for AdminListener {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop();
        }
    }
}

fn run_accept_loop(listener: TcpListener, running: Arc<AtomicBool>, ctx: Arc<AdminCtx>) {
    while running.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, _peer)) => handle_connection(stream, &ctx),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) if !running.load(Ordering::Acquire) => break,
            Err(e) => {
                warn!(error = %e, "admin accept error");
                continue;
            }
        }
    }
}

fn handle_connection(mut stream: TcpStream, ctx: &AdminCtx) {
    let mut buf = [0u8; MAX_REQUEST_BYTES];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let raw = String::from_utf8_lossy(&buf[..n]);

    let Some(req) = request::parse(&raw) else {
        let _ = write_response(&mut stream, 400, "text/plain", "Bad Request");
        return;
    };

    let (status, content_type, body) = route(&req, ctx);
    if write_response(&mut stream, status, &content_type, &body).is_err() {
        debug!("failed to write admin response");
    }
}

fn route(req: &request::ParsedRequest<'_>, ctx: &AdminCtx) -> (u16, String, String) {
    match (req.method, req.path) {
        ("GET", "/health") | ("GET", "/_health") => (
            200,
            "application/json".to_string(),
            health_body(),
        ),
        ("GET", path) if path == "/metrics" || path == ctx.metrics_path => metrics_response(ctx),
        ("POST", "/_admin/jwt/revoke") => revoke_response(req.body, ctx),
        _ => (404, "text/plain".to_string(), "Not Found".to_string()),
    }
}

fn metrics_response(ctx: &AdminCtx) -> (u16, String, String) {
    match ctx.global.metrics_source() {
        Some(source) => {
            let body = ctx.renderer.render(&source, 0);
            (200, "text/plain; version=0.0.4".to_string(), body)
        }
        None => (404, "text/plain".to_string(), "metrics not yet published".to_string()),
    }
}

fn revoke_response(body: &str, ctx: &AdminCtx) -> (u16, String, String) {
    match parse_revoke_body(body) {
        Ok(entry) => match ctx.broadcast.push(entry) {
            Ok(()) => (
                200,
                "application/json".to_string(),
                serde_json::to_string(&StatusBody {
                    status: "ok",
                    message: "Token revoked successfully",
                })
                .unwrap_or_default(),
            ),
            Err(_) => (
                503,
                "application/json".to_string(),
                error_body("service_unavailable", "revocation queue unavailable"),
            ),
        },
        Err(e) => (
            400,
            "application/json".to_string(),
            error_body("bad_request", &e.message()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Write};

    use titan_core::config::Config;
    use titan_core::global_state::GlobalState;
    use titan_core::revocation::RevocationBroadcast;

    use super::*;
    use crate::metrics::NullMetricsRenderer;

    fn start_test_listener() -> AdminListener {
        let mut config = Config::default();
        config.metrics.port = 0;
        AdminListener::start(
            &config,
            GlobalState::new(),
            Arc::new(RevocationBroadcast::new(1)),
            Arc::new(NullMetricsRenderer),
        )
        .unwrap()
    }

    fn request(addr: SocketAddr, raw: &str) -> (u16, String, String) {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        stream.shutdown(std::net::Shutdown::Write).unwrap();

        let mut reader = BufReader::new(stream);
        let mut status_line = String::new();
        reader.read_line(&mut status_line).unwrap();
        let status: u16 = status_line.split_whitespace().nth(1).unwrap().parse().unwrap();

        let mut headers = String::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            headers.push_str(&line);
        }

        let mut body = String::new();
        std::io::Read::read_to_string(&mut reader, &mut body).unwrap();
        (status, headers, body)
    }

    #[test]
    fn health_endpoint_returns_literal_body() {
        let listener = start_test_listener();
        let (status, _headers, body) =
            request(listener.local_addr(), "GET /health HTTP/1.1\r\n\r\n");
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"status":"healthy","version":"0.1.0"}"#);
    }

    #[test]
    fn underscore_health_alias_works() {
        let listener = start_test_listener();
        let (status, _, _) = request(listener.local_addr(), "GET /_health HTTP/1.1\r\n\r\n");
        assert_eq!(status, 200);
    }

    #[test]
    fn unknown_path_is_404() {
        let listener = start_test_listener();
        let (status, _, body) = request(listener.local_addr(), "GET /nope HTTP/1.1\r\n\r\n");
        assert_eq!(status, 404);
        assert_eq!(body, "Not Found");
    }

    #[test]
    fn metrics_before_publish_is_404() {
        let listener = start_test_listener();
        let (status, _, _) = request(listener.local_addr(), "GET /metrics HTTP/1.1\r\n\r\n");
        assert_eq!(status, 404);
    }

    #[test]
    fn revoke_with_valid_body_returns_200_and_enqueues() {
        let listener = start_test_listener();
        let raw = "POST /_admin/jwt/revoke HTTP/1.1\r\nContent-Length: 30\r\n\r\n{\"jti\":\"abc\",\"exp\":2000000000}";
        let (status, _, body) = request(listener.local_addr(), raw);
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"status":"ok","message":"Token revoked successfully"}"#);
    }

    #[test]
    fn revoke_missing_exp_is_400_with_exp_in_message() {
        let listener = start_test_listener();
        let raw = "POST /_admin/jwt/revoke HTTP/1.1\r\nContent-Length: 14\r\n\r\n{\"jti\":\"abc\"}";
        let (status, _, body) = request(listener.local_addr(), raw);
        assert_eq!(status, 400);
        assert!(body.contains("exp"));
    }

    #[test]
    fn malformed_request_line_is_plain_text_400() {
        let listener = start_test_listener();
        let (status, _, body) = request(listener.local_addr(), "not a request at all");
        assert_eq!(status, 400);
        assert_eq!(body, "Bad Request");
    }
}
