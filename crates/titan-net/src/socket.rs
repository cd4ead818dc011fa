// SPDX-License-Identifier: Apache-2.0

//! Socket utilities (§4.6): create a listening TCP socket with the exact
//! sequence the original gateway used — address reuse, optional port
//! sharing, bind, listen, then switch to non-blocking — closing any
//! partially constructed socket on failure.
//!
//! `socket2::Socket`'s `Drop` makes "every failure closes the fd before
//! returning" automatic: if any step below returns early, `socket` is
//! dropped and its fd closed without any explicit cleanup code.

use std::net::{SocketAddr, TcpListener as StdTcpListener};

use socket2::{Domain, Protocol, Socket, Type};

/// Default backlog for worker listen sockets (§4.6: "backlog >= 128").
pub const DEFAULT_BACKLOG: i32 = 128;

/// Create a non-blocking listening TCP socket bound to `address:port`.
///
/// `reuse_port` should be set for worker sockets so the kernel
/// distributes accepts across workers (§4.2, §4.6); the orchestrator
/// decides when to toggle it.
pub fn create_listening_socket(
    address: &str,
    port: u16,
    backlog: i32,
    reuse_port: bool,
) -> std::io::Result<StdTcpListener> {
    let addr: SocketAddr = format!("{address}:{port}").parse().map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid listen address {address}:{port}"),
        )
    })?;

    let domain = if addr.is_ipv6() {
        Domain::IPV6
    } else {
        Domain::IPV4
    };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    if reuse_port {
        set_reuse_port_if_supported(&socket)?;
    }
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    socket.set_nonblocking(true)?;
    Ok(socket.into())
}

#[cfg(unix)]
fn set_reuse_port_if_supported(socket: &Socket) -> std::io::Result<()> {
    socket.set_reuse_port(true)
}

#[cfg(not(unix))]
fn set_reuse_port_if_supported(_socket: &Socket) -> std::io::Result<()> {
    Ok(())
}
