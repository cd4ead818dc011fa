// SPDX-License-Identifier: Apache-2.0

//! A minimal client for Titan's admin listener (§4.5, §6), matching the
//! wire format `titan-admin` speaks: a request line, optional headers,
//! a blank-line-delimited body, and a response with a status line the
//! caller parses by splitting on whitespace. No HTTP client crate is
//! pulled in for this — the admin protocol is deliberately as small as
//! the server that speaks it.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use anyhow::{bail, Context, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

pub struct AdminResponse {
    pub status: u16,
    pub body: String,
}

pub struct AdminClient {
    addr: String,
}

impl AdminClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            addr: format!("{host}:{port}"),
        }
    }

    pub fn get(&self, path: &str) -> Result<AdminResponse> {
        self.request("GET", path, "")
    }

    pub fn post(&self, path: &str, body: &str) -> Result<AdminResponse> {
        self.request("POST", path, body)
    }

    fn request(&self, method: &str, path: &str, body: &str) -> Result<AdminResponse> {
        let socket_addr = self
            .addr
            .parse()
            .with_context(|| format!("invalid admin address {}", self.addr))?;
        let mut stream = TcpStream::connect_timeout(&socket_addr, CONNECT_TIMEOUT)
            .with_context(|| format!("could not connect to admin listener at {}", self.addr))?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;

        let request = format!(
            "{method} {path} HTTP/1.1\r\nHost: {host}\r\nContent-Length: {len}\r\n\r\n{body}",
            host = self.addr,
            len = body.len(),
        );
        stream.write_all(request.as_bytes())?;
        stream.shutdown(std::net::Shutdown::Write)?;

        let mut raw = String::new();
        stream.read_to_string(&mut raw)?;
        parse_response(&raw)
    }
}

fn parse_response(raw: &str) -> Result<AdminResponse> {
    let Some(header_end) = raw.find("\r\n\r\n") else {
        bail!("malformed admin response: no header terminator");
    };
    let (headers, rest) = raw.split_at(header_end);
    let body = &rest[4..];

    let status_line = headers
        .lines()
        .next()
        .context("malformed admin response: empty status line")?;
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .context("malformed admin response: missing status code")?
        .parse()
        .context("malformed admin response: non-numeric status code")?;

    Ok(AdminResponse {
        status,
        body: body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_and_body() {
        let raw = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"status\":\"healthy\"}";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "{\"status\":\"healthy\"}");
    }

    #[test]
    fn rejects_response_with_no_header_terminator() {
        assert!(parse_response("not a response").is_err());
    }
}
