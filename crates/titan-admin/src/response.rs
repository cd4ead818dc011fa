// SPDX-License-Identifier: Apache-2.0

//! Literal HTTP/1.1 response framing (§4.5, §6, §12.3): reason phrases,
//! `Content-Length`, `Content-Type`, `Connection: close`, and the
//! `Server: Titan-Admin/<version>` header are load-bearing text, not
//! illustrative — tests assert on them verbatim.

use std::io::{self, Write};

/// `Server: Titan-Admin/<version>` uses this crate's own package
/// version, which tracks the workspace version (`0.1.0` today, the
/// exact literal §8's end-to-end scenarios assert on).
const SERVER_HEADER: &str = concat!("Titan-Admin/", env!("CARGO_PKG_VERSION"));

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Write a complete HTTP/1.1 response to `writer` and flush it.
pub fn write_response<W: Write>(
    writer: &mut W,
    status: u16,
    content_type: &str,
    body: &str,
) -> io::Result<()> {
    write!(
        writer,
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: {content_type}\r\n\
         Content-Length: {len}\r\n\
         Connection: close\r\n\
         Server: {server}\r\n\
         \r\n\
         {body}",
        reason = reason_phrase(status),
        len = body.len(),
        server = SERVER_HEADER,
    )?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_exact_status_line_and_headers() {
        let mut buf = Vec::new();
        write_response(&mut buf, 200, "application/json", "{}").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.contains("Connection: close\r\n"));
        assert!(text.contains(&format!("Server: {SERVER_HEADER}\r\n")));
        assert!(text.ends_with("{}"));
    }

    #[test]
    fn unknown_status_falls_back_to_unknown_reason() {
        let mut buf = Vec::new();
        write_response(&mut buf, 599, "text/plain", "").unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("HTTP/1.1 599 Unknown\r\n"));
    }
}
