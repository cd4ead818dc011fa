// SPDX-License-Identifier: Apache-2.0

//! The admin listener's "minimal parser" (§4.5, §12.3): the request
//! line is split into method and path by the two spaces up to the
//! first newline; headers are never parsed; the body is whatever comes
//! after the first `\r\n\r\n`. Requests are read into a fixed 4 KiB
//! buffer, so a body larger than that may be truncated — admin callers
//! are trusted (§4.5).

/// Requests larger than this may be truncated (§4.5).
pub const MAX_REQUEST_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub body: &'a str,
}

/// Parse a raw request buffer. Returns `None` for anything that doesn't
/// look like `METHOD PATH ...\n` on its first line — the caller treats
/// that as a plain-text 400 (§4.5's "Invalid JSON or missing fields"
/// is a separate, JSON-bodied 400 for the revoke endpoint specifically).
pub fn parse(raw: &str) -> Option<ParsedRequest<'_>> {
    let line_end = raw.find('\n')?;
    let request_line = &raw[..line_end];
    let request_line = request_line.strip_suffix('\r').unwrap_or(request_line);

    let mut parts = request_line.splitn(3, ' ');
    let method = parts.next()?;
    let path = parts.next()?;
    if method.is_empty() || path.is_empty() {
        return None;
    }

    let body = match raw.find("\r\n\r\n") {
        Some(idx) => &raw[idx + 4..],
        None => "",
    };

    Some(ParsedRequest { method, path, body })
}
