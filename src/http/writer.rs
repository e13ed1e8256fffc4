//! Serializes a populated [`Request`]/[`Response`] to a socket,
//! grounded on `original_source/http_write.c`'s `write_request_line` /
//! `write_response_line` / `write_headers` / `write_common` shape, and on
//! the teacher's `Response` builder (`http/response.rs`) for the
//! accumulate-into-one-buffer-then-write-once idiom — adapted from the
//! teacher's incremental fluent builder (`status()` → `header()` → `body()`,
//! called by a handler over several method calls) to a single function that
//! serializes an already-fully-populated message in one pass, since this
//! proxy never builds a message field by field the way a handler does.

use std::io::{self, Write};

use crate::config;
use crate::http::message::{Request, Response};
use crate::http::types::HeaderList;

fn write_headers_into(buf: &mut Vec<u8>, headers: &HeaderList) {
    for header in headers.iter() {
        buf.extend_from_slice(header.name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(header.value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(b"\r\n");
}

/// Serializes `request` into one buffer, writes it in a single call, and
/// flushes (`FLUSH_HTTP_MESSAGES`, §4.3) so a slow/failing origin read can't
/// leave bytes parked in the socket's userspace buffer.
pub fn write_request<W: Write>(request: &Request, out: &mut W) -> io::Result<()> {
    let mut buf = Vec::with_capacity(config::AUTOBUF_INITIAL_SIZE);

    buf.extend_from_slice(request.method.as_bytes());
    buf.push(b' ');
    if request.has_domain() {
        buf.extend_from_slice(b"http://");
        buf.extend_from_slice(request.domain.as_bytes());
    }
    buf.push(b'/');
    buf.extend_from_slice(request.path.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(request.version.as_bytes());
    buf.extend_from_slice(b"\r\n");

    write_headers_into(&mut buf, &request.headers);
    buf.extend_from_slice(&request.body);

    out.write_all(&buf)?;
    if config::FLUSH_HTTP_MESSAGES {
        out.flush()?;
    }
    Ok(())
}

/// Serializes `response` into one buffer, writes it in a single call, and
/// flushes for the same reason as [`write_request`].
pub fn write_response<W: Write>(response: &Response, out: &mut W) -> io::Result<()> {
    let mut buf = Vec::with_capacity(config::AUTOBUF_INITIAL_SIZE);

    buf.extend_from_slice(response.version.as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(response.status.to_string().as_bytes());
    buf.push(b' ');
    buf.extend_from_slice(response.reason.as_bytes());
    buf.extend_from_slice(b"\r\n");

    write_headers_into(&mut buf, &response.headers);
    buf.extend_from_slice(&response.body);

    out.write_all(&buf)?;
    if config::FLUSH_HTTP_MESSAGES {
        out.flush()?;
    }
    Ok(())
}
