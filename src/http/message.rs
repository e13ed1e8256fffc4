//! In-memory message model: a request-line-or-response-line, a header
//! list, and a body. The reference design unions the two line kinds inside
//! one message struct; per the spec's own Design Notes ("prefer two distinct
//! message types parameterized by the line kind; the extra type fences off
//! invalid mixes at compile time") this crate uses two separate types,
//! `Request` and `Response`, instead of a runtime tag.

use crate::bytes::ByteString;
use crate::http::types::{HeaderList, Method, Version};

/// A fully- or partially-populated request, built up phase by phase by the
/// parser (line → headers → body) exactly as §3's lifecycle describes.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Present iff the absolute-form request URI was used.
    pub domain: ByteString,
    /// Never carries the leading slash.
    pub path: ByteString,
    pub version: Version,
    pub headers: HeaderList,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: Method, domain: ByteString, path: ByteString, version: Version) -> Self {
        Request {
            method,
            domain,
            path,
            version,
            headers: HeaderList::new(),
            body: Vec::new(),
        }
    }

    pub fn has_domain(&self) -> bool {
        !self.domain.is_empty()
    }
}

/// A fully- or partially-populated response.
#[derive(Debug, Clone)]
pub struct Response {
    pub version: Version,
    pub status: u16,
    pub reason: ByteString,
    pub headers: HeaderList,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(version: Version, status: u16, reason: ByteString) -> Self {
        Response {
            version,
            status,
            reason,
            headers: HeaderList::new(),
            body: Vec::new(),
        }
    }
}
