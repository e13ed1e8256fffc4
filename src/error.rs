//! The error taxonomy that crosses module boundaries, as a single Rust `enum`
//! implementing `std::error::Error`, carrying an `io::Error` payload on
//! `ConnectionError` so parser code can use `?` against `std::io::Read`/`Write`
//! directly.
//!
//! `TooLong` deliberately doesn't distinguish "line too long" from "too many
//! headers" from "body too long" by itself — the worker already knows which
//! parser entry point it called, and that call site is what picks between
//! `414`/`413` on the request side or the flat `502` on the response side.
//! Splitting `TooLong` into one variant per call site would just move that
//! same information from the call site into the enum and back out again.

use std::fmt;
use std::io;

/// Errors a parser entry point (read request/response line, headers, body)
/// can return.
#[derive(Debug)]
pub enum ParseError {
    /// Socket read/write failed or closed prematurely.
    ConnectionError(io::Error),
    /// A size cap was hit (`LineTooLong` / `TooLong` in §7's taxonomy).
    TooLong,
    /// Grammar did not match (`MalformedLine` / `MalformedHeader`).
    MalformedLine,
    /// Method is not GET/HEAD/POST.
    BadMethod,
    /// HTTP version is not 1.0/1.1.
    BadVersion,
    /// `Content-Length` header is not a valid unsigned integer.
    BadContentLength,
    /// Header count exceeded `MAX_NUM_HEADERS`.
    TooManyHeaders,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::ConnectionError(e) => write!(f, "connection error: {e}"),
            ParseError::TooLong => write!(f, "size limit exceeded"),
            ParseError::MalformedLine => write!(f, "malformed line"),
            ParseError::BadMethod => write!(f, "bad method"),
            ParseError::BadVersion => write!(f, "bad HTTP version"),
            ParseError::BadContentLength => write!(f, "bad content-length"),
            ParseError::TooManyHeaders => write!(f, "too many headers"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::ConnectionError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ParseError {
    fn from(e: io::Error) -> Self {
        ParseError::ConnectionError(e)
    }
}

/// Errors from resolving and connecting to the origin. Kept distinct from [`ParseError`] since none of these ever
/// come from the grammar — the worker maps all three straight to `500`.
#[derive(Debug)]
pub enum DialError {
    Socket(io::Error),
    Resolve(io::Error),
    Connect(io::Error),
}

impl fmt::Display for DialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DialError::Socket(e) => write!(f, "unable to open socket: {e}"),
            DialError::Resolve(e) => write!(f, "error looking up host: {e}"),
            DialError::Connect(e) => write!(f, "unable to connect to host: {e}"),
        }
    }
}

impl std::error::Error for DialError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DialError::Socket(e) | DialError::Resolve(e) | DialError::Connect(e) => Some(e),
        }
    }
}
