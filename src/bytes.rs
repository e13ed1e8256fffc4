//! Owned byte-string buffer and a cheap non-owning view over one.
//!
//! The wire-level data this crate moves around — domains, paths, header names
//! and values, bodies — is binary, not `str`. `ByteString` is the owned form;
//! `ByteRef` is a borrowed slice tied to its owner's lifetime. Unlike the
//! reference implementation's C strings, there is no hidden null terminator
//! relied on for safety: Rust slices already carry their own length. The one
//! place a terminator matters (handing a domain to the system resolver) goes
//! through `ByteString::as_cstr`, which only pays for the allocation there.

use std::ffi::CString;
use std::fmt;

/// An owned, growable run of bytes.
#[derive(Clone, Default, Eq)]
pub struct ByteString(Vec<u8>);

impl ByteString {
    pub fn new() -> Self {
        ByteString(Vec::new())
    }

    pub fn with_capacity(cap: usize) -> Self {
        ByteString(Vec::with_capacity(cap))
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        ByteString(bytes.to_vec())
    }

    pub fn push(&mut self, byte: u8) {
        self.0.push(byte);
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.0.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_ref(&self) -> ByteRef<'_> {
        ByteRef(&self.0)
    }

    /// Lowercases ASCII bytes only; matches the filter/header comparison rule
    ///, which is explicitly byte-exact on the ASCII-lowercased form.
    pub fn to_ascii_lowercase(&self) -> ByteString {
        let mut out = self.0.clone();
        out.make_ascii_lowercase();
        ByteString(out)
    }

    /// Null-terminated form for APIs that want a C string (the system resolver).
    /// Fails only if the buffer itself contains an interior NUL, which a
    /// well-formed domain never does.
    pub fn as_cstr(&self) -> Result<CString, std::ffi::NulError> {
        CString::new(self.0.clone())
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "ByteString({s:?})"),
            Err(_) => write!(f, "ByteString({:?})", self.0),
        }
    }
}

impl PartialEq for ByteString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        ByteString::from_slice(bytes)
    }
}

impl From<&str> for ByteString {
    fn from(s: &str) -> Self {
        ByteString::from_slice(s.as_bytes())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(v: Vec<u8>) -> Self {
        ByteString(v)
    }
}

impl From<String> for ByteString {
    fn from(s: String) -> Self {
        ByteString(s.into_bytes())
    }
}

/// A non-owning view over a byte run, borrowed from a [`ByteString`] or a
/// `'static` literal. Safe because it is an ordinary Rust slice reference:
/// the borrow checker, not a reused-buffer convention, keeps it valid.
#[derive(Clone, Copy, Eq)]
pub struct ByteRef<'a>(&'a [u8]);

impl<'a> ByteRef<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteRef(bytes)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_owned(&self) -> ByteString {
        ByteString::from_slice(self.0)
    }

    /// Case-insensitive ASCII equality, used for header-name lookup and
    /// `Transfer-Encoding: chunked` detection.
    pub fn eq_ignore_ascii_case(&self, other: &[u8]) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for ByteRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl fmt::Debug for ByteRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.0) {
            Ok(s) => write!(f, "ByteRef({s:?})"),
            Err(_) => write!(f, "ByteRef({:?})", self.0),
        }
    }
}
