//! Domain blocklist, grounded on `original_source/filters.c`'s
//! `filter_match`/`filter_match_any`: a filter matches a domain if it equals
//! it outright, is a dot-bounded prefix (`ads.` matches `ads.example.com`),
//! or a dot-bounded suffix (`example.com` matches `ads.example.com`), all
//! compared on the ASCII-lowercased byte form.
//!
//! The teacher models connection rejection as a pluggable [`ConnectionFilter`]
//! trait a caller implements; this proxy has exactly one filter policy (a
//! static domain list from argv, §6), so it's a concrete matcher rather than
//! a trait object.

use crate::bytes::ByteString;

/// An immutable, lowercased domain blocklist built once at startup from CLI
/// arguments and shared read-only across worker threads.
#[derive(Debug, Clone, Default)]
pub struct FilterList {
    filters: Vec<ByteString>,
}

impl FilterList {
    pub fn new() -> Self {
        FilterList {
            filters: Vec::new(),
        }
    }

    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FilterList {
            filters: args
                .into_iter()
                .map(|s| ByteString::from(s.as_ref()).to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ByteString> {
        self.filters.iter()
    }

    /// True if `domain` matches any filter in the list (case-insensitive).
    pub fn matches(&self, domain: &[u8]) -> bool {
        let lower = ByteString::from_slice(domain).to_ascii_lowercase();
        self.filters
            .iter()
            .any(|filter| filter_match(filter.as_bytes(), lower.as_bytes()))
    }

    /// Returns the first filter label that matched, for the "filtered"
    /// log line (§4.6/§4.8) which names the blocking filter.
    pub fn first_match<'a>(&'a self, domain: &[u8]) -> Option<&'a ByteString> {
        let lower = ByteString::from_slice(domain).to_ascii_lowercase();
        self.filters
            .iter()
            .find(|filter| filter_match(filter.as_bytes(), lower.as_bytes()))
    }
}

fn filter_match(filter: &[u8], domain: &[u8]) -> bool {
    if filter.len() > domain.len() {
        return false;
    }
    if filter.len() == domain.len() {
        return filter == domain;
    }

    if &domain[..filter.len()] == filter && domain[filter.len()] == b'.' {
        return true;
    }

    let offset = domain.len() - filter.len();
    if &domain[offset..] == filter && domain[offset - 1] == b'.' {
        return true;
    }

    false
}
