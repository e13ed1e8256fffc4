//! HTTP grammar: four case-insensitive recognizers compiled once at
//! process start and never mutated again.
//!
//! The reference design specifies these as POSIX-ERE-equivalent patterns,
//! a build-time artefact of the original C implementation having no regex
//! engine with non-capturing groups.
//! We use `regex` (grounded on `examples/other_examples/manifests/bytedance-g3`,
//! a real forward-proxy crate in the retrieval pack) with named, non-capturing
//! groups, and compile each pattern exactly once into a `LazyLock<Regex>`.

use regex::bytes::Regex;
use std::sync::LazyLock;

/// `alphanumerics, ._~:/?#[@!$&'()*+,;=-], or %[0-9a-f]{2}`.
const URI_CHAR_CLASS: &str = r"[A-Za-z0-9._~:/?#\[\]@!$&'()*+,;=-]|%[0-9a-fA-F]{2}";
/// Same as above minus `/` — the domain character class.
const DOMAIN_CHAR_CLASS: &str = r"[A-Za-z0-9._~:?#\[\]@!$&'()*+,;=-]|%[0-9a-fA-F]{2}";

// `(?i)` makes every pattern case-insensitive end to end, matching the
// original's blanket `regcomp(..., REG_ICASE | REG_EXTENDED)` — not just the
// method token, but also the literal `http://` and `HTTP/` scheme tokens, so
// e.g. `http/1.1` or `HTTP://example.com/x HTTP/1.1` parse exactly as the
// original accepts them (the version number itself is still checked strictly
// afterward, §9 "lenient parse, strict reject").

pub static REQUEST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is)\A(?P<method>[A-Za-z]+) (?:http://(?P<domain>(?:{DOMAIN_CHAR_CLASS})*))?/(?P<path>(?:{URI_CHAR_CLASS})*) +HTTP/(?P<major>[0-9]+)\.(?P<minor>[0-9]+)\r?\n\z"
    ))
    .expect("request line grammar is a fixed, valid pattern")
});

pub static RESPONSE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\AHTTP/(?P<major>[0-9]+)\.(?P<minor>[0-9]+) (?P<status>[1-5][0-9][0-9]) (?P<reason>[\x20-\x7e]*)\r?\n\z")
        .expect("response line grammar is a fixed, valid pattern")
});

/// Anchored at the start only: header lines are matched one at a time
/// against a buffer that ends right after the line, so there is nothing
/// trailing to anchor `\z` against.
pub static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\A(?P<name>[\x21-\x39\x3b-\x7e]+):[ \t]*(?P<value>[\x20-\x7e]+(?:\r?\n[ \t]+[\x20-\x7e]+)*)\r?\n")
        .expect("header line grammar is a fixed, valid pattern")
});

pub static CHUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\A(?P<size>[0-9a-fA-F]+)(?:;[^\r\n]*)?\r?\n\z")
        .expect("chunk header grammar is a fixed, valid pattern")
});

/// Forces all four patterns to compile, surfacing a broken grammar as a
/// startup failure rather than lazily on the first request (§6 init order:
/// grammar is first in the DAG precisely so this can't happen mid-traffic).
pub fn init() {
    LazyLock::force(&REQUEST_LINE);
    LazyLock::force(&RESPONSE_LINE);
    LazyLock::force(&HEADER_LINE);
    LazyLock::force(&CHUNK_HEADER);
}
