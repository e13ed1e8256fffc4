//! Builds the canned HTML error response a worker sends its client for any
//! protocol or upstream failure, grounded on
//! `original_source/http_worker_thread.c`'s `handle_error` and its
//! `error_template`, and on `http_manip.c`'s `set_body` (which is where the
//! original adds `Content-Length` for a body it just set — there is no
//! automatic length computation in the writer itself, so this module adds
//! it explicitly, the same way `set_body` does).

use crate::http::message::Response;
use crate::http::types::{StatusCode, Version};

/// Builds a populated [`Response`] for `code`/`message`: `Connection: close`
/// and `Content-Type: text/html` always, `Allow: GET, HEAD, POST` only for
/// 405, and an HTML body from the fixed template. Codes outside the stable
/// table (`StatusCode::from_code`) get an empty phrase — the spec's worker
/// never actually constructs one of those, but the responder itself doesn't
/// assume otherwise.
pub fn build(code: u16, message: &str) -> Response {
    let phrase = StatusCode::from_code(code).map(|s| s.phrase()).unwrap_or("");

    let mut response = Response::new(Version::Http11, code, phrase.into());
    response.headers.push("Connection", "close");
    response.headers.push("Content-Type", "text/html");
    if code == 405 {
        response.headers.push("Allow", "GET, HEAD, POST");
    }

    let body = format!(
        "<html><head><title>{code} {phrase}</title></head>\
         <body><h1>{code} {phrase}</h1>{message}</body></html>"
    );
    response.headers.push("Content-Length", body.len().to_string());
    response.body = body.into_bytes();
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_body_carries_the_filter_message() {
        let resp = build(403, "Blocked by Proxy Filter");
        let body = String::from_utf8(resp.body.clone()).unwrap();
        assert!(body.contains("403 Forbidden"));
        assert!(body.contains("Blocked by Proxy Filter"));
        assert_eq!(resp.headers.get("Content-Type"), Some(&b"text/html"[..]));
        assert_eq!(resp.headers.get("Connection"), Some(&b"close"[..]));
    }

    #[test]
    fn method_not_allowed_carries_the_allow_header() {
        let resp = build(405, "Error: bad method");
        assert_eq!(resp.headers.get("Allow"), Some(&b"GET, HEAD, POST"[..]));
    }

    #[test]
    fn other_codes_have_no_allow_header() {
        let resp = build(400, "Error: Malformed request line");
        assert!(!resp.headers.has("Allow"));
    }

    #[test]
    fn content_length_matches_the_actual_body() {
        let resp = build(500, "Error: Unable to open socket");
        let declared: usize = std::str::from_utf8(resp.headers.get("Content-Length").unwrap())
            .unwrap()
            .parse()
            .unwrap();
        assert_eq!(declared, resp.body.len());
    }

    #[test]
    fn unknown_code_gets_an_empty_phrase() {
        let resp = build(499, "Error: whatever");
        assert_eq!(resp.reason.as_bytes(), b"");
        assert!(String::from_utf8(resp.body.clone()).unwrap().contains("499 "));
    }
}
