//! The per-connection worker state machine: one OS thread per
//! accepted client connection, driving read → validate → dial → forward →
//! relay → report, with a strict per-phase mapping from failure to status
//! code and log message. Grounded on `original_source/http_worker_thread.c`'s
//! `http_worker_thread`, whose `ThreadData` (client socket/address, server
//! socket, request, response) is this module's [`WorkerContext`] plus the
//! local state each call builds up and returns rather than mutates in
//! place.
//!
//! The original runs all of this in a `while (state != cs_close)` loop to
//! leave room for persistent connections it never actually uses (every path
//! sets `state = cs_close` right after validation). This implementation
//! drops the loop entirely — a worker always closes after exactly one
//! request/response pair — and keeps the rest of the shape.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use socket2::{Domain, Protocol, Socket, Type};

use crate::bytes::ByteString;
use crate::config::Limits;
use crate::error::{DialError, ParseError};
use crate::error_response;
use crate::filter::FilterList;
use crate::http::message::{Request, Response};
use crate::http::parser::{self, LineReader};
use crate::http::types::Version;
use crate::http::writer;
use crate::print_queue::PrintQueue;
use crate::stats::Stats;

/// Everything a worker thread needs that outlives the connection itself:
/// the read-only filter list and grammar-backed limits, and the shared
/// stat counters / print queue singletons.
pub struct WorkerContext {
    pub filters: FilterList,
    pub stats: Arc<Stats>,
    pub print: PrintQueue,
    pub limits: Limits,
}

/// The three terminal states a worker can reach (`DONE-success`,
/// `DONE-filtered`, `DONE-error`), carrying whatever each needs to report
/// and, for success/filtered, to respond with.
enum Outcome {
    Success {
        response: Response,
    },
    Filtered,
    Error {
        /// `None` for `ConnectionError`, which gets "log, no response"
        /// rather than a client-visible status.
        code: Option<u16>,
        message: &'static str,
    },
}

/// The request-line fields a log line needs, captured right after the request line parses so later failures
/// can still report a meaningful "METHOD http://domain/path", matching the
/// original's `get_log_string`.
struct LogInfo {
    method: &'static str,
    domain: String,
    path: String,
}

impl LogInfo {
    fn from_request(request: &Request) -> Self {
        LogInfo {
            method: std::str::from_utf8(request.method.as_bytes()).unwrap_or("?"),
            domain: String::from_utf8_lossy(request.domain.as_bytes()).into_owned(),
            path: String::from_utf8_lossy(request.path.as_bytes()).into_owned(),
        }
    }

    fn line(&self, client_ip: &str) -> String {
        format!(
            "{client_ip}: {} http://{}/{}",
            self.method, self.domain, self.path
        )
    }
}

/// Spawns the worker thread for one accepted connection and returns its
/// handle for the connection manager to register and later join.
pub fn spawn(client: TcpStream, client_addr: SocketAddr, ctx: Arc<WorkerContext>) -> JoinHandle<()> {
    thread::spawn(move || run(client, client_addr, &ctx))
}

fn run(mut client: TcpStream, client_addr: SocketAddr, ctx: &WorkerContext) {
    let client_ip = client_addr.ip().to_string();
    ctx.print.submit_debug("Reading request");

    let (outcome, info) = process(
        &client,
        &ctx.limits,
        &ctx.filters,
        &ctx.print,
        crate::config::ORIGIN_PORT,
    );
    finish(&mut client, &client_ip, outcome, info, ctx);

    // `client` (and, inside `process`, the origin socket) close here on drop,
    // idempotently.
}

/// Runs the request-read/validate/dial/forward/relay pipeline against an
/// already-accepted client socket, returning the terminal [`Outcome`] plus
/// whatever log fields were captured along the way. Narrates each phase
/// through `submit_debug` (a no-op unless `config::DEBUG_PRINT`), matching
/// `http_worker_thread.c`'s own step-by-step tracing.
///
/// `origin_port` is always `config::ORIGIN_PORT` (80) in production; it's a
/// parameter rather than a constant baked into [`dial`] so end-to-end tests
/// can point the worker at a loopback fake origin on an ephemeral port
/// instead of a real port-80 listener.
fn process(
    client: &TcpStream,
    limits: &Limits,
    filters: &FilterList,
    print: &PrintQueue,
    origin_port: u16,
) -> (Outcome, Option<LogInfo>) {
    let mut reader = LineReader::new(client, limits.autobuf_initial_size);

    print.submit_debug("Reading request line");
    let mut request = match parser::read_request_line(&mut reader, limits) {
        Ok(r) => r,
        Err(e) => return (map_request_line_error(e), None),
    };
    let info = LogInfo::from_request(&request);

    print.submit_debug("Reading headers");
    if let Err(e) = parser::read_headers(&mut reader, &mut request.headers, limits) {
        return (map_headers_error(e), Some(info));
    }

    print.submit_debug("Reading body");
    request.body = match parser::read_body(&mut reader, &mut request.headers, limits) {
        Ok(body) => body,
        Err(e) => return (map_body_error(e), Some(info)),
    };

    // VALIDATE
    print.submit_debug("Checking HTTP");
    if filters.matches(request.domain.as_bytes()) {
        return (Outcome::Filtered, Some(info));
    }

    if request.version == Version::Http11 && !request.headers.has("Host") {
        return (
            Outcome::Error {
                code: Some(400),
                message: "Error: missing Host: header",
            },
            Some(info),
        );
    }

    if request.version == Version::Http11 && !request.headers.has("Connection") {
        request.headers.push("Connection", "close");
    }

    // DIAL + FORWARD
    print.submit_debug("Forwarding request");
    print.submit_debug("Opening initial connection to server");
    let origin = match dial(&request.domain, origin_port, print) {
        Ok(stream) => stream,
        Err(e) => return (dial_error_outcome(&e), Some(info)),
    };

    print.submit_debug("Writing request");
    if writer::write_request(&request, &mut &origin).is_err() {
        return (
            Outcome::Error {
                code: Some(502),
                message: "Error: error writing request to server",
            },
            Some(info),
        );
    }

    // GET RESPONSE
    print.submit_debug("Reading response");
    let mut origin_reader = LineReader::new(&origin, limits.autobuf_initial_size);
    let mut response = match parser::read_response_line(&mut origin_reader, limits) {
        Ok(r) => r,
        Err(_) => {
            return (
                Outcome::Error {
                    code: Some(502),
                    message: "Error reading response line",
                },
                Some(info),
            )
        }
    };
    if parser::read_headers(&mut origin_reader, &mut response.headers, limits).is_err() {
        return (
            Outcome::Error {
                code: Some(502),
                message: "Error reading response headers",
            },
            Some(info),
        );
    }
    response.body = match parser::read_body(&mut origin_reader, &mut response.headers, limits) {
        Ok(body) => body,
        Err(_) => {
            return (
                Outcome::Error {
                    code: Some(502),
                    message: "Error reading response body",
                },
                Some(info),
            )
        }
    };

    normalize_for_relay(&mut response);

    print.submit_debug("Writing response");
    (Outcome::Success { response }, Some(info))
}

/// The origin response's body has already been fully decoded by the time it
/// reaches here — chunked or fixed, it's just bytes now (§9 Design Notes,
/// "the source decodes and buffers the full body before forwarding"). A
/// stale `Transfer-Encoding: chunked` header would tell the client to
/// expect chunk framing that no longer exists on the wire, so it's dropped
/// in favor of an accurate `Content-Length`.
fn normalize_for_relay(response: &mut Response) {
    response.headers.remove("Transfer-Encoding");
    response.headers.remove("Content-Length");
    response
        .headers
        .push("Content-Length", response.body.len().to_string());
}

fn map_request_line_error(e: ParseError) -> Outcome {
    match e {
        ParseError::ConnectionError(_) => Outcome::Error {
            code: None,
            message: "Error: Connection Error",
        },
        ParseError::TooLong => Outcome::Error {
            code: Some(414),
            message: "Error: Request line too long",
        },
        ParseError::BadMethod => Outcome::Error {
            code: Some(405),
            message: "Error: bad method",
        },
        ParseError::BadVersion => Outcome::Error {
            code: Some(505),
            message: "Error: bad HTTP version",
        },
        ParseError::MalformedLine
        | ParseError::BadContentLength
        | ParseError::TooManyHeaders => Outcome::Error {
            code: Some(400),
            message: "Error: Malformed request line",
        },
    }
}

fn map_headers_error(e: ParseError) -> Outcome {
    match e {
        ParseError::ConnectionError(_) => Outcome::Error {
            code: None,
            message: "Error: Connection Error",
        },
        ParseError::TooLong => Outcome::Error {
            code: Some(413),
            message: "Error: Too much header data sent",
        },
        ParseError::TooManyHeaders => Outcome::Error {
            code: Some(413),
            message: "Error: Too many headers sent",
        },
        ParseError::MalformedLine
        | ParseError::BadMethod
        | ParseError::BadVersion
        | ParseError::BadContentLength => Outcome::Error {
            code: Some(400),
            message: "Error: Malformed headers",
        },
    }
}

fn map_body_error(e: ParseError) -> Outcome {
    match e {
        ParseError::ConnectionError(_) => Outcome::Error {
            code: None,
            message: "Error: Connection Error",
        },
        ParseError::BadContentLength => Outcome::Error {
            code: Some(400),
            message: "Error: Content-Length malformed",
        },
        ParseError::TooLong => Outcome::Error {
            code: Some(413),
            message: "Error: Body too long",
        },
        ParseError::MalformedLine
        | ParseError::BadMethod
        | ParseError::BadVersion
        | ParseError::TooManyHeaders => Outcome::Error {
            code: Some(400),
            message: "Error: Chunk size line malformed",
        },
    }
}

fn dial_error_outcome(e: &DialError) -> Outcome {
    let message = match e {
        DialError::Socket(_) => "Error: Unable to open socket",
        DialError::Resolve(_) => "Error: error looking up host",
        DialError::Connect(_) => "Error: unable to connect to host",
    };
    Outcome::Error {
        code: Some(500),
        message,
    }
}

/// Resolves the request's domain to an IPv4 address for `port` and
/// connects. Uses `socket2` (as the listener does,
/// §6) so socket construction is a distinct, separately-failing step from
/// `connect`, matching the original's own `socket()`/`getaddrinfo()`/
/// `connect()` sequence.
fn dial(domain: &ByteString, port: u16, print: &PrintQueue) -> Result<TcpStream, DialError> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP)).map_err(DialError::Socket)?;

    print.submit_debug("Looking up host");
    let host = std::str::from_utf8(domain.as_bytes())
        .map_err(|e| DialError::Resolve(io::Error::new(io::ErrorKind::InvalidData, e)))?;

    let addr = (host, port)
        .to_socket_addrs()
        .map_err(DialError::Resolve)?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| {
            DialError::Resolve(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "no IPv4 address for host",
            ))
        })?;

    print.submit_debug("Connecting to host");
    socket.connect(&addr.into()).map_err(DialError::Connect)?;
    Ok(socket.into())
}

/// Finishes a connection: writes the client-visible response (if any),
/// bumps the matching stat counter, and emits the one log line §4.6
/// mandates per connection.
fn finish(client: &mut TcpStream, client_ip: &str, outcome: Outcome, info: Option<LogInfo>, ctx: &WorkerContext) {
    match outcome {
        Outcome::Success { response } => {
            if writer::write_response(&response, &mut &*client).is_err() {
                // "a failure here is logged only (the client is already in
                // an unrecoverable state)" — §4.6 "Dial and forward".
                ctx.print.submit(format!("{client_ip} [ERROR] Error writing response"));
            }
            ctx.stats.add_success();
            let line = info.map(|i| i.line(client_ip)).unwrap_or_else(|| client_ip.to_string());
            ctx.print.submit(line);
        }
        Outcome::Filtered => {
            let response = error_response::build(403, "Blocked by Proxy Filter");
            let _ = writer::write_response(&response, &mut &*client);
            ctx.stats.add_filtered();
            let line = info.map(|i| i.line(client_ip)).unwrap_or_else(|| client_ip.to_string());
            ctx.print.submit(format!("{line} [FILTERED]"));
        }
        Outcome::Error { code, message } => {
            ctx.stats.add_error();
            if let Some(code) = code {
                let response = error_response::build(code, message);
                let _ = writer::write_response(&response, &mut &*client);
            }
            ctx.print.submit(format!("{client_ip} [ERROR] {message}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytes::ByteString;
    use crate::http::types::Method;

    #[test]
    fn log_info_formats_the_contractual_line() {
        let req = Request::new(
            Method::Get,
            ByteString::from("example.test"),
            ByteString::from("hello"),
            Version::Http10,
        );
        let info = LogInfo::from_request(&req);
        assert_eq!(info.line("127.0.0.1"), "127.0.0.1: GET http://example.test/hello");
    }

    #[test]
    fn normalize_for_relay_replaces_chunked_framing_with_content_length() {
        let mut resp = Response::new(Version::Http11, 200, ByteString::from("OK"));
        resp.headers.push("Transfer-Encoding", "chunked");
        resp.body = b"hello world".to_vec();
        normalize_for_relay(&mut resp);
        assert!(!resp.headers.has("Transfer-Encoding"));
        assert_eq!(resp.headers.get("Content-Length"), Some(&b"11"[..]));
    }

    #[test]
    fn dial_on_an_unroutable_domain_is_a_resolve_error() {
        let domain = ByteString::from("this.domain.is.not.resolvable.invalid");
        let (print, print_thread) = crate::print_queue::spawn();
        match dial(&domain, 80, &print) {
            Err(DialError::Resolve(_)) => {}
            other => panic!("expected a resolve error, got {other:?}"),
        }
        drop(print);
        print_thread.join();
    }

    // --- End-to-end scenarios (spec.md §8) -----------------------------
    //
    // Each test binds two ephemeral loopback listeners: one standing in for
    // the client (a real `TcpStream` connects to it and the accepted socket
    // is fed to `process`, exactly as `listener::accept_loop` would hand a
    // socket to a worker), and one standing in for the origin (`process` is
    // given its ephemeral port via the `origin_port` parameter instead of
    // the production `config::ORIGIN_PORT`, so no real network or port-80
    // listener is required). A background thread plays the client; the test
    // body plays the origin (or vice versa), so both sides of the relay run
    // concurrently without deadlocking on each other's reads/writes.

    use crate::filter::FilterList;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    fn test_limits() -> Limits {
        Limits::default()
    }

    /// Connects a client to `listener`, writes `request` and reads the full
    /// response off the socket until the peer closes (matching this proxy's
    /// always-`Connection: close` behavior), returning the raw response
    /// bytes over `tx`.
    fn spawn_test_client(addr: SocketAddr, request: &'static [u8], tx: mpsc::Sender<Vec<u8>>) {
        thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).expect("client connects");
            stream.write_all(request).expect("client writes request");
            let mut response = Vec::new();
            let _ = stream.read_to_end(&mut response);
            let _ = tx.send(response);
        });
    }

    /// Accepts exactly one connection on an ephemeral loopback listener and
    /// hands back the listener's port plus the accepted worker-side socket,
    /// mirroring `listener::accept_loop`'s hand-off to `worker::spawn`.
    fn accept_one_client(request: &'static [u8]) -> (TcpStream, Vec<u8>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind client listener");
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        spawn_test_client(addr, request, tx);
        let (worker_socket, _addr) = listener.accept().expect("accept client connection");
        let response = rx.recv().expect("client thread reports the response it read");
        (worker_socket, response)
    }

    /// Runs a fake origin on an ephemeral loopback port: accepts exactly one
    /// connection, returns whatever the worker wrote to it (the forwarded
    /// request) after writing `origin_response` back and closing.
    fn spawn_fake_origin(origin_response: &'static [u8]) -> (u16, mpsc::Receiver<Vec<u8>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fake origin listener");
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _addr) = listener.accept().expect("accept origin connection");
            let mut forwarded = Vec::new();
            let _ = stream.read_to_end(&mut forwarded);
            let _ = stream.write_all(origin_response);
            let _ = tx.send(forwarded);
        });
        (port, rx)
    }

    #[test]
    fn scenario_happy_get_relays_the_origin_response_and_counts_a_success() {
        // Scenario 1: happy GET, domain "127.0.0.1" so it resolves to the
        // fake origin bound above instead of a real network host.
        let (origin_port, origin_rx) = spawn_fake_origin(b"HTTP/1.0 200 OK\r\nContent-Length: 5\r\n\r\nhello");

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind client listener");
        let addr = listener.local_addr().unwrap();
        let request = b"GET http://127.0.0.1/hello HTTP/1.0\r\nHost: 127.0.0.1\r\n\r\n" as &[u8];
        let (tx, rx) = mpsc::channel();
        spawn_test_client(addr, request, tx);
        let (mut client_socket, _client_addr) = listener.accept().unwrap();
        {
            let (print, print_thread) = crate::print_queue::spawn();
            let (outcome, info) = process(
                &client_socket,
                &test_limits(),
                &FilterList::new(),
                &print,
                origin_port,
            );
            match &outcome {
                Outcome::Success { .. } => {}
                _ => panic!("expected success"),
            }
            let ctx = WorkerContext {
                filters: FilterList::new(),
                stats: Arc::new(Stats::new(&FilterList::new())),
                print: print.clone(),
                limits: test_limits(),
            };
            finish(&mut client_socket, "127.0.0.1", outcome, info, &ctx);
            drop(print);
            print_thread.join();
        }
        drop(client_socket);

        let relayed = rx.recv().expect("client thread reports what it read");
        assert!(relayed.ends_with(b"hello"));
        assert!(String::from_utf8_lossy(&relayed).contains("200"));

        let forwarded = origin_rx.recv().expect("origin thread reports the forwarded request");
        let forwarded_text = String::from_utf8_lossy(&forwarded);
        assert!(forwarded_text.starts_with("GET http://127.0.0.1/hello HTTP/1.0\r\n"));
    }

    #[test]
    fn scenario_filter_hit_responds_403_and_never_dials_the_origin() {
        // Scenario 2: a filter on "ads" blocks a request naming that domain.
        // There is deliberately no fake origin here — VALIDATE rejects the
        // connection before DIAL_ORIGIN ever runs.
        let request = b"GET http://ads.example.test/ HTTP/1.1\r\nHost: ads.example.test\r\n\r\n" as &[u8];
        let (client_socket, response) = accept_one_client(request);

        let filters = FilterList::from_args(["ads"]);
        let (print, print_thread) = crate::print_queue::spawn();
        let (outcome, _info) = process(&client_socket, &test_limits(), &filters, &print, 80);
        assert!(matches!(outcome, Outcome::Filtered));
        drop(print);
        print_thread.join();
        drop(client_socket);

        let text = String::from_utf8_lossy(&response);
        assert!(text.contains("403 Forbidden"));
    }

    #[test]
    fn scenario_bad_method_responds_405() {
        // Scenario 3: an unsupported method never reaches VALIDATE at all.
        let request = b"DELETE / HTTP/1.1\r\nHost: x\r\n\r\n" as &[u8];
        let (client_socket, _response) = accept_one_client(request);

        let (print, print_thread) = crate::print_queue::spawn();
        let (outcome, info) = process(&client_socket, &test_limits(), &FilterList::new(), &print, 80);
        assert!(info.is_none(), "the request line never parsed, so there's no log info yet");
        match outcome {
            Outcome::Error { code: Some(405), .. } => {}
            other => panic!("expected a 405 error outcome, got a different one: {}", matches!(other, Outcome::Error { .. })),
        }
        drop(print);
        print_thread.join();
    }

    #[test]
    fn scenario_missing_host_on_http11_responds_400() {
        // Scenario 4.
        let request = b"GET / HTTP/1.1\r\n\r\n" as &[u8];
        let (client_socket, _response) = accept_one_client(request);

        let (print, print_thread) = crate::print_queue::spawn();
        let (outcome, _info) = process(&client_socket, &test_limits(), &FilterList::new(), &print, 80);
        match outcome {
            Outcome::Error { code: Some(400), .. } => {}
            _ => panic!("expected a 400 error outcome"),
        }
        drop(print);
        print_thread.join();
    }

    #[test]
    fn scenario_chunked_origin_response_decodes_to_the_concatenated_chunks() {
        // Scenario 5: the origin sends "hello world" as two chunks; the
        // worker must decode and relay exactly those 11 bytes, re-framed
        // with a plain Content-Length (§9 chunked re-emission).
        let (origin_port, _origin_rx) = spawn_fake_origin(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
        );
        let request = b"GET http://127.0.0.1/ HTTP/1.0\r\n\r\n" as &[u8];
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind client listener");
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        spawn_test_client(addr, request, tx);
        let (client_socket, _addr) = listener.accept().unwrap();

        let (print, print_thread) = crate::print_queue::spawn();
        let (outcome, _info) = process(
            &client_socket,
            &test_limits(),
            &FilterList::new(),
            &print,
            origin_port,
        );
        let response = match outcome {
            Outcome::Success { response } => response,
            _ => panic!("expected success"),
        };
        assert_eq!(response.body, b"hello world");
        assert_eq!(response.headers.get("Content-Length"), Some(&b"11"[..]));
        assert!(!response.headers.has("Transfer-Encoding"));

        writer::write_response(&response, &mut &client_socket).unwrap();
        drop(client_socket);
        let relayed = rx.recv().unwrap();
        assert!(relayed.ends_with(b"hello world"));

        drop(print);
        print_thread.join();
    }
}
