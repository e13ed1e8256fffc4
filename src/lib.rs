//! forward_proxy - a multi-threaded HTTP/1.x forward proxy.
//!
//! One OS thread per accepted connection reads a request, checks it against
//! a domain blocklist, dials the named origin, relays the request, relays
//! the response back, and closes. No persistent connections, no async
//! runtime: the concurrency model is plain `std::thread`, coordinated by a
//! small connection manager and a single-consumer print queue.
//!
//! # Modules
//!
//! - [`grammar`] / [`http`] parse and serialize HTTP/1.x messages.
//! - [`filter`] is the domain blocklist consulted before dialing an origin.
//! - [`server::worker`] is the per-connection state machine; [`server::manager`]
//!   joins worker threads as they finish.
//! - [`print_queue`] and [`stats`] are the process-wide logging and counter
//!   singletons; [`signals`] and [`listener`] wire `SIGUSR1`/`SIGUSR2` and the
//!   accept loop together at startup.
//! - [`config`] holds the compile-time size limits and toggles.

pub(crate) mod bytes;
pub mod config;
pub(crate) mod error;
pub(crate) mod error_response;
pub mod filter;
pub mod grammar;
pub(crate) mod http {
    pub(crate) mod message;
    pub(crate) mod parser;
    pub(crate) mod types;
    pub(crate) mod writer;
}
pub mod listener;
pub mod print_queue;
pub mod server {
    pub mod manager;
    pub mod worker;
}
pub mod signals;
pub mod stats;

pub use crate::filter::FilterList;
pub use crate::print_queue::PrintQueue;
pub use crate::server::manager::Manager;
pub use crate::server::worker::WorkerContext;
pub use crate::stats::Stats;
