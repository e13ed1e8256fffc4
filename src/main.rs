//! CLI entry point: `forward_proxy <port> [blocked-domain ...]`.
//! Grounded on `original_source/main.c`'s `main`, which validates `argc`/the
//! port string before anything else, registers each remaining argument as a
//! filter, then calls `serve_forever`.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use forward_proxy::config::Limits;
use forward_proxy::filter::FilterList;
use forward_proxy::server::manager;
use forward_proxy::server::worker::WorkerContext;
use forward_proxy::stats::Stats;
use forward_proxy::{grammar, listener, print_queue, signals};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("BETTER ARGS PLEASE");
        return ExitCode::FAILURE;
    }

    let port: u16 = match args[1].parse::<u32>() {
        Ok(p) if p <= u16::MAX as u32 => p as u16,
        _ => {
            eprintln!("BETTER PORT PLEASE");
            return ExitCode::FAILURE;
        }
    };

    let filters = FilterList::from_args(&args[2..]);

    // Init order: grammar, then the read-only stat/filter state, then
    // the two background threads, then the listening socket, then signal
    // handlers (installed last so no handler can fire before the queues it
    // reports through exist). Shutdown runs this in reverse.
    grammar::init();
    let stats = Arc::new(Stats::new(&filters));
    let (print, print_thread) = print_queue::spawn();
    let (mgr, manager_thread) = manager::spawn();

    let tcp_listener = match listener::bind(port) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("unable to bind port {port}: {e}");
            return ExitCode::FAILURE;
        }
    };

    signals::install();

    let ctx = Arc::new(WorkerContext {
        filters,
        stats: Arc::clone(&stats),
        print: print.clone(),
        limits: Limits::default(),
    });

    listener::accept_loop(&tcp_listener, &ctx, &mgr, &stats, &print);

    drop(ctx);
    drop(mgr);
    manager_thread.join();
    drop(print);
    print_thread.join();

    ExitCode::SUCCESS
}
