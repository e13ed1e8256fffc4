//! Signal handling: `SIGUSR1` requests a stat dump, `SIGUSR2` requests
//! graceful shutdown, `SIGINT` is ignored. Grounded on
//! `original_source/server_listener.c`'s `serve_forever`, which installs
//! `print_signal`/`quit_signal` via `sigaction` and `SIG_IGN` for `SIGINT`.
//!
//! The original's `quit_signal` calls `exit(0)` straight from the handler.
//! That's legal in C (`exit` is on the async-signal-safe list) but isn't
//! available the same way here — there's no safe way to run destructors,
//! join threads, or flush the print queue from inside a signal handler in
//! Rust. Instead both handlers only set an [`AtomicBool`] flag (the one
//! operation this module trusts inside a handler), and the accept loop in
//! [`crate::listener`] polls both flags on every iteration, doing the actual
//! stat-dump or shutdown work on a normal thread.

use std::sync::atomic::{AtomicBool, Ordering};

static STAT_DUMP_REQUESTED: AtomicBool = AtomicBool::new(false);
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_usr1(_signum: libc::c_int) {
    STAT_DUMP_REQUESTED.store(true, Ordering::SeqCst);
}

extern "C" fn handle_usr2(_signum: libc::c_int) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs the three handlers. Must run once, before the listener
/// starts accepting, so no signal arrives with the default disposition still
/// in place.
pub fn install() {
    unsafe {
        install_handler(libc::SIGUSR1, handle_usr1);
        install_handler(libc::SIGUSR2, handle_usr2);
        ignore(libc::SIGINT);
    }
}

unsafe fn install_handler(signum: libc::c_int, handler: extern "C" fn(libc::c_int)) {
    let mut action: libc::sigaction = std::mem::zeroed();
    action.sa_sigaction = handler as usize;
    libc::sigemptyset(&mut action.sa_mask);
    action.sa_flags = 0;
    libc::sigaction(signum, &action, std::ptr::null_mut());
}

unsafe fn ignore(signum: libc::c_int) {
    let mut action: libc::sigaction = std::mem::zeroed();
    action.sa_sigaction = libc::SIG_IGN;
    libc::sigemptyset(&mut action.sa_mask);
    action.sa_flags = 0;
    libc::sigaction(signum, &action, std::ptr::null_mut());
}

/// Returns whether a stat dump was requested since the last check, clearing
/// the flag (the accept loop calls this once per poll iteration).
pub fn take_stat_dump_request() -> bool {
    STAT_DUMP_REQUESTED.swap(false, Ordering::SeqCst)
}

/// Returns whether shutdown was requested. Left un-cleared: once a shutdown
/// is requested it stays requested for the rest of the process's life (§6
/// "no new workers are admitted" once this is set).
pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}

/// Sets the shutdown flag directly, standing in for an actual `SIGUSR2`
/// delivery in end-to-end tests that drive [`crate::listener::accept_loop`]
/// (raising a real process-wide signal in a test would race the handler
/// installed by [`install`] and any other test touching this same flag).
#[cfg(test)]
pub(crate) fn request_shutdown_for_test() {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Clears the shutdown flag, so a shutdown test can leave it as it found it
/// for whichever test shares the binary runs next.
#[cfg(test)]
pub(crate) fn reset_shutdown_for_test() {
    SHUTDOWN_REQUESTED.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    // These tests share process-global signal state, so they run serially
    // within this module by construction (cargo runs `#[test]`s from one
    // binary on a shared thread pool, but each flag here is independent of
    // the others and each test only touches the flag it's named for).

    #[test]
    fn stat_dump_flag_is_set_and_cleared_on_take() {
        STAT_DUMP_REQUESTED.store(false, Ordering::SeqCst);
        handle_usr1(libc::SIGUSR1);
        assert!(take_stat_dump_request());
        assert!(!take_stat_dump_request());
    }

    #[test]
    fn shutdown_flag_latches_once_set() {
        SHUTDOWN_REQUESTED.store(false, Ordering::SeqCst);
        assert!(!shutdown_requested());
        handle_usr2(libc::SIGUSR2);
        assert!(shutdown_requested());
        assert!(shutdown_requested());
    }
}
