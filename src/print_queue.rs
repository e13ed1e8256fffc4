//! Single-consumer, many-producer log channel, grounded on
//! `original_source/print_thread.c`'s global message queue.
//!
//! The original hand-rolls a singly-linked-list FIFO behind a mutex and
//! condvar, with an explicit `shutdown` flag the consumer polls. A
//! `crossbeam::channel` gives the same producer/consumer handoff without
//! reimplementing that structure: many [`PrintQueue`] handles (one per
//! worker thread, cloned cheaply) each hold a sender; the consumer thread
//! blocks on the receiver. There is no separate shutdown flag — dropping
//! every [`PrintQueue`] clone closes the channel, and the consumer's `for`
//! loop drains whatever is already queued before returning, which is the
//! same "no more submissions, finish what's queued" behavior §4.8 describes.
//! A submit after every sender has been dropped is simply impossible to
//! observe from inside this module (there's nothing left to submit from).

use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Sender};

use crate::config;

/// A cheap, cloneable handle producers use to submit log lines. Submitting
/// never blocks the caller on I/O — the consumer thread owns all actual
/// `println!` calls.
#[derive(Clone)]
pub struct PrintQueue {
    tx: Sender<String>,
}

impl PrintQueue {
    /// Submits a fully-formed log line. A failed send (the consumer
    /// has already exited) is silently dropped, matching "submit after
    /// shutdown is a no-op that frees the message".
    pub fn submit(&self, message: impl Into<String>) {
        let _ = self.tx.send(message.into());
    }

    /// The debug trace path: narrates state-machine phase
    /// transitions when `config::DEBUG_PRINT` is set, and costs nothing
    /// otherwise.
    pub fn submit_debug(&self, message: impl Into<String>) {
        if config::DEBUG_PRINT {
            self.submit(message);
        }
    }
}

/// The running consumer thread. Join it after every [`PrintQueue`] clone
/// producers were holding has been dropped, so the channel is closed and
/// the consumer's drain loop can terminate.
pub struct PrintThread {
    handle: JoinHandle<()>,
}

impl PrintThread {
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// Spawns the print consumer thread and returns the producer handle
/// alongside it (§6 init order: print thread comes up before the manager
/// thread and the listener, so nothing can submit before there's a
/// consumer to drain it).
pub fn spawn() -> (PrintQueue, PrintThread) {
    let (tx, rx) = unbounded::<String>();

    let handle = thread::spawn(move || {
        for message in rx {
            if config::PRINT_THREAD_ID {
                println!("[thread {:?}] {message}", thread::current().id());
            } else {
                println!("{message}");
            }
        }
    });

    (PrintQueue { tx }, PrintThread { handle })
}
