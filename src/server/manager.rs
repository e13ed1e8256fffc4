//! Connection manager: accepts handoffs of worker thread handles and
//! joins them in order, guaranteeing every worker is joined exactly once and
//! no detached threads persist past process exit. Grounded on
//! `original_source/http_manager_thread.c`, whose own comment admits it's
//! "copy-pasted from the print_thread.c global queue implementation" for
//! lack of templates — so, like [`crate::print_queue`], this is a
//! `crossbeam::channel` standing in for that hand-rolled mutex/condvar FIFO
//! rather than a second reimplementation of it.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{unbounded, Sender};

/// A cheap, cloneable handle the listener uses to register a freshly
/// spawned worker thread for joining. Registration never blocks on the
/// worker itself — only on the bounded critical section of the channel's
/// internal queue.
#[derive(Clone)]
pub struct Manager {
    tx: Sender<JoinHandle<()>>,
}

impl Manager {
    /// Hands a worker's thread handle to the manager. A failed send
    /// (the manager has already shut down) means the handle is simply
    /// dropped here instead of joined — by the time shutdown drains the
    /// queue and exits, the listener loop that calls this has itself
    /// already stopped accepting, so this path is unreachable in practice
    /// given the init/shutdown order in §6, but it's not unsound to hit it.
    pub fn register(&self, handle: JoinHandle<()>) {
        let _ = self.tx.send(handle);
    }
}

/// The running manager thread. Join it after dropping every [`Manager`]
/// clone, once the listener has stopped admitting new connections, so the
/// channel closes and the drain loop can terminate.
pub struct ManagerThread {
    handle: JoinHandle<()>,
}

impl ManagerThread {
    pub fn join(self) {
        let _ = self.handle.join();
    }
}

/// Spawns the manager thread and returns the registration handle alongside
/// it (§6 init order: before the listener, after the print thread, so
/// every accepted connection always has somewhere to register its worker).
pub fn spawn() -> (Manager, ManagerThread) {
    let (tx, rx) = unbounded::<JoinHandle<()>>();

    let handle = thread::spawn(move || {
        for worker in rx {
            let _ = worker.join();
        }
    });

    (Manager { tx }, ManagerThread { handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn every_registered_worker_is_joined_exactly_once_then_drained() {
        let (manager, manager_thread) = spawn();
        let joined = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let joined = Arc::clone(&joined);
            let worker = thread::spawn(move || {
                joined.fetch_add(1, Ordering::SeqCst);
            });
            manager.register(worker);
        }

        drop(manager);
        manager_thread.join();
        assert_eq!(joined.load(Ordering::SeqCst), 5);
    }
}
