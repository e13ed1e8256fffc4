//! Thread-safe success/filtered/error tallies and a formatted dump,
//! grounded on `original_source/stat_tracking.c`. The original guards three
//! `unsigned` counters and a frozen filter-label string with one mutex and
//! formats a snapshot under that same lock before handing it to the print
//! queue; this is the same shape, with the filter labels formatted once at
//! construction (the filter list is immutable after startup, §4.4) instead
//! of re-joined under the lock on every dump.

use std::sync::Mutex;

use crate::filter::FilterList;
use crate::print_queue::PrintQueue;

#[derive(Debug, Default, Clone, Copy)]
struct Counts {
    success: u64,
    filtered: u64,
    error: u64,
}

/// Process-wide success/filtered/error counters plus the filter labels
/// active for this run, snapshotted together under one short-lived lock
/// (§4.9, §5 "Stat counters: single mutex, held only across the increment
/// or the snapshot copy").
pub struct Stats {
    counts: Mutex<Counts>,
    filters_display: String,
}

impl Stats {
    /// Builds the filter-label display once, up front: the original appends
    /// `"; "` after every label including the last (`stat_filter`, called
    /// once per CLI filter argument in `main.c`), which this reproduces
    /// exactly so the dump text matches byte-for-byte.
    pub fn new(filters: &FilterList) -> Self {
        let mut filters_display = String::new();
        for filter in filters.iter() {
            filters_display.push_str(&String::from_utf8_lossy(filter.as_bytes()));
            filters_display.push_str("; ");
        }
        Stats {
            counts: Mutex::new(Counts::default()),
            filters_display,
        }
    }

    pub fn add_success(&self) {
        self.counts.lock().unwrap().success += 1;
    }

    pub fn add_filtered(&self) {
        self.counts.lock().unwrap().filtered += 1;
    }

    pub fn add_error(&self) {
        self.counts.lock().unwrap().error += 1;
    }

    fn snapshot(&self) -> Counts {
        *self.counts.lock().unwrap()
    }

    /// Formats a multi-line record and hands it to the print queue
    ///, triggered by `SIGUSR1`.
    pub fn print(&self, print: &PrintQueue) {
        let counts = self.snapshot();
        print.submit(format!(
            "Received SIGUSR1...reporting status:\n\
             -- Processed {} requests successfully\n\
             -- Filtering: {}\n\
             -- Filtered {} requests\n\
             -- Encountered {} requests in error",
            counts.success, self.filters_display, counts.filtered, counts.error,
        ));
    }
}
