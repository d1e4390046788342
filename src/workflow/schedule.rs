//! Staleness scheduling
//!
//! Orders the store oldest-update-first and partitions records into the
//! due queue and the fresh (skipped) set. The caller persists the sorted
//! store before looking anything up, so the on-disk file always shows the
//! current priority queue.

use crate::store::{PaperRecord, Store};
use crate::time;

/// Partition decision for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Outside the freshness window (or never updated): look it up
    Due,
    /// Updated recently: skip this run
    Fresh,
}

/// Classify one record against the freshness window
pub fn freshness(record: &PaperRecord, window_hours: u64) -> Freshness {
    if time::within_window(&record.last_updated, window_hours) {
        Freshness::Fresh
    } else {
        Freshness::Due
    }
}

/// The ordered lookup queue for this run: keys of due records, in the
/// store's current (staleness-sorted) order.
pub fn due_queue(store: &Store, window_hours: u64) -> Vec<String> {
    store
        .iter()
        .filter(|(_, record)| freshness(record, window_hours) == Freshness::Due)
        .map(|(key, _)| key.to_string())
        .collect()
}
