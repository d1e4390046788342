//! Document/store reconciliation
//!
//! Rebuilds the store from the document's title sequence: titles already
//! known keep their records verbatim (reconciliation never resets known
//! citation data), new titles get a zero-citation record with the epoch
//! sentinel, and store keys absent from the document are reported as
//! orphans and dropped. The document itself is never modified here.

use crate::store::{PaperRecord, Store};
use tracing::{info, warn};

/// What one reconciliation pass did
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Record count after reconciliation
    pub total: usize,
    /// Titles newly discovered in the document
    pub added: Vec<String>,
    /// Store keys no longer present in the document, dropped from the
    /// rebuilt store
    pub orphaned: Vec<String>,
}

/// Rebuild the store from the extracted title sequence.
///
/// Idempotent: reconciling twice against an unchanged document yields an
/// identical store. The returned store is not yet persisted.
pub fn reconcile(titles: &[String], old: &Store) -> (Store, ReconcileReport) {
    let mut next = Store::new(old.path());
    let mut report = ReconcileReport::default();

    for title in titles {
        if next.contains(title) {
            warn!(title = %title, "Duplicate catalog entry, keeping first occurrence");
            continue;
        }
        match old.get(title) {
            Some(record) => next.insert(title.clone(), record.clone()),
            None => {
                info!(title = %title, "New paper added to store");
                next.insert(title.clone(), PaperRecord::new(title));
                report.added.push(title.clone());
            }
        }
    }

    report.orphaned = old
        .keys()
        .filter(|key| !next.contains(key))
        .map(str::to_string)
        .collect();
    report.total = next.len();

    (next, report)
}
