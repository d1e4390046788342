//! Citation workflow orchestration
//!
//! One run is three sequential steps:
//!
//! 1. Reconcile: extract titles from the document and rebuild the store
//!    around them.
//! 2. Lookup: staleness-sort the store, then query each due record
//!    against the lookup service, writing the store through after every
//!    success.
//! 3. Patch: rewrite the citation badges of successfully updated records
//!    in the document, behind the integrity gate.
//!
//! Everything is single-task sequential; the only suspension points are
//! the pacing and retry sleeps.

pub mod lookup;
pub mod patcher;
pub mod reconcile;
pub mod retry;
pub mod schedule;

use crate::catalog;
use crate::config::WorkflowConfig;
use crate::services::semantic_scholar::CitationSource;
use crate::store::Store;
use crate::time;
use crate::Result;
use self::retry::{LookupFailure, RetryPolicy};
use std::time::Duration;
use tracing::{error, info, warn};

/// One successfully updated record
#[derive(Debug, Clone)]
pub struct UpdatedPaper {
    pub key: String,
    pub old_citations: u64,
    pub new_citations: u64,
}

/// One record whose lookup failed this run
#[derive(Debug, Clone)]
pub struct FailedPaper {
    pub key: String,
    pub reason: LookupFailure,
}

/// Outcome of a full workflow run
#[derive(Debug)]
pub struct RunSummary {
    /// Records in the store after reconciliation
    pub total: usize,
    pub updated: Vec<UpdatedPaper>,
    pub failed: Vec<FailedPaper>,
    /// Records skipped as fresh
    pub skipped: usize,
    /// Badges rewritten in the document
    pub patched: usize,
    /// Per-record patch refusals
    pub patch_errors: usize,
    /// False when the patch batch was rejected and the document left
    /// untouched
    pub document_written: bool,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            total: 0,
            updated: Vec::new(),
            failed: Vec::new(),
            skipped: 0,
            patched: 0,
            patch_errors: 0,
            document_written: true,
        }
    }
}

/// The reconcile → lookup → patch pipeline
pub struct CitationWorkflow {
    config: WorkflowConfig,
    source: Box<dyn CitationSource>,
}

impl CitationWorkflow {
    pub fn new(config: WorkflowConfig, source: Box<dyn CitationSource>) -> Self {
        Self { config, source }
    }

    /// Run the full workflow once.
    ///
    /// Fatal errors (unreadable document, corrupt or unwritable store)
    /// abort; per-record failures land in the summary.
    pub async fn run(&self) -> Result<RunSummary> {
        info!(started = %time::now_stamp(), "Citation workflow starting");

        let (mut store, document) = self.reconcile_step()?;
        let mut summary = RunSummary {
            total: store.len(),
            ..RunSummary::default()
        };

        self.lookup_step(&mut store, &document, &mut summary).await?;
        self.patch_step(&store, &mut summary);

        info!(
            finished = %time::now_stamp(),
            total = summary.total,
            updated = summary.updated.len(),
            failed = summary.failed.len(),
            skipped = summary.skipped,
            patched = summary.patched,
            "Citation workflow complete"
        );
        Ok(summary)
    }

    /// Step 1: extract titles and rebuild the store around them
    fn reconcile_step(&self) -> Result<(Store, String)> {
        info!("Step 1/3: reconciling paper list");

        let document = catalog::read_document(&self.config.readme)?;
        let titles = catalog::extract_titles(&document);
        if titles.is_empty() {
            warn!(
                document = %self.config.readme.display(),
                "No catalog entries found in document, store will be emptied"
            );
        } else {
            info!(count = titles.len(), "Extracted paper titles");
        }

        let old = Store::load(&self.config.store)?;
        let (store, report) = reconcile::reconcile(&titles, &old);
        store.save()?;

        info!(
            total = report.total,
            added = report.added.len(),
            orphaned = report.orphaned.len(),
            "Paper list reconciled"
        );
        for key in &report.orphaned {
            info!(title = %key, "Dropped from store (absent from document, document untouched)");
        }

        Ok((store, document))
    }

    /// Step 2: staleness-sorted lookups with write-through saves
    async fn lookup_step(
        &self,
        store: &mut Store,
        document: &str,
        summary: &mut RunSummary,
    ) -> Result<()> {
        info!("Step 2/3: fetching citation counts");

        store.sort_by_last_updated();
        // persist the sorted order so the file shows the priority queue
        store.save()?;

        let queue = schedule::due_queue(store, self.config.freshness_hours);
        summary.skipped = store.len() - queue.len();
        info!(
            due = queue.len(),
            skipped = summary.skipped,
            freshness_hours = self.config.freshness_hours,
            "Lookup queue scheduled"
        );

        let policy = RetryPolicy::new(
            self.config.retry_limit,
            Duration::from_millis(self.config.request_delay_ms),
        );

        for (index, key) in queue.iter().enumerate() {
            if index > 0 {
                // pacing between due records, success or not
                tokio::time::sleep(policy.delay()).await;
            }

            let (search_key, old_citations) = match store.get(key) {
                Some(record) => (record.title.clone(), record.citations),
                None => continue,
            };

            info!(
                title = %key,
                position = index + 1,
                of = queue.len(),
                "Looking up citations"
            );
            if search_key != *key {
                info!(title = %key, search_key = %search_key, "Searching by overridden key");
                if store.contains(&search_key) {
                    warn!(
                        title = %key,
                        search_key = %search_key,
                        "Search key collides with another record's key"
                    );
                }
            }

            let hint = catalog::author_hint(document, key);
            match lookup::resolve(self.source.as_ref(), &policy, &search_key, hint.as_deref())
                .await
            {
                Ok(found) => {
                    if let Some(record) = store.get_mut(key) {
                        record.citations = found.citation_count;
                        record.last_updated = time::now_stamp();
                    }
                    // write-through: durable before the next lookup starts
                    store.save()?;

                    let delta = found.citation_count as i64 - old_citations as i64;
                    info!(
                        title = %key,
                        old = old_citations,
                        new = found.citation_count,
                        delta,
                        "Citation count updated"
                    );
                    if let Some(url) = &found.url {
                        info!(title = %key, url = %url, "Matched paper");
                    }
                    summary.updated.push(UpdatedPaper {
                        key: key.clone(),
                        old_citations,
                        new_citations: found.citation_count,
                    });
                }
                Err(reason) => {
                    warn!(title = %key, reason = %reason, "Lookup failed");
                    summary.failed.push(FailedPaper {
                        key: key.clone(),
                        reason,
                    });
                }
            }
        }

        Ok(())
    }

    /// Step 3: patch badges for the records updated this run
    fn patch_step(&self, store: &Store, summary: &mut RunSummary) {
        info!("Step 3/3: updating citation badges");

        if summary.updated.is_empty() {
            info!("No records updated, document untouched");
            return;
        }

        let keys: Vec<String> = summary.updated.iter().map(|u| u.key.clone()).collect();
        match patcher::patch_document(&self.config.readme, store, &keys) {
            Ok(report) => {
                summary.patched = report.patched;
                summary.patch_errors = report.errors;
                info!(
                    patched = report.patched,
                    errors = report.errors,
                    "Document badges updated"
                );
            }
            Err(e) => {
                // store already holds the new counts; the next run can
                // re-patch without re-querying
                summary.document_written = false;
                summary.patch_errors = summary.updated.len();
                error!(error = %e, "Document not updated, patch batch rejected");
            }
        }
    }
}
