//! Citation badge patching
//!
//! Rewrites only the integer inside each updated record's citation badge:
//!
//! ```text
//! [![](https://img.shields.io/badge/citation-42-blue)]()
//! ```
//!
//! Every patch requires a unique `**title**` anchor; an absent or
//! ambiguous anchor refuses that record rather than risk touching an
//! unrelated line. Before writing, an integrity gate strips every badge
//! from the original and patched texts and requires the remainders to be
//! byte-identical; on any difference the whole batch is discarded and the
//! document stays untouched.

use crate::store::Store;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const BADGE_PREFIX: &str = "[![](https://img.shields.io/badge/citation-";
const BADGE_SUFFIX: &str = "-blue)]()";

/// Patch errors. The first three are per-record (logged and counted);
/// the rest reject the whole batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("paper title not found in document")]
    AnchorMissing,

    #[error("paper title appears more than once in document")]
    AnchorAmbiguous,

    #[error("no citation badge after paper title")]
    BadgeMissing,

    #[error("document changed outside citation badges, refusing to save")]
    IntegrityViolation,

    #[error("document IO error: {0}")]
    Io(String),
}

/// Per-record outcome counts for one patch batch
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub patched: usize,
    pub errors: usize,
}

/// Patch badges for `updated` record keys and write the document back.
///
/// The document is re-read here so the integrity gate compares against
/// the bytes actually on disk. An empty update set writes nothing.
/// Failures reject the batch but leave the store's new counts intact, so
/// a later run can re-patch without re-querying the service.
pub fn patch_document(path: &Path, store: &Store, updated: &[String]) -> Result<PatchReport, PatchError> {
    if updated.is_empty() {
        return Ok(PatchReport::default());
    }

    let original = std::fs::read_to_string(path).map_err(|e| PatchError::Io(e.to_string()))?;
    let (patched, report) = patch_text(&original, store, updated);

    if !verify_integrity(&original, &patched) {
        return Err(PatchError::IntegrityViolation);
    }

    std::fs::write(path, patched).map_err(|e| PatchError::Io(e.to_string()))?;
    Ok(report)
}

/// Apply badge updates for `updated` keys to `text`. Per-record problems
/// are logged and counted; nothing outside badge substrings is altered.
pub fn patch_text(text: &str, store: &Store, updated: &[String]) -> (String, PatchReport) {
    let mut current = text.to_string();
    let mut report = PatchReport::default();

    for key in updated {
        let citations = match store.get(key) {
            Some(record) => record.citations,
            None => {
                warn!(title = %key, "Updated record missing from store, skipping patch");
                report.errors += 1;
                continue;
            }
        };
        match patch_record(&current, key, citations) {
            Ok(next) => {
                info!(title = %key, citations, "Citation badge updated");
                current = next;
                report.patched += 1;
            }
            Err(e) => {
                warn!(title = %key, error = %e, "Citation badge not patched");
                report.errors += 1;
            }
        }
    }

    (current, report)
}

/// Integrity gate: outside of citation badges the two texts must be
/// byte-identical.
pub fn verify_integrity(original: &str, patched: &str) -> bool {
    strip_badges(original) == strip_badges(patched)
}

/// Replace the first badge after the record's unique anchor
fn patch_record(text: &str, key: &str, citations: u64) -> Result<String, PatchError> {
    let anchor = format!("**{key}**");
    let positions = find_all(text, &anchor);
    match positions.len() {
        0 => return Err(PatchError::AnchorMissing),
        1 => {}
        _ => return Err(PatchError::AnchorAmbiguous),
    }

    let badge = find_badge(text, positions[0]).ok_or(PatchError::BadgeMissing)?;

    let mut patched = String::with_capacity(text.len());
    patched.push_str(&text[..badge.start]);
    patched.push_str(BADGE_PREFIX);
    patched.push_str(&citations.to_string());
    patched.push_str(BADGE_SUFFIX);
    patched.push_str(&text[badge.end..]);
    Ok(patched)
}

/// Non-overlapping occurrences of `needle`
fn find_all(text: &str, needle: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut from = 0;
    while let Some(i) = text[from..].find(needle) {
        positions.push(from + i);
        from += i + needle.len();
    }
    positions
}

/// Byte range of the first well-formed citation badge at or after `from`
fn find_badge(text: &str, from: usize) -> Option<Range<usize>> {
    let mut cursor = from;
    while let Some(i) = text[cursor..].find(BADGE_PREFIX) {
        let start = cursor + i;
        let digits_start = start + BADGE_PREFIX.len();
        let rest = &text[digits_start..];
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits > 0 && rest[digits..].starts_with(BADGE_SUFFIX) {
            return Some(start..digits_start + digits + BADGE_SUFFIX.len());
        }
        cursor = digits_start;
    }
    None
}

/// Remove every citation badge from `text`
fn strip_badges(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    while let Some(range) = find_badge(text, cursor) {
        out.push_str(&text[cursor..range.start]);
        cursor = range.end;
    }
    out.push_str(&text[cursor..]);
    out
}
