//! Per-record citation lookup
//!
//! Resolves one search key against the lookup service under the bounded
//! retry policy and the exact-match rule: the first candidate whose title
//! equals the search key case-insensitively wins. A result set without an
//! exact match is a terminal failure (retrying cannot change a static
//! mismatch); the diagnostics logged for it are what a human needs to
//! repair the record's search key in the store.

use crate::services::semantic_scholar::{CandidateAuthor, CitationSource, PaperCandidate, SourceError};
use crate::workflow::retry::{AttemptError, LookupFailure, RetryPolicy};
use tracing::{debug, warn};

/// How many author names to spell out in mismatch diagnostics
const AUTHOR_DISPLAY_LIMIT: usize = 5;

/// A successful exact match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactMatch {
    pub citation_count: u64,
    pub url: Option<String>,
}

/// Resolve one search key, retrying per `policy`.
///
/// `doc_hint` is the author hint extracted from the document, used only
/// to annotate mismatch diagnostics.
pub async fn resolve(
    source: &dyn CitationSource,
    policy: &RetryPolicy,
    search_key: &str,
    doc_hint: Option<&str>,
) -> Result<ExactMatch, LookupFailure> {
    let mut attempt = 1;
    loop {
        let error = match source.search(search_key).await {
            Ok(candidates) if candidates.is_empty() => AttemptError::EmptyResults,
            Ok(candidates) => {
                return match select_exact(&candidates, search_key) {
                    Some(found) => Ok(found),
                    None => {
                        report_mismatch(&candidates, search_key, doc_hint);
                        Err(LookupFailure::TitleMismatch)
                    }
                };
            }
            Err(SourceError::RateLimited) => AttemptError::RateLimited,
            Err(e) => AttemptError::Transport(e),
        };

        if !policy.retries_left(attempt) {
            return Err(error.into_failure());
        }

        warn!(
            search_key = %search_key,
            attempt,
            max_attempts = policy.max_attempts(),
            error = %error,
            "Search attempt failed, retrying"
        );
        tokio::time::sleep(policy.delay()).await;
        attempt += 1;
    }
}

/// First candidate whose title equals the search key, ignoring case.
/// Candidates missing a title or citation count cannot match.
fn select_exact(candidates: &[PaperCandidate], search_key: &str) -> Option<ExactMatch> {
    let wanted = search_key.to_lowercase();
    candidates.iter().find_map(|candidate| {
        let title = candidate.title.as_deref()?;
        let count = candidate.citation_count?;
        (title.to_lowercase() == wanted).then(|| ExactMatch {
            citation_count: count,
            url: candidate.url.clone(),
        })
    })
}

/// Log what a human needs to resolve the mismatch: the best candidate's
/// title versus the search key, and both sides' author information.
fn report_mismatch(candidates: &[PaperCandidate], search_key: &str, doc_hint: Option<&str>) {
    let best = &candidates[0];
    warn!(
        search_key = %search_key,
        candidate_title = %best.title.as_deref().unwrap_or("(no title)"),
        "No exact title match among search results"
    );
    warn!(
        document_authors = %doc_hint.unwrap_or("(not found)"),
        candidate_authors = %format_authors(best.authors.as_deref()),
        "If this is the same paper, edit the record's title field in the store"
    );
    debug!(candidates = candidates.len(), "Mismatched result set size");
}

/// First few author names, then a count of the rest
fn format_authors(authors: Option<&[CandidateAuthor]>) -> String {
    let authors = match authors {
        Some(list) if !list.is_empty() => list,
        _ => return "(no author information)".to_string(),
    };
    let joined = authors
        .iter()
        .take(AUTHOR_DISPLAY_LIMIT)
        .map(|author| author.name.as_deref().unwrap_or("Unknown"))
        .collect::<Vec<_>>()
        .join(", ");
    if authors.len() > AUTHOR_DISPLAY_LIMIT {
        format!("{joined} and {} others", authors.len() - AUTHOR_DISPLAY_LIMIT)
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: Option<&str>, count: Option<u64>) -> PaperCandidate {
        PaperCandidate {
            title: title.map(str::to_string),
            citation_count: count,
            url: None,
            authors: None,
        }
    }

    #[test]
    fn test_select_exact_case_insensitive() {
        let candidates = vec![candidate(Some("attention is ALL you need"), Some(12))];
        let found = select_exact(&candidates, "Attention Is All You Need").unwrap();
        assert_eq!(found.citation_count, 12);
    }

    #[test]
    fn test_select_exact_takes_first_match() {
        let candidates = vec![
            candidate(Some("Other Paper"), Some(1)),
            candidate(Some("Wanted Paper"), Some(2)),
            candidate(Some("Wanted Paper"), Some(3)),
        ];
        let found = select_exact(&candidates, "Wanted Paper").unwrap();
        assert_eq!(found.citation_count, 2);
    }

    #[test]
    fn test_select_exact_rejects_partial_match() {
        let candidates = vec![candidate(Some("Wanted Paper: Extended Version"), Some(9))];
        assert!(select_exact(&candidates, "Wanted Paper").is_none());
    }

    #[test]
    fn test_select_exact_skips_incomplete_candidates() {
        let candidates = vec![
            candidate(None, Some(5)),
            candidate(Some("Wanted Paper"), None),
            candidate(Some("Wanted Paper"), Some(8)),
        ];
        let found = select_exact(&candidates, "Wanted Paper").unwrap();
        assert_eq!(found.citation_count, 8);
    }

    #[test]
    fn test_format_authors_short_list() {
        let authors = vec![
            CandidateAuthor {
                name: Some("Ada Lovelace".to_string()),
            },
            CandidateAuthor { name: None },
        ];
        assert_eq!(format_authors(Some(&authors)), "Ada Lovelace, Unknown");
    }

    #[test]
    fn test_format_authors_truncates_long_list() {
        let authors: Vec<CandidateAuthor> = (0..8)
            .map(|i| CandidateAuthor {
                name: Some(format!("Author {i}")),
            })
            .collect();
        let formatted = format_authors(Some(&authors));
        assert!(formatted.starts_with("Author 0, "));
        assert!(formatted.ends_with("and 3 others"));
    }

    #[test]
    fn test_format_authors_none() {
        assert_eq!(format_authors(None), "(no author information)");
        assert_eq!(format_authors(Some(&[])), "(no author information)");
    }
}
