//! Markdown catalog scanning
//!
//! Extracts paper titles (and best-effort author hints) from the curated
//! document. A catalog entry looks like:
//!
//! ```text
//! **Paper Title** [[paper]](url) [[code]](url) [Author et al.] [![](badge)]()
//! ```
//!
//! The scanner is a handful of small anchored rules over line-scoped
//! windows rather than one large pattern, so each rule can be tested
//! against literal fixtures on its own.

use crate::{Error, Result};
use std::path::Path;

const BOLD_MARKER: &str = "**";

/// Bold fragments this short are headings or emphasis, not paper titles
const MIN_TITLE_CHARS: usize = 10;

/// Author-hint scan stays on the title's line and within this many chars
const HINT_WINDOW_CHARS: usize = 500;

/// Read the catalog document; a missing or unreadable document is fatal.
pub fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::Document(format!("cannot read {}: {}", path.display(), e)))
}

/// Extract the ordered sequence of paper titles from the document.
///
/// A title is a bold span followed (ignoring whitespace) by an opening
/// bracket, which is how every catalog entry introduces its link markers.
/// Returns an empty vector when the document holds no entries.
pub fn extract_titles(text: &str) -> Vec<String> {
    let mut titles = Vec::new();
    let mut cursor = 0;

    while let Some((content, end)) = next_bold_span(text, cursor) {
        cursor = end;
        if !link_follows(text, end) {
            continue;
        }
        if let Some(title) = accept_title(content) {
            titles.push(title);
        }
    }

    titles
}

/// Find the next `**...**` span at or after `from`.
///
/// Returns the span content and the offset just past the closing marker.
/// Pairs markers non-greedily, so `**a** and **b**` yields two spans.
fn next_bold_span(text: &str, from: usize) -> Option<(&str, usize)> {
    let open = text[from..].find(BOLD_MARKER)? + from;
    let start = open + BOLD_MARKER.len();
    let close = text[start..].find(BOLD_MARKER)? + start;
    Some((&text[start..close], close + BOLD_MARKER.len()))
}

/// A bold span is only a catalog entry when a bracketed link marker
/// follows it.
fn link_follows(text: &str, from: usize) -> bool {
    text[from..].trim_start().starts_with('[')
}

/// Filter out bold fragments that are not entries: malformed captures
/// that open with a bracket, and spans too short to be a paper title.
fn accept_title(content: &str) -> Option<String> {
    if content.starts_with('[') {
        return None;
    }
    let trimmed = content.trim();
    if trimmed.chars().count() <= MIN_TITLE_CHARS {
        return None;
    }
    Some(trimmed.to_string())
}

/// Best-effort author hint for a title, used only to annotate mismatch
/// diagnostics. Never errors; `None` when the title or hint is absent.
///
/// Scans the remainder of the title's line: hops over the adjacent
/// `[[label]](url)` link markers, then takes the first standalone
/// bracketed group that is not an image, carries no URL, and has enough
/// content to be a name.
pub fn author_hint(text: &str, title: &str) -> Option<String> {
    let anchor = format!("**{title}**");
    let pos = text.find(&anchor)?;
    let window = line_window(&text[pos + anchor.len()..]);

    let mut cursor = skip_spaces(window, 0);
    let mut markers = 0;
    while let Some(end) = link_marker_end(window, cursor) {
        cursor = skip_spaces(window, end);
        markers += 1;
    }
    // Without at least one link marker we are not looking at an entry line
    if markers == 0 {
        return None;
    }

    let group = bracket_group(window, cursor)?;
    let hint = group.trim();
    if hint.starts_with('!')
        || hint.to_lowercase().contains("http")
        || hint.chars().count() <= 3
    {
        return None;
    }
    Some(hint.to_string())
}

/// The rest of the current line, capped to keep the scan bounded
fn line_window(rest: &str) -> &str {
    let line = rest.lines().next().unwrap_or("");
    match line.char_indices().nth(HINT_WINDOW_CHARS) {
        Some((i, _)) => &line[..i],
        None => line,
    }
}

fn skip_spaces(window: &str, from: usize) -> usize {
    window[from..]
        .find(|c: char| !c.is_whitespace())
        .map(|i| from + i)
        .unwrap_or(window.len())
}

/// One `[[label]](url)` link marker starting exactly at `from`; returns
/// the offset just past the closing parenthesis.
fn link_marker_end(window: &str, from: usize) -> Option<usize> {
    let rest = &window[from..];
    if !rest.starts_with("[[") {
        return None;
    }
    let label_end = rest.find("]]")?;
    if label_end == 2 {
        // empty label, not a link marker
        return None;
    }
    if !rest[label_end + 2..].starts_with('(') {
        return None;
    }
    let close = rest[label_end + 2..].find(')')? + label_end + 2;
    Some(from + close + 1)
}

/// A standalone `[...]` group starting exactly at `from`
fn bracket_group(window: &str, from: usize) -> Option<&str> {
    let rest = window[from..].strip_prefix('[')?;
    let close = rest.find(']')?;
    Some(&rest[..close])
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: &str = "**Attention Is All You Need** \
        [[paper]](https://arxiv.org/abs/1706.03762) \
        [Vaswani et al.] \
        [![](https://img.shields.io/badge/citation-100000-blue)]()";

    #[test]
    fn test_extract_single_title() {
        let titles = extract_titles(ENTRY);
        assert_eq!(titles, vec!["Attention Is All You Need"]);
    }

    #[test]
    fn test_extract_preserves_document_order() {
        let text = "\
- **Paper About Language Models** [[paper]](u1)\n\
- **Paper About Vision Systems** [[paper]](u2)\n";
        let titles = extract_titles(text);
        assert_eq!(
            titles,
            vec!["Paper About Language Models", "Paper About Vision Systems"]
        );
    }

    #[test]
    fn test_extract_ignores_bold_without_link() {
        let text = "**Just Some Emphasized Heading Text**\n\nplain paragraph\n";
        assert!(extract_titles(text).is_empty());
    }

    #[test]
    fn test_extract_rejects_short_fragments() {
        // bold navigation fragments like **NEW** are noise, not titles
        let text = "**NEW** [[paper]](u)\n**A Sufficiently Long Title Here** [[paper]](u)\n";
        assert_eq!(extract_titles(text), vec!["A Sufficiently Long Title Here"]);
    }

    #[test]
    fn test_extract_rejects_bracket_captures() {
        let text = "**[broken capture of a title]** [[paper]](u)\n";
        assert!(extract_titles(text).is_empty());
    }

    #[test]
    fn test_extract_trims_title_whitespace() {
        let text = "** A Title With Padding Around It ** [[paper]](u)\n";
        assert_eq!(extract_titles(text), vec!["A Title With Padding Around It"]);
    }

    #[test]
    fn test_extract_empty_document() {
        assert!(extract_titles("").is_empty());
    }

    #[test]
    fn test_link_may_follow_after_newline() {
        let text = "**A Title Split Across Lines Oddly**\n[[paper]](u)\n";
        assert_eq!(
            extract_titles(text),
            vec!["A Title Split Across Lines Oddly"]
        );
    }

    #[test]
    fn test_author_hint_after_one_link() {
        let hint = author_hint(ENTRY, "Attention Is All You Need");
        assert_eq!(hint.as_deref(), Some("Vaswani et al."));
    }

    #[test]
    fn test_author_hint_after_two_links() {
        let text = "**A Perfectly Ordinary Paper** \
            [[paper]](u1) [[code]](u2) [Smith, Jones et al.] [![](badge)]()";
        let hint = author_hint(text, "A Perfectly Ordinary Paper");
        assert_eq!(hint.as_deref(), Some("Smith, Jones et al."));
    }

    #[test]
    fn test_author_hint_skips_badge_group() {
        // group opening with '!' is an image, not authors
        let text = "**A Perfectly Ordinary Paper** [[paper]](u1) [![](badge)]()";
        assert_eq!(author_hint(text, "A Perfectly Ordinary Paper"), None);
    }

    #[test]
    fn test_author_hint_rejects_url_group() {
        let text = "**A Perfectly Ordinary Paper** [[paper]](u1) [see http://example.com]";
        assert_eq!(author_hint(text, "A Perfectly Ordinary Paper"), None);
    }

    #[test]
    fn test_author_hint_missing_title() {
        assert_eq!(author_hint(ENTRY, "Some Other Paper"), None);
    }

    #[test]
    fn test_author_hint_stays_on_line() {
        let text = "**A Perfectly Ordinary Paper** [[paper]](u1)\n[Next Line Authors]";
        assert_eq!(author_hint(text, "A Perfectly Ordinary Paper"), None);
    }

    #[test]
    fn test_read_document_missing_is_error() {
        let result = read_document(Path::new("/nonexistent/README.md"));
        assert!(result.is_err());
    }
}
