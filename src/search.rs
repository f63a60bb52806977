//! Literal (non-regex) find and replace.

use crate::types::{HighlightCategory, HighlightSpan};
use crate::utils::CharCursor;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
    #[error("no query provided")]
    EmptyQuery,
}

/// Find every occurrence of `query` in `text`, left to right and non-overlapping: scanning
/// resumes at the end of the previous match, so `"aa"` occurs twice in `"aaaa"`.
pub fn find_all(text: &str, query: &str) -> Result<Vec<HighlightSpan>, SearchError> {
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    let mut cursor = CharCursor::new(text);
    Ok(text
        .match_indices(query)
        .map(|(at, m)| {
            let start = cursor.char_offset(at);
            let end = cursor.char_offset(at + m.len());
            HighlightSpan { category: HighlightCategory::Match, start, end }
        })
        .collect())
}

/// Replace every occurrence of `query`; returns the new text and how many were replaced.
pub fn replace_all(
    text: &str,
    query: &str,
    replacement: &str,
) -> Result<(String, usize), SearchError> {
    if query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }
    let count = text.matches(query).count();
    if count == 0 {
        return Ok((text.to_string(), 0));
    }
    Ok((text.replace(query, replacement), count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges(spans: &[HighlightSpan]) -> Vec<(usize, usize)> {
        spans.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn find_is_non_overlapping() {
        let spans = find_all("aaaa", "aa").unwrap();
        assert_eq!(ranges(&spans), vec![(0, 2), (2, 4)]);
        assert!(spans.iter().all(|s| s.category == HighlightCategory::Match));
    }

    #[test]
    fn find_treats_query_literally() {
        let spans = find_all("a.b a*b a.b", "a.b").unwrap();
        assert_eq!(ranges(&spans), vec![(0, 3), (8, 11)]);
    }

    #[test]
    fn find_reports_char_offsets() {
        let spans = find_all("日本 x 日本", "日本").unwrap();
        assert_eq!(ranges(&spans), vec![(0, 2), (5, 7)]);
    }

    #[test]
    fn find_without_hits_is_empty() {
        assert!(find_all("abc", "z").unwrap().is_empty());
    }

    #[test]
    fn empty_query_is_rejected() {
        assert_eq!(find_all("abc", ""), Err(SearchError::EmptyQuery));
        assert_eq!(replace_all("abc", "", "x"), Err(SearchError::EmptyQuery));
    }

    #[test]
    fn replace_counts_occurrences() {
        let (out, n) = replace_all("foo bar foo", "foo", "baz").unwrap();
        assert_eq!(out, "baz bar baz");
        assert_eq!(n, 2);
    }

    #[test]
    fn repeated_replace_with_empty_leaves_no_occurrences() {
        for (text, query) in [("aaaaa", "aa"), ("abab ab", "ab"), ("xaabby", "ab"), ("none", "q")] {
            let mut current = text.to_string();
            loop {
                let (next, n) = replace_all(&current, query, "").unwrap();
                current = next;
                if n == 0 {
                    break;
                }
            }
            assert!(find_all(&current, query).unwrap().is_empty(), "{text} / {query}");
        }
    }
}
