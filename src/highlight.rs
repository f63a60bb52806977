//! Lexical syntax highlighting for Python-like source.
//!
//! This is a best-effort regex pass, not a tokenizer. Each rule scans the whole text on its
//! own, so nothing knows about nesting: a `#` inside a string literal still starts a
//! comment span and keywords inside strings are still tagged. Overlapping spans of different
//! categories are all reported.

use crate::types::{HighlightCategory, HighlightColor, HighlightSpan};
use crate::utils::CharCursor;
use regex::Regex;

/// Words tagged as keywords (whole-word matches only).
pub const KEYWORDS: [&str; 20] = [
    "def", "class", "if", "else", "elif", "for", "while", "return", "import", "from", "try",
    "except", "finally", "with", "as", "and", "or", "not", "is", "in",
];

/// String literal: shortest run to the matching quote on the same line. Escaped quotes and
/// triple-quoted strings are not understood.
const STRING_PATTERN: &str = r#"".*?"|'.*?'"#;

/// Comment: `#` up to the line terminator.
const COMMENT_PATTERN: &str = r"#[^\r\n]*";

/// A compiled highlight rule ready for matching.
struct CompiledRule {
    regex: Regex,
    category: HighlightCategory,
}

/// Scans text against the keyword, string and comment rules, in that order.
pub struct Highlighter {
    rules: Vec<CompiledRule>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        let keyword_pattern = format!(r"\b(?:{})\b", KEYWORDS.join("|"));
        let mut hl = Self { rules: Vec::new() };
        hl.register_rule(HighlightCategory::Keyword, &keyword_pattern);
        hl.register_rule(HighlightCategory::String, STRING_PATTERN);
        hl.register_rule(HighlightCategory::Comment, COMMENT_PATTERN);
        hl
    }

    /// Compile and append a rule; an invalid pattern is logged and skipped.
    fn register_rule(&mut self, category: HighlightCategory, pattern: &str) {
        match Regex::new(pattern) {
            Ok(regex) => self.rules.push(CompiledRule { regex, category }),
            Err(e) => tracing::error!(?category, pattern, error = %e, "invalid highlight pattern"),
        }
    }

    /// Compute highlight spans (char offsets) for the whole text.
    pub fn highlight(&self, text: &str) -> Vec<HighlightSpan> {
        let mut spans = Vec::new();

        for rule in &self.rules {
            let mut cursor = CharCursor::new(text);
            for m in rule.regex.find_iter(text) {
                let start = cursor.char_offset(m.start());
                let end = cursor.char_offset(m.end());
                spans.push(HighlightSpan { category: rule.category, start, end });
            }
        }

        // Stable: equal starts keep rule order.
        spans.sort_by_key(|s| s.start);
        spans
    }
}

/// Resolve the colors for one char offset.
///
/// Returns `(foreground, background)`. Among foreground spans the latest rule wins
/// (comment over string over keyword); `Match` spans only set the background.
pub fn style_at(
    spans: &[HighlightSpan],
    offset: usize,
) -> (Option<HighlightColor>, Option<HighlightColor>) {
    let mut fg: Option<HighlightCategory> = None;
    let mut bg = None;

    for span in spans.iter().filter(|s| s.contains(offset)) {
        if span.category.is_background() {
            bg = Some(span.category.color());
        } else if fg.map_or(true, |cur| rank(span.category) >= rank(cur)) {
            fg = Some(span.category);
        }
    }

    (fg.map(HighlightCategory::color), bg)
}

fn rank(category: HighlightCategory) -> u8 {
    match category {
        HighlightCategory::Keyword => 0,
        HighlightCategory::String => 1,
        HighlightCategory::Comment => 2,
        HighlightCategory::Match => 3,
    }
}
