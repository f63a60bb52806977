//! Line/word/char counts for the status bar.
//!
//! Line count is the number of `\n` characters plus one: an empty document has one line and
//! a document ending in `\n` counts the empty line after it, like the gutter shows.

use crate::types::DocumentStats;

/// Count lines, whitespace-delimited words and chars in one pass.
pub fn count_chars(chars: impl Iterator<Item = char>) -> DocumentStats {
    let mut stats = DocumentStats { line_count: 1, word_count: 0, char_count: 0 };
    let mut in_word = false;

    for ch in chars {
        stats.char_count += 1;
        if ch == '\n' {
            stats.line_count += 1;
        }
        if ch.is_whitespace() {
            in_word = false;
        } else if !in_word {
            in_word = true;
            stats.word_count += 1;
        }
    }

    stats
}

pub fn count(text: &str) -> DocumentStats {
    count_chars(text.chars())
}
