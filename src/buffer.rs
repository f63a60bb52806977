//! The document buffer: stores text in a Rope and edits it by char offset.

use crate::types::Pos;
use ropey::Rope;
use std::borrow::Cow;
use std::ops::Range;

/// The document buffer using a Rope data structure.
///
/// Text is kept exactly as loaded (no line-ending normalization), so what is saved is what
/// was opened. Every offset taken or returned here is a **char** offset; out-of-range offsets
/// are clamped to the end of the text. Only `\n` (and so `\r\n`) ends a line: ropey is built
/// without its Unicode line breaks, matching the status-bar line count.
#[derive(Clone, Default)]
pub struct Buffer {
    text: Rope,
}

impl Buffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self { text: Rope::new() }
    }

    /// Build a buffer holding `s` verbatim.
    pub fn from_string(s: &str) -> Self {
        Self { text: Rope::from_str(s) }
    }

    /// The whole text as a `String`.
    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// Whether the buffer content equals `s`.
    pub fn content_eq(&self, s: &str) -> bool {
        self.text == s
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.text.len_chars() == 0
    }

    /// Iterate over all chars without building a `String`.
    pub fn chars(&self) -> ropey::iter::Chars<'_> {
        self.text.chars()
    }

    /// Clamp and order a `(start, end)` pair into a valid char range.
    fn range(&self, start: usize, end: usize) -> Range<usize> {
        let len = self.text.len_chars();
        let (a, b) = if start <= end { (start, end) } else { (end, start) };
        a.min(len)..b.min(len)
    }

    /// Insert `s` at `offset`, returning the offset just past the inserted text.
    pub fn insert(&mut self, offset: usize, s: &str) -> usize {
        let idx = offset.min(self.text.len_chars());
        self.text.insert(idx, s);
        idx + s.chars().count()
    }

    /// Delete a `(start, end)` range and return the removed text.
    pub fn delete_range(&mut self, start: usize, end: usize) -> String {
        let r = self.range(start, end);
        if r.is_empty() {
            return String::new();
        }
        let removed = self.text.slice(r.clone()).to_string();
        self.text.remove(r);
        removed
    }

    /// Replace the whole content, returning the previous text.
    pub fn replace_all(&mut self, s: &str) -> String {
        let old = self.text();
        self.text = Rope::from_str(s);
        old
    }

    /// Number of display lines (a trailing newline opens one more, empty, line).
    pub fn line_count(&self) -> usize {
        self.text.len_lines().max(1)
    }

    /// Char offset where line `y` starts (end of text past the last line).
    pub fn line_start(&self, y: usize) -> usize {
        if y >= self.text.len_lines() {
            return self.text.len_chars();
        }
        self.text.line_to_char(y)
    }

    /// Get the text of a specific line (without its line terminator).
    pub fn line(&self, y: usize) -> Cow<'_, str> {
        if y >= self.text.len_lines() {
            return Cow::Borrowed("");
        }
        let line = self.text.line(y);
        match line.as_str() {
            Some(s) => Cow::Borrowed(s.trim_end_matches(['\n', '\r'])),
            None => Cow::Owned(line.to_string().trim_end_matches(['\n', '\r']).to_string()),
        }
    }

    /// Get the character count of a specific line (excluding its terminator).
    pub fn line_len_chars(&self, y: usize) -> usize {
        self.line(y).chars().count()
    }

    /// Clamp a position to a valid line and a valid column within that line.
    pub fn clamp_pos(&self, mut p: Pos) -> Pos {
        p.y = p.y.min(self.line_count().saturating_sub(1));
        p.x = p.x.min(self.line_len_chars(p.y));
        p
    }

    /// Convert a Pos (line, char) to a global char offset.
    pub fn pos_to_offset(&self, p: Pos) -> usize {
        if p.y >= self.text.len_lines() {
            return self.text.len_chars();
        }
        self.text.line_to_char(p.y) + p.x.min(self.line_len_chars(p.y))
    }

    /// Convert a global char offset to a Pos (line, char).
    pub fn offset_to_pos(&self, offset: usize) -> Pos {
        let offset = offset.min(self.text.len_chars());
        let y = self.text.char_to_line(offset);
        let x = offset - self.text.line_to_char(y);
        Pos { y, x }
    }
}
