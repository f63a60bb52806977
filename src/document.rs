//! The document: buffer, edit history, cursor, file association and derived metrics.

use crate::buffer::Buffer;
use crate::counter;
use crate::highlight::Highlighter;
use crate::history::{EditOperation, History, UndoEntry};
use crate::persist::{self, PersistError};
use crate::search::{self, SearchError};
use crate::types::{DocumentStats, HighlightSpan, Pos};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// A document shared between the UI thread and the auto-save worker.
///
/// Every write to disk happens while this lock is held, so a manual save and an auto-save
/// can never interleave.
pub type SharedDocument = Arc<Mutex<Document>>;

/// Lock a shared document, recovering the data if a previous holder panicked.
pub fn lock(doc: &SharedDocument) -> MutexGuard<'_, Document> {
    doc.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The editable text plus everything derived from it.
pub struct Document {
    buf: Buffer,
    history: History,
    /// Cursor as a char offset.
    cursor: usize,
    /// Selection anchor. If `Some`, the selection runs from this anchor to `cursor`.
    anchor: Option<usize>,
    /// Path we'll save to. `None` means the buffer hasn't been associated with a file yet.
    path: Option<PathBuf>,
    /// Content as last read from or written to disk.
    saved_text: String,
    last_saved: Option<Instant>,
    stats: DocumentStats,
    highlighter: Highlighter,
    /// Syntax spans; `None` after an edit until someone asks for them again.
    syntax: Option<Vec<HighlightSpan>>,
    /// Find results, dropped on the next edit.
    matches: Vec<HighlightSpan>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A new, empty, unsaved document.
    pub fn new() -> Self {
        Self {
            buf: Buffer::new(),
            history: History::new(),
            cursor: 0,
            anchor: None,
            path: None,
            saved_text: String::new(),
            last_saved: None,
            stats: counter::count(""),
            highlighter: Highlighter::new(),
            syntax: None,
            matches: Vec::new(),
        }
    }

    /// A document holding `text` that was just loaded from `path`.
    pub fn from_file(path: PathBuf, text: &str) -> Self {
        let mut doc = Self::new();
        doc.buf = Buffer::from_string(text);
        doc.saved_text = text.to_string();
        doc.path = Some(path);
        doc.last_saved = Some(Instant::now());
        doc.after_edit();
        doc
    }

    /// Read `path` into a fresh document.
    pub fn open(path: &Path) -> Result<Self, PersistError> {
        let text = persist::open(path)?;
        Ok(Self::from_file(path.to_path_buf(), &text))
    }

    // ===== Read access =====

    pub fn text(&self) -> String {
        self.buf.text()
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buf
    }

    pub fn stats(&self) -> DocumentStats {
        self.stats
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn last_saved(&self) -> Option<Instant> {
        self.last_saved
    }

    /// "Dirty" means the content differs from what was last persisted.
    pub fn is_dirty(&self) -> bool {
        !self.buf.content_eq(&self.saved_text)
    }

    /// File base name, or `untitled` for a document never saved.
    pub fn display_name(&self) -> String {
        self.path
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(|| "untitled".to_string(), |n| n.to_string_lossy().into_owned())
    }

    // ===== Cursor and selection =====

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn cursor_pos(&self) -> Pos {
        self.buf.offset_to_pos(self.cursor)
    }

    /// Move the cursor. With `selecting`, a selection is started (or extended) from the
    /// old cursor; otherwise any selection is dropped.
    pub fn set_cursor(&mut self, offset: usize, selecting: bool) {
        if selecting {
            if self.anchor.is_none() {
                self.anchor = Some(self.cursor);
            }
        } else {
            self.anchor = None;
        }
        self.cursor = offset.min(self.buf.len_chars());
    }

    /// Return the normalized selection range.
    pub fn selection(&self) -> Option<(usize, usize)> {
        let a = self.anchor?;
        if a == self.cursor {
            None
        } else {
            Some((a.min(self.cursor), a.max(self.cursor)))
        }
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    // ===== Edits =====

    /// Replace the whole content as one undoable step.
    pub fn replace_all(&mut self, text: &str) {
        if self.buf.content_eq(text) {
            return;
        }
        let cursor_before = self.cursor;
        let old_text = self.buf.replace_all(text);
        self.commit(UndoEntry {
            op: EditOperation::Replace { offset: 0, old_text, new_text: text.to_string() },
            cursor_before,
        });
        self.cursor = self.cursor.min(self.buf.len_chars());
    }

    /// Insert `text` at a char offset; the cursor lands after it.
    pub fn insert(&mut self, offset: usize, text: &str) {
        if text.is_empty() {
            return;
        }
        let offset = offset.min(self.buf.len_chars());
        let cursor_before = self.cursor;
        self.cursor = self.buf.insert(offset, text);
        self.commit(UndoEntry {
            op: EditOperation::Insert { offset, text: text.to_string() },
            cursor_before,
        });
    }

    /// Delete a char range; the cursor lands where the range started.
    pub fn delete_range(&mut self, start: usize, end: usize) {
        let offset = start.min(end).min(self.buf.len_chars());
        let cursor_before = self.cursor;
        let deleted_text = self.buf.delete_range(start, end);
        if deleted_text.is_empty() {
            return;
        }
        self.cursor = offset;
        self.commit(UndoEntry { op: EditOperation::Delete { offset, deleted_text }, cursor_before });
    }

    /// Typing: replace the selection with `text`, or insert at the cursor.
    pub fn replace_selection(&mut self, text: &str) {
        let Some((a, b)) = self.selection() else {
            self.insert(self.cursor, text);
            return;
        };
        if text.is_empty() {
            self.delete_range(a, b);
            return;
        }
        let cursor_before = self.cursor;
        let old_text = self.buf.delete_range(a, b);
        self.cursor = self.buf.insert(a, text);
        self.commit(UndoEntry {
            op: EditOperation::Replace { offset: a, old_text, new_text: text.to_string() },
            cursor_before,
        });
    }

    /// Backspace: remove the selection or the char before the cursor.
    pub fn delete_backward(&mut self) {
        if let Some((a, b)) = self.selection() {
            self.delete_range(a, b);
        } else if self.cursor > 0 {
            self.delete_range(self.cursor - 1, self.cursor);
        }
    }

    /// Delete key: remove the selection or the char under the cursor.
    pub fn delete_forward(&mut self) {
        if let Some((a, b)) = self.selection() {
            self.delete_range(a, b);
        } else {
            self.delete_range(self.cursor, self.cursor + 1);
        }
    }

    /// Undo the most recent edit. Returns `false` (and does nothing) if there is none.
    pub fn undo(&mut self) -> bool {
        let Some(entry) = self.history.pop_undo() else { return false; };
        let redo_op = entry.op.revert(&mut self.buf);
        self.history.push_redo(UndoEntry { op: redo_op, cursor_before: self.cursor });
        self.cursor = entry.cursor_before.min(self.buf.len_chars());
        self.anchor = None;
        self.after_edit();
        true
    }

    /// Redo the most recently undone edit. Returns `false` (and does nothing) if there is none.
    pub fn redo(&mut self) -> bool {
        let Some(entry) = self.history.pop_redo() else { return false; };
        let undo_op = entry.op.revert(&mut self.buf);
        self.history.push_undo(UndoEntry { op: undo_op, cursor_before: self.cursor });
        self.cursor = entry.cursor_before.min(self.buf.len_chars());
        self.anchor = None;
        self.after_edit();
        true
    }

    fn commit(&mut self, entry: UndoEntry) {
        self.history.record(entry);
        self.anchor = None;
        self.after_edit();
    }

    /// Recompute counts and drop every derived span.
    fn after_edit(&mut self) {
        self.stats = counter::count_chars(self.buf.chars());
        self.syntax = None;
        self.matches.clear();
    }

    // ===== Highlighting and search =====

    /// Syntax spans for the current text, rescanning the whole document if an edit
    /// invalidated the previous scan.
    pub fn syntax_spans(&mut self) -> &[HighlightSpan] {
        let spans = match self.syntax.take() {
            Some(spans) => spans,
            None => self.highlighter.highlight(&self.buf.text()),
        };
        self.syntax.insert(spans)
    }

    /// Current find results.
    pub fn match_spans(&self) -> &[HighlightSpan] {
        &self.matches
    }

    /// Syntax and match spans together, ordered by start offset.
    pub fn render_spans(&mut self) -> Vec<HighlightSpan> {
        let mut spans = self.syntax_spans().to_vec();
        spans.extend_from_slice(&self.matches);
        spans.sort_by_key(|s| s.start);
        spans
    }

    /// Mark every occurrence of `query`; returns the number found.
    pub fn find(&mut self, query: &str) -> Result<usize, SearchError> {
        self.matches = search::find_all(&self.buf.text(), query)?;
        Ok(self.matches.len())
    }

    pub fn clear_matches(&mut self) {
        self.matches.clear();
    }

    /// Replace every occurrence of `query` as a single undo step; returns how many.
    pub fn replace_occurrences(
        &mut self,
        query: &str,
        replacement: &str,
    ) -> Result<usize, SearchError> {
        let (text, count) = search::replace_all(&self.buf.text(), query, replacement)?;
        if count > 0 {
            self.replace_all(&text);
        }
        Ok(count)
    }

    // ===== Persistence =====

    /// Write the content to `path` and make it the document's file.
    pub fn save_to(&mut self, path: &Path) -> Result<(), PersistError> {
        let text = self.buf.text();
        persist::save(path, &text)?;
        self.path = Some(path.to_path_buf());
        self.saved_text = text;
        self.last_saved = Some(Instant::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_is_clean_and_untitled() {
        let doc = Document::new();
        assert!(!doc.is_dirty());
        assert_eq!(doc.display_name(), "untitled");
        assert_eq!(doc.stats().line_count, 1);
    }

    #[test]
    fn edits_update_counts() {
        let mut doc = Document::new();
        doc.insert(0, "def f():\n    return 1\n");
        let stats = doc.stats();
        assert_eq!(stats.line_count, 3);
        assert_eq!(stats.word_count, 4);
        doc.delete_range(0, 9);
        assert_eq!(doc.stats().line_count, 2);
        assert_eq!(doc.text(), "    return 1\n");
    }

    #[test]
    fn any_text_is_accepted() {
        let mut doc = Document::new();
        doc.replace_all("def (((:\n\u{0}\u{7f} 'unterminated");
        assert!(doc.text().contains("unterminated"));
    }

    #[test]
    fn undo_redo_restores_every_state() {
        let mut doc = Document::new();
        let mut states = vec![doc.text()];

        doc.insert(0, "hello");
        states.push(doc.text());
        doc.insert(5, " wörld\n");
        states.push(doc.text());
        doc.delete_range(0, 2);
        states.push(doc.text());
        doc.replace_all("print(1)");
        states.push(doc.text());
        doc.set_cursor(0, false);
        doc.set_cursor(5, true);
        doc.replace_selection("debug");
        states.push(doc.text());

        let n = states.len() - 1;
        for i in (0..n).rev() {
            assert!(doc.undo());
            assert_eq!(doc.text(), states[i]);
        }
        assert!(!doc.undo());
        for state in states.iter().skip(1) {
            assert!(doc.redo());
            assert_eq!(&doc.text(), state);
        }
        assert!(!doc.redo());
    }

    #[test]
    fn undo_and_redo_on_empty_stacks_are_noops() {
        let mut doc = Document::new();
        doc.replace_all("x");
        let mut fresh = Document::new();
        assert!(!fresh.undo());
        assert!(!fresh.redo());
        assert_eq!(fresh.text(), "");
        assert!(!doc.redo());
        assert_eq!(doc.text(), "x");
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut doc = Document::new();
        doc.insert(0, "a");
        doc.insert(1, "b");
        assert!(doc.undo());
        doc.insert(1, "c");
        assert!(!doc.redo());
        assert_eq!(doc.text(), "ac");
    }

    #[test]
    fn undo_restores_cursor() {
        let mut doc = Document::new();
        doc.insert(0, "abc");
        assert_eq!(doc.cursor(), 3);
        doc.set_cursor(1, false);
        doc.insert(1, "XY");
        assert_eq!(doc.cursor(), 3);
        doc.undo();
        assert_eq!(doc.cursor(), 1);
    }

    #[test]
    fn typing_replaces_selection_in_one_step() {
        let mut doc = Document::new();
        doc.insert(0, "hello world");
        doc.set_cursor(6, false);
        doc.set_cursor(11, true);
        assert_eq!(doc.selection(), Some((6, 11)));
        doc.replace_selection("there");
        assert_eq!(doc.text(), "hello there");
        assert_eq!(doc.selection(), None);
        doc.undo();
        assert_eq!(doc.text(), "hello world");
    }

    #[test]
    fn backspace_and_delete() {
        let mut doc = Document::new();
        doc.insert(0, "abc");
        doc.delete_backward();
        assert_eq!(doc.text(), "ab");
        doc.set_cursor(0, false);
        doc.delete_forward();
        assert_eq!(doc.text(), "b");
        doc.delete_backward();
        assert_eq!(doc.text(), "b");
    }

    #[test]
    fn edits_invalidate_syntax_and_matches() {
        let mut doc = Document::new();
        doc.insert(0, "if x:");
        assert_eq!(doc.syntax_spans().len(), 1);
        assert_eq!(doc.find("x").unwrap(), 1);
        assert_eq!(doc.match_spans().len(), 1);

        doc.insert(0, "# ");
        assert!(doc.match_spans().is_empty());
        let spans = doc.syntax_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].end), (0, 7));
    }

    #[test]
    fn render_spans_merge_syntax_and_matches() {
        let mut doc = Document::new();
        doc.insert(0, "x = 'in'");
        doc.find("x").unwrap();
        let spans = doc.render_spans();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].start, 0);
    }

    #[test]
    fn replace_occurrences_is_a_single_undo_step() {
        let mut doc = Document::new();
        doc.insert(0, "a-b-c-d");
        assert_eq!(doc.replace_occurrences("-", "+").unwrap(), 3);
        assert_eq!(doc.text(), "a+b+c+d");
        assert!(doc.undo());
        assert_eq!(doc.text(), "a-b-c-d");
    }

    #[test]
    fn replace_without_hits_records_nothing() {
        let mut doc = Document::new();
        doc.insert(0, "abc");
        assert_eq!(doc.replace_occurrences("z", "y").unwrap(), 0);
        assert!(doc.undo());
        assert_eq!(doc.text(), "");
    }

    #[test]
    fn empty_query_changes_nothing() {
        let mut doc = Document::new();
        doc.insert(0, "abc");
        assert_eq!(doc.find(""), Err(SearchError::EmptyQuery));
        assert_eq!(doc.replace_occurrences("", "x"), Err(SearchError::EmptyQuery));
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn save_marks_clean_and_sets_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.py");
        let mut doc = Document::new();
        doc.insert(0, "print('hi')\n");
        assert!(doc.is_dirty());

        doc.save_to(&path).unwrap();
        assert!(!doc.is_dirty());
        assert_eq!(doc.display_name(), "script.py");
        assert!(doc.last_saved().is_some());

        doc.insert(0, "#");
        assert!(doc.is_dirty());
        doc.undo();
        assert!(!doc.is_dirty());
    }

    #[test]
    fn open_then_save_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unicode.txt");
        let text = "mixed\r\nendings\nüñí 日本語 😀\n\ttab\r";
        let mut doc = Document::new();
        doc.replace_all(text);
        doc.save_to(&path).unwrap();

        let reopened = Document::open(&path).unwrap();
        assert_eq!(reopened.text(), text);
        assert_eq!(std::fs::read(&path).unwrap(), text.as_bytes());
        assert!(!reopened.is_dirty());
    }

    #[test]
    fn opening_a_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Document::open(&dir.path().join("missing.py")).err().unwrap();
        assert!(matches!(err, PersistError::Read { .. }));
    }
}
