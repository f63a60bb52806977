//! Undo/redo records.

use crate::buffer::Buffer;

/// Maximum number of undo entries kept; older ones are dropped.
pub const HISTORY_CAP: usize = 1000;

/// An atomic edit operation in the document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOperation {
    /// Text was inserted at a char offset.
    Insert { offset: usize, text: String },
    /// Text was removed starting at a char offset.
    /// We store the `deleted_text` so we can restore it during undo.
    Delete { offset: usize, deleted_text: String },
    /// `old_text` at `offset` was swapped for `new_text` in one step
    /// (selection replacement, replace-all, formatting).
    Replace { offset: usize, old_text: String, new_text: String },
}

impl EditOperation {
    /// Undo this operation on `buf` and return the operation that would redo it.
    ///
    /// Undo and redo both go through here: popping an entry from either stack reverts it and
    /// the returned inverse goes onto the other stack.
    pub fn revert(&self, buf: &mut Buffer) -> EditOperation {
        match self {
            Self::Insert { offset, text } => {
                let end = offset + text.chars().count();
                let deleted_text = buf.delete_range(*offset, end);
                Self::Delete { offset: *offset, deleted_text }
            }
            Self::Delete { offset, deleted_text } => {
                buf.insert(*offset, deleted_text);
                Self::Insert { offset: *offset, text: deleted_text.clone() }
            }
            Self::Replace { offset, old_text, new_text } => {
                let end = offset + new_text.chars().count();
                buf.delete_range(*offset, end);
                buf.insert(*offset, old_text);
                Self::Replace {
                    offset: *offset,
                    old_text: new_text.clone(),
                    new_text: old_text.clone(),
                }
            }
        }
    }
}

/// A single entry in the undo/redo stack.
#[derive(Clone, Debug)]
pub struct UndoEntry {
    /// The operation performed.
    pub op: EditOperation,
    /// Cursor offset before the operation (to restore on undo).
    pub cursor_before: usize,
}

/// Undo and redo stacks.
#[derive(Default)]
pub struct History {
    undo: Vec<UndoEntry>,
    redo: Vec<UndoEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly committed edit. This invalidates everything that could be redone.
    pub fn record(&mut self, entry: UndoEntry) {
        self.undo.push(entry);
        if self.undo.len() > HISTORY_CAP {
            self.undo.drain(0..(self.undo.len() - HISTORY_CAP));
        }
        self.redo.clear();
    }

    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        self.undo.pop()
    }

    pub fn pop_redo(&mut self) -> Option<UndoEntry> {
        self.redo.pop()
    }

    /// Push onto the undo stack without touching redo (used by redo itself).
    pub fn push_undo(&mut self, entry: UndoEntry) {
        self.undo.push(entry);
    }

    pub fn push_redo(&mut self, entry: UndoEntry) {
        self.redo.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(op: EditOperation) -> UndoEntry {
        UndoEntry { op, cursor_before: 0 }
    }

    #[test]
    fn revert_insert_deletes_it() {
        let mut buf = Buffer::from_string("abXYc");
        let op = EditOperation::Insert { offset: 2, text: "XY".into() };
        let inverse = op.revert(&mut buf);
        assert_eq!(buf.text(), "abc");
        assert_eq!(inverse, EditOperation::Delete { offset: 2, deleted_text: "XY".into() });
    }

    #[test]
    fn revert_delete_restores_text() {
        let mut buf = Buffer::from_string("ac");
        let op = EditOperation::Delete { offset: 1, deleted_text: "b\n".into() };
        let inverse = op.revert(&mut buf);
        assert_eq!(buf.text(), "ab\nc");
        assert_eq!(inverse, EditOperation::Insert { offset: 1, text: "b\n".into() });
    }

    #[test]
    fn revert_replace_swaps_texts() {
        let mut buf = Buffer::from_string("x = 日本");
        let op = EditOperation::Replace { offset: 4, old_text: "1".into(), new_text: "日本".into() };
        let inverse = op.revert(&mut buf);
        assert_eq!(buf.text(), "x = 1");
        inverse.revert(&mut buf);
        assert_eq!(buf.text(), "x = 日本");
    }

    #[test]
    fn recording_clears_redo() {
        let mut h = History::new();
        h.record(entry(EditOperation::Insert { offset: 0, text: "a".into() }));
        let e = h.pop_undo().unwrap();
        h.push_redo(e);

        h.record(entry(EditOperation::Insert { offset: 0, text: "b".into() }));
        assert!(h.pop_redo().is_none());
        assert!(h.pop_undo().is_some());
    }

    #[test]
    fn push_undo_keeps_redo() {
        let mut h = History::new();
        h.push_redo(entry(EditOperation::Insert { offset: 0, text: "a".into() }));
        h.push_undo(entry(EditOperation::Insert { offset: 0, text: "b".into() }));
        assert!(h.pop_redo().is_some());
    }

    #[test]
    fn history_is_capped() {
        let mut h = History::new();
        for i in 0..(HISTORY_CAP + 10) {
            h.record(entry(EditOperation::Insert { offset: i, text: "x".into() }));
        }
        let mut n = 0;
        while h.pop_undo().is_some() {
            n += 1;
        }
        assert_eq!(n, HISTORY_CAP);
    }
}
