//! `runpad`: the editor core behind a small script editor with a run console.
//!
//! ## Reading guide
//! - **`buffer::Buffer`**: rope-backed text storage addressed by char offsets.
//! - **`history`**: undo/redo records and the stacks that hold them.
//! - **`document::Document`**: buffer + history + cursor + file association + derived
//!   metrics (line/word counts, highlight spans, find matches).
//! - **`highlight` / `search`**: the lexical highlighter and the literal find/replace engine.
//! - **`sandbox`**: runs the buffer as a script and captures what it prints.
//! - **`persist` / `autosave`**: whole-file reads/writes and the background save timer.
//! - **`ide::Ide`**: the entry points a UI calls (open/save/run/find/replace/format...).

pub mod autosave;
pub mod buffer;
pub mod config;
pub mod counter;
pub mod document;
pub mod format;
pub mod highlight;
pub mod history;
pub mod ide;
pub mod persist;
pub mod sandbox;
pub mod search;
pub mod types;
pub mod utils;
