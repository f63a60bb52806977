//! The operations the UI shell calls: document lifecycle, running, editing, theme,
//! auto-save and formatting.

use crate::autosave::{AutoSave, AutoSaveEvent};
use crate::config::Config;
use crate::document::{self, Document, SharedDocument};
use crate::format::{ExternalFormatter, FormatError};
use crate::persist::PersistError;
use crate::sandbox::{CancelToken, RunError, RunOutput, Sandbox};
use crate::search::SearchError;
use crate::types::Theme;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

pub const APP_NAME: &str = "Runpad";

/// Result of a plain save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// The document has no file yet; ask for one and call `save_document_as`.
    NeedsPath,
}

/// A program executing on a worker thread.
struct RunningProgram {
    cancel: CancelToken,
    result_rx: Receiver<Result<RunOutput, RunError>>,
}

pub struct Ide {
    doc: SharedDocument,
    sandbox: Arc<dyn Sandbox>,
    formatter: Option<ExternalFormatter>,
    autosave: AutoSave,
    theme: Theme,
    console: String,
    running: Option<RunningProgram>,
}

impl Ide {
    pub fn from_config(cfg: &Config) -> Self {
        let mut ide = Self {
            doc: Arc::new(Mutex::new(Document::new())),
            sandbox: Arc::from(cfg.run.build_sandbox()),
            formatter: ExternalFormatter::from_config(&cfg.format),
            autosave: AutoSave::new(cfg.autosave.interval()),
            theme: cfg.theme,
            console: String::new(),
            running: None,
        };
        if cfg.autosave.enabled {
            ide.autosave.start(&ide.doc);
        }
        ide
    }

    /// Lock the current document.
    pub fn document(&self) -> MutexGuard<'_, Document> {
        document::lock(&self.doc)
    }

    // ===== Document lifecycle =====

    /// Start over with an empty, unsaved document.
    pub fn new_document(&mut self) {
        *self.document() = Document::new();
        tracing::info!("new document");
    }

    /// Replace the document with the contents of `path`. On error the current document
    /// is left untouched.
    pub fn open_document(&mut self, path: &Path) -> Result<(), PersistError> {
        let doc = Document::open(path)?;
        *self.document() = doc;
        Ok(())
    }

    /// Save to the document's file, or report that a path is needed first.
    pub fn save_document(&mut self) -> Result<SaveOutcome, PersistError> {
        let mut doc = self.document();
        let Some(path) = doc.path().map(Path::to_path_buf) else {
            return Ok(SaveOutcome::NeedsPath);
        };
        doc.save_to(&path)?;
        Ok(SaveOutcome::Saved(path))
    }

    pub fn save_document_as(&mut self, path: &Path) -> Result<(), PersistError> {
        self.document().save_to(path)
    }

    /// Drop the document and its file association.
    pub fn close_document(&mut self) {
        *self.document() = Document::new();
        tracing::info!("document closed");
    }

    /// Whether new/open/close/quit should offer to save first.
    pub fn needs_save_prompt(&self) -> bool {
        self.document().is_dirty()
    }

    /// `Runpad - name`, with `*` after the name while there are unsaved changes.
    pub fn title(&self) -> String {
        let doc = self.document();
        let marker = if doc.is_dirty() { "*" } else { "" };
        format!("{APP_NAME} - {}{marker}", doc.display_name())
    }

    // ===== Running =====

    pub fn runner_name(&self) -> &'static str {
        self.sandbox.name()
    }

    /// Run the document on the calling thread and show the result in the console.
    ///
    /// A blank document, or a run that fails before producing output, leaves the console as
    /// it was.
    pub fn run_program(&mut self) -> Result<RunOutput, RunError> {
        if self.running.is_some() {
            return Err(RunError::Busy);
        }
        let source = self.document().text();
        if source.trim().is_empty() {
            return Err(RunError::EmptyProgram);
        }
        let out = self.sandbox.run(&source, &CancelToken::new())?;
        self.console = out.console_text();
        Ok(out)
    }

    /// Start running the document on a worker thread; see [`poll_program`](Self::poll_program).
    pub fn start_program(&mut self) -> Result<(), RunError> {
        if self.running.is_some() {
            return Err(RunError::Busy);
        }
        let source = self.document().text();
        if source.trim().is_empty() {
            return Err(RunError::EmptyProgram);
        }

        let cancel = CancelToken::new();
        let (result_tx, result_rx) = mpsc::channel();
        let sandbox = Arc::clone(&self.sandbox);
        let worker_cancel = cancel.clone();
        thread::spawn(move || {
            let result = sandbox.run(&source, &worker_cancel);
            // The receiver is gone only if the editor shut down.
            let _ = result_tx.send(result);
        });
        tracing::info!(runner = self.sandbox.name(), "program started");
        self.running = Some(RunningProgram { cancel, result_rx });
        Ok(())
    }

    /// Collect the result of a program started with `start_program`, if it has finished.
    pub fn poll_program(&mut self) -> Option<Result<RunOutput, RunError>> {
        let running = self.running.as_ref()?;
        let result = match running.result_rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(RunError::WorkerLost),
        };
        self.running = None;
        if let Ok(out) = &result {
            self.console = out.console_text();
        }
        Some(result)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Ask the running program to stop. Returns `false` if nothing is running.
    pub fn cancel_program(&self) -> bool {
        match &self.running {
            Some(running) => {
                running.cancel.cancel();
                tracing::info!("program cancel requested");
                true
            }
            None => false,
        }
    }

    pub fn console(&self) -> &str {
        &self.console
    }

    pub fn clear_console(&mut self) {
        self.console.clear();
    }

    // ===== Editing =====

    pub fn undo(&mut self) -> bool {
        self.document().undo()
    }

    pub fn redo(&mut self) -> bool {
        self.document().redo()
    }

    /// Highlight every occurrence of `query`; returns how many there are.
    pub fn find(&mut self, query: &str) -> Result<usize, SearchError> {
        self.document().find(query)
    }

    /// Replace every occurrence as one undo step; returns how many were replaced.
    pub fn replace_all(&mut self, query: &str, replacement: &str) -> Result<usize, SearchError> {
        let count = self.document().replace_occurrences(query, replacement)?;
        tracing::info!(count, "replace all");
        Ok(count)
    }

    // ===== Theme, auto-save, formatting =====

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    pub fn auto_save_enabled(&self) -> bool {
        self.autosave.is_enabled()
    }

    pub fn auto_save_interval(&self) -> Duration {
        self.autosave.interval()
    }

    /// Turn auto-save on or off; returns the new state.
    pub fn toggle_auto_save(&mut self) -> bool {
        self.autosave.toggle(&self.doc)
    }

    /// Auto-save results since the last poll.
    pub fn poll_autosave(&self) -> Vec<AutoSaveEvent> {
        self.autosave.poll_events()
    }

    /// Replace the document with the formatter's output as one undo step.
    pub fn auto_format(&mut self) -> Result<(), FormatError> {
        let formatter = self.formatter.as_ref().ok_or(FormatError::NotConfigured)?;
        let source = self.document().text();
        let formatted = formatter.format(&source)?;
        self.document().replace_all(&formatted);
        tracing::info!(formatter = formatter.program(), "document formatted");
        Ok(())
    }
}

impl Drop for Ide {
    fn drop(&mut self) {
        self.cancel_program();
    }
}
