//! Document, search and run actions behind the commands and prompts.

use super::prompt::PromptKind;
use super::{Editor, PendingAction};
use anyhow::{Context, Result};
use runpad::autosave::AutoSaveEvent;
use runpad::ide::SaveOutcome;
use runpad::sandbox::RunError;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl Editor {
    // ===== Save-changes confirmation =====

    /// Run `action` now, or ask "save changes?" first if the document is dirty.
    pub(crate) fn request(&mut self, action: PendingAction) -> Result<()> {
        if self.ide.needs_save_prompt() {
            self.pending = Some(action);
            self.open_prompt(PromptKind::Confirm, "");
            return Ok(());
        }
        self.perform(action)
    }

    /// Answer to the confirmation prompt. `yes` saves first; a document without a path
    /// goes through Save As and the action resumes once that succeeds.
    pub(crate) fn answer_confirm(&mut self, yes: bool) -> Result<()> {
        let Some(action) = self.pending.take() else { return Ok(()); };
        if yes && !self.save_or_prompt()? {
            self.pending = Some(action);
            return Ok(());
        }
        self.perform(action)
    }

    fn perform(&mut self, action: PendingAction) -> Result<()> {
        match action {
            PendingAction::New => {
                self.ide.new_document();
                self.reset_view();
                self.set_status("New document", Duration::from_secs(2));
            }
            PendingAction::Open => self.open_prompt(PromptKind::Open, ""),
            PendingAction::Close => {
                self.ide.close_document();
                self.reset_view();
                self.set_status("Document closed", Duration::from_secs(2));
            }
            PendingAction::Quit => self.quit_requested = true,
        }
        Ok(())
    }

    fn reset_view(&mut self) {
        self.scroll_y = 0;
        self.scroll_x = 0;
        self.suggested_path = None;
        self.mark_redraw();
    }

    // ===== Files =====

    /// Save the document.
    pub fn cmd_save(&mut self) -> Result<()> {
        self.save_or_prompt().map(|_| ())
    }

    /// Save to the current path. Returns `false` if a Save As prompt was opened instead.
    fn save_or_prompt(&mut self) -> Result<bool> {
        match self.ide.save_document().context("Save failed")? {
            SaveOutcome::Saved(path) => {
                self.set_status(format!("Saved: {}", path.display()), Duration::from_secs(2));
                Ok(true)
            }
            SaveOutcome::NeedsPath => {
                self.cmd_save_as();
                Ok(false)
            }
        }
    }

    pub(crate) fn cmd_save_as(&mut self) {
        let initial = self
            .suggested_path
            .clone()
            .or_else(|| self.ide.document().path().map(Path::to_path_buf))
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        self.open_prompt(PromptKind::SaveAs, initial);
    }

    /// Save the buffer to a specific path, then resume whatever was waiting on the save.
    pub fn save_to_path(&mut self, path: PathBuf) -> Result<()> {
        self.ide
            .save_document_as(&path)
            .with_context(|| format!("Failed writing {}", path.display()))?;
        self.suggested_path = None;
        self.set_status(format!("Saved: {}", path.display()), Duration::from_secs(2));
        if let Some(action) = self.pending.take() {
            self.perform(action)?;
        }
        Ok(())
    }

    /// Open a file.
    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        self.ide
            .open_document(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.reset_view();
        self.ensure_visible()?;
        self.set_status(format!("Opened: {}", path.display()), Duration::from_secs(2));
        Ok(())
    }

    // ===== Search =====

    /// Highlight every occurrence and jump to the next one after the cursor.
    pub fn find_all(&mut self, query: &str) -> Result<()> {
        self.last_find = Some(query.to_string());
        let count = self.ide.find(query)?;
        if count == 0 {
            self.set_status(format!("No matches for '{query}'"), Duration::from_secs(2));
            return Ok(());
        }
        {
            let mut doc = self.ide.document();
            let cursor = doc.cursor();
            let spans = doc.match_spans();
            let target = spans.iter().find(|s| s.start >= cursor).or(spans.first()).map(|s| s.start);
            if let Some(start) = target {
                doc.set_cursor(start, false);
            }
        }
        self.ensure_visible()?;
        self.set_status(format!("{count} match(es)"), Duration::from_secs(2));
        Ok(())
    }

    pub fn replace_all(&mut self, query: &str, replacement: &str) -> Result<()> {
        let count = self.ide.replace_all(query, replacement)?;
        self.ensure_visible()?;
        self.set_status(format!("Replaced {count} occurrence(s)"), Duration::from_secs(2));
        Ok(())
    }

    // ===== Running =====

    /// Run the document on a worker thread; output lands in the console when it finishes.
    pub fn cmd_run(&mut self) -> Result<()> {
        match self.ide.start_program() {
            Ok(()) => self.set_status(
                format!("Running ({})… Esc cancels", self.ide.runner_name()),
                Duration::from_secs(60),
            ),
            Err(RunError::EmptyProgram) => {
                self.set_status("There is no code to run.", Duration::from_secs(2));
            }
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub(crate) fn cmd_cancel_run(&mut self) {
        if self.ide.cancel_program() {
            self.set_status("Cancelling…", Duration::from_secs(2));
        } else {
            self.set_status("Nothing is running", Duration::from_secs(2));
        }
    }

    /// Pick up the result of a background run.
    pub(crate) fn poll_run(&mut self) {
        let Some(result) = self.ide.poll_program() else { return; };
        match result {
            Ok(out) if out.succeeded() => self.set_status("Run finished", Duration::from_secs(2)),
            Ok(_) => self.set_status("Run failed (see console)", Duration::from_secs(3)),
            Err(e) => self.set_status(format!("Run error: {e}"), Duration::from_secs(3)),
        }
    }

    pub(crate) fn poll_autosave(&mut self) {
        for event in self.ide.poll_autosave() {
            match event {
                AutoSaveEvent::Saved(path) => {
                    self.set_status(format!("Auto-saved: {}", path.display()), Duration::from_secs(2));
                }
                AutoSaveEvent::Failed(e) => {
                    self.set_status(format!("Auto-save failed: {e}"), Duration::from_secs(4));
                }
            }
        }
    }

    // ===== Theme, auto-save, format =====

    pub(crate) fn cmd_toggle_theme(&mut self) {
        let theme = self.ide.toggle_theme();
        self.set_status(format!("Theme: {}", theme.name()), Duration::from_secs(2));
    }

    pub(crate) fn cmd_toggle_auto_save(&mut self) {
        let on = self.ide.toggle_auto_save();
        let msg = if on {
            format!("Auto-save on (every {}s)", self.ide.auto_save_interval().as_secs())
        } else {
            "Auto-save off".to_string()
        };
        self.set_status(msg, Duration::from_secs(2));
    }

    pub fn cmd_format(&mut self) -> Result<()> {
        self.ide.auto_format().context("Auto-format failed")?;
        self.ensure_visible()?;
        self.set_status("Formatted", Duration::from_secs(2));
        Ok(())
    }
}
