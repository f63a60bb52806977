//! Editor: terminal-side state around the [`Ide`] core.

mod builtin_commands;
mod file_ops;
mod input;
mod prompt;
mod render;

use crate::commands::CommandRegistry;
use anyhow::Result;
use crossterm::terminal;
use prompt::{Prompt, PromptKind, StatusMsg};
use runpad::config::Config;
use runpad::ide::Ide;
use runpad::types::Pos;
use runpad::utils::digits;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use unicode_width::UnicodeWidthChar;

pub use builtin_commands::register_builtin_commands;

/// Rows reserved for the console panel, header included.
const CONSOLE_ROWS: usize = 8;

/// An action that discards the document and therefore asks to save first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    New,
    Open,
    Close,
    Quit,
}

/// Screen rows of each area, top to bottom.
pub(crate) struct Layout {
    pub width: usize,
    pub editor_h: usize,
    pub console_y: usize,
    pub console_h: usize,
    pub prompt_y: Option<usize>,
    pub status_y: usize,
    pub gutter: usize,
}

/// The top-level application state.
pub struct Editor {
    pub(crate) ide: Ide,
    /// Viewport scroll position (first visible line and char column).
    pub(crate) scroll_y: usize,
    pub(crate) scroll_x: usize,
    /// Optional bottom-line prompt.
    pub(crate) prompt: Option<Prompt>,
    /// Short-lived status message.
    pub(crate) status: Option<StatusMsg>,
    pub(crate) commands: CommandRegistry,
    pub(crate) last_find: Option<String>,
    /// Query typed in the first replace prompt, waiting for its replacement.
    pub(crate) replace_query: Option<String>,
    /// Action waiting on the save-changes confirmation (or on Save As, after a "y").
    pub(crate) pending: Option<PendingAction>,
    pub(crate) quit_requested: bool,
    /// Pre-filled answer for the next Save As prompt (a file named on the command line that
    /// does not exist yet).
    pub(crate) suggested_path: Option<PathBuf>,
    /// Whether the screen needs to be redrawn.
    pub(crate) needs_redraw: bool,
    pub(crate) show_help: bool,
    /// Last title pushed to the terminal.
    pub(crate) shown_title: String,
}

impl Editor {
    /// Create the editor, optionally opening `path` (a missing file becomes the save target).
    pub fn new(config: &Config, path: Option<PathBuf>) -> Result<Self> {
        let mut commands = CommandRegistry::new();
        register_builtin_commands(&mut commands);

        let mut ed = Self {
            ide: Ide::from_config(config),
            scroll_y: 0,
            scroll_x: 0,
            prompt: None,
            status: None,
            commands,
            last_find: None,
            replace_query: None,
            pending: None,
            quit_requested: false,
            suggested_path: None,
            needs_redraw: true,
            show_help: false,
            shown_title: String::new(),
        };

        match path {
            Some(p) if p.exists() => ed.open_path(&p)?,
            Some(p) => {
                ed.ide.new_document();
                ed.set_status(format!("New file: {}", p.display()), Duration::from_secs(3));
                ed.suggested_path = Some(p);
            }
            None => ed.set_status(
                "F5 run • Ctrl+P commands • Ctrl+S save • Ctrl+Q quit",
                Duration::from_secs(4),
            ),
        }
        Ok(ed)
    }

    pub fn should_quit(&self) -> bool {
        self.quit_requested
    }

    /// Mark that the screen needs to be redrawn.
    pub fn mark_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Periodic work between key presses: collect run and auto-save results, expire the
    /// status message.
    pub fn tick(&mut self) {
        self.poll_run();
        self.poll_autosave();
        if let Some(st) = &self.status {
            if Instant::now() >= st.until {
                self.status = None;
                self.mark_redraw();
            }
        }
    }

    /// Called when the terminal is resized.
    pub fn on_resize(&mut self) -> Result<()> {
        self.mark_redraw();
        self.ensure_visible()
    }

    /// Show a message in the status bar.
    pub fn set_status(&mut self, msg: impl Into<String>, ttl: Duration) {
        self.status = Some(StatusMsg { text: msg.into(), until: Instant::now() + ttl });
        self.mark_redraw();
    }

    pub(crate) fn open_prompt(&mut self, kind: PromptKind, initial: impl Into<String>) {
        self.prompt = Some(Prompt::new(kind, initial));
        self.mark_redraw();
    }

    pub(crate) fn layout(&self) -> Result<Layout> {
        let (w, h) = terminal::size()?;
        let width = w as usize;
        let height = h as usize;
        let status_y = height.saturating_sub(1);
        let prompt_y = self.prompt.as_ref().map(|_| status_y.saturating_sub(1));
        let bottom = prompt_y.unwrap_or(status_y);
        let console_h = CONSOLE_ROWS.min(bottom / 2);
        let console_y = bottom - console_h;
        let lines = self.ide.document().buffer().line_count();
        Ok(Layout {
            width,
            editor_h: console_y,
            console_y,
            console_h,
            prompt_y,
            status_y,
            gutter: digits(lines).max(2) + 2,
        })
    }

    /// Update scroll so the cursor is visible.
    pub fn ensure_visible(&mut self) -> Result<()> {
        let layout = self.layout()?;
        let (cursor, line) = {
            let doc = self.ide.document();
            let cursor = doc.cursor_pos();
            (cursor, doc.buffer().line(cursor.y).into_owned())
        };
        let (old_y, old_x) = (self.scroll_y, self.scroll_x);

        if cursor.y < self.scroll_y {
            self.scroll_y = cursor.y;
        } else if cursor.y >= self.scroll_y + layout.editor_h {
            self.scroll_y = cursor.y.saturating_sub(layout.editor_h.saturating_sub(1));
        }

        let avail = layout.width.saturating_sub(layout.gutter).saturating_sub(1).max(1);
        if cursor.x < self.scroll_x {
            self.scroll_x = cursor.x;
        } else {
            // Scroll right until the cursor column fits.
            while display_width(&line, self.scroll_x, cursor.x) >= avail {
                self.scroll_x += 1;
            }
        }

        if old_y != self.scroll_y || old_x != self.scroll_x {
            self.mark_redraw();
        }
        Ok(())
    }

    /// Move the cursor to a line/column, dropping or extending the selection.
    pub(crate) fn move_to(&mut self, p: Pos, selecting: bool) -> Result<()> {
        {
            let mut doc = self.ide.document();
            let offset = doc.buffer().pos_to_offset(p);
            doc.set_cursor(offset, selecting);
        }
        self.mark_redraw();
        self.ensure_visible()
    }

    /// Run a command by name (case-insensitive), suggesting a near match for typos.
    pub fn run_command_by_name(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        let action = self.commands.get(name).map(|c| c.action);
        if let Some(action) = action {
            action(self)?;
            self.mark_redraw();
        } else {
            let mut msg = format!("Unknown command: '{name}'");
            if let Some(suggestion) = self.commands.suggest_command(name) {
                msg.push_str(&format!(". Did you mean '{}'?", suggestion.name));
            }
            self.set_status(msg, Duration::from_secs(3));
        }
        Ok(())
    }
}

/// Terminal columns taken by chars `from..to` of `line`.
pub(crate) fn display_width(line: &str, from: usize, to: usize) -> usize {
    line.chars()
        .skip(from)
        .take(to.saturating_sub(from))
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(1))
        .sum()
}
