//! Rendering: drawing the editor, console, prompt and status bar to the terminal.

use super::{display_width, Editor, Layout};
use anyhow::Result;
use crossterm::{
    cursor,
    style::{self, Attribute, Color},
    terminal::{self, ClearType},
    QueueableCommand,
};
use runpad::highlight::style_at;
use runpad::types::{HighlightColor, HighlightSpan, Theme};
use std::io::{Stdout, Write};
use unicode_width::UnicodeWidthChar;

/// Colors for one theme.
struct Palette {
    fg: Color,
    bg: Color,
    gutter: Color,
    bar_fg: Color,
    bar_bg: Color,
    panel_bg: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                fg: Color::Black,
                bg: Color::White,
                gutter: Color::DarkGrey,
                bar_fg: Color::White,
                bar_bg: Color::DarkBlue,
                panel_bg: Color::Grey,
            },
            Theme::Dark => Self {
                fg: Color::White,
                bg: Color::Black,
                gutter: Color::DarkGrey,
                bar_fg: Color::Black,
                bar_bg: Color::Grey,
                panel_bg: Color::AnsiValue(235),
            },
        }
    }
}

/// Convert a HighlightColor to crossterm Color.
fn highlight_to_crossterm(color: HighlightColor) -> Color {
    match color {
        HighlightColor::Blue => Color::Blue,
        HighlightColor::Green => Color::DarkGreen,
        HighlightColor::Grey => Color::Grey,
        HighlightColor::Yellow => Color::Yellow,
    }
}

/// Truncate `text` to `width` columns and pad it with spaces to exactly that width.
fn fit(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(1);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

impl Editor {
    /// Render the entire UI.
    pub fn render(&mut self, stdout: &mut Stdout) -> Result<()> {
        self.sync_title(stdout)?;
        if !self.needs_redraw {
            return Ok(());
        }
        self.needs_redraw = false;

        if self.show_help {
            return self.render_help(stdout);
        }

        let layout = self.layout()?;
        let palette = Palette::for_theme(self.ide.theme());

        stdout.queue(cursor::Hide)?;
        stdout.queue(style::ResetColor)?;
        self.render_lines(stdout, &layout, &palette)?;
        self.render_console(stdout, &layout, &palette)?;
        self.render_prompt(stdout, &layout, &palette)?;
        self.render_status_bar(stdout, &layout, &palette)?;

        let (x, y) = self.cursor_screen_pos(&layout);
        stdout.queue(cursor::MoveTo(x as u16, y as u16))?;
        stdout.queue(cursor::Show)?;
        stdout.flush()?;
        Ok(())
    }

    /// Push the window title when it changes (file name or dirty marker).
    fn sync_title(&mut self, stdout: &mut Stdout) -> Result<()> {
        let title = self.ide.title();
        if title != self.shown_title {
            stdout.queue(terminal::SetTitle(&title))?;
            self.shown_title = title;
            self.mark_redraw();
        }
        Ok(())
    }

    fn render_lines(&self, stdout: &mut Stdout, layout: &Layout, palette: &Palette) -> Result<()> {
        let mut doc = self.ide.document();
        let spans = doc.render_spans();
        let selection = doc.selection();
        let buf = doc.buffer();
        let lnw = layout.gutter - 2;
        let avail = layout.width.saturating_sub(layout.gutter);

        for row in 0..layout.editor_h {
            let y = self.scroll_y + row;
            stdout.queue(cursor::MoveTo(0, row as u16))?;
            stdout.queue(style::SetBackgroundColor(palette.bg))?;

            if y >= buf.line_count() {
                stdout.queue(style::SetForegroundColor(palette.gutter))?;
                stdout.queue(style::Print(fit("~", layout.width)))?;
                continue;
            }

            stdout.queue(style::SetForegroundColor(palette.gutter))?;
            stdout.queue(style::Print(format!("{:>lnw$}│ ", y + 1)))?;

            let start = buf.line_start(y);
            let line = buf.line(y);
            let end = start + line.chars().count();
            let line_spans: Vec<HighlightSpan> =
                spans.iter().filter(|s| s.start < end && s.end > start).copied().collect();

            let mut used = 0;
            for (i, ch) in line.chars().enumerate().skip(self.scroll_x) {
                let w = UnicodeWidthChar::width(ch).unwrap_or(1);
                if used + w > avail {
                    break;
                }
                let offset = start + i;
                let selected = selection.is_some_and(|(a, b)| offset >= a && offset < b);
                if selected {
                    stdout.queue(style::SetAttribute(Attribute::Reverse))?;
                    stdout.queue(style::SetForegroundColor(palette.fg))?;
                    stdout.queue(style::SetBackgroundColor(palette.bg))?;
                } else {
                    let (fg, bg) = style_at(&line_spans, offset);
                    let fg = match (fg, bg) {
                        (_, Some(_)) => Color::Black,
                        (Some(c), None) => highlight_to_crossterm(c),
                        (None, None) => palette.fg,
                    };
                    stdout.queue(style::SetForegroundColor(fg))?;
                    stdout.queue(style::SetBackgroundColor(bg.map_or(palette.bg, highlight_to_crossterm)))?;
                }
                stdout.queue(style::Print(ch))?;
                if selected {
                    stdout.queue(style::SetAttribute(Attribute::NoReverse))?;
                }
                used += w;
            }

            stdout.queue(style::SetBackgroundColor(palette.bg))?;
            stdout.queue(style::Print(" ".repeat(avail - used)))?;
        }
        stdout.queue(style::ResetColor)?;
        Ok(())
    }

    /// The output panel: a header row, then the tail of the console text.
    fn render_console(&self, stdout: &mut Stdout, layout: &Layout, palette: &Palette) -> Result<()> {
        if layout.console_h == 0 {
            return Ok(());
        }

        let state = if self.ide.is_running() { " running… (Esc cancels)" } else { "" };
        let header = format!("── Console [{}]{state} ", self.ide.runner_name());
        let rule = "─".repeat(layout.width.saturating_sub(display_width(&header, 0, usize::MAX)));
        stdout.queue(cursor::MoveTo(0, layout.console_y as u16))?;
        stdout.queue(style::SetBackgroundColor(palette.panel_bg))?;
        stdout.queue(style::SetForegroundColor(palette.gutter))?;
        stdout.queue(style::Print(fit(&format!("{header}{rule}"), layout.width)))?;

        let rows = layout.console_h - 1;
        let lines: Vec<&str> = self.ide.console().lines().collect();
        let tail = &lines[lines.len().saturating_sub(rows)..];
        for row in 0..rows {
            let text = tail.get(row).copied().unwrap_or("");
            let fg = if text.starts_with("Error:") { Color::Red } else { palette.fg };
            stdout.queue(cursor::MoveTo(0, (layout.console_y + 1 + row) as u16))?;
            stdout.queue(style::SetForegroundColor(fg))?;
            stdout.queue(style::Print(fit(text, layout.width)))?;
        }
        stdout.queue(style::ResetColor)?;
        Ok(())
    }

    fn render_prompt(&self, stdout: &mut Stdout, layout: &Layout, palette: &Palette) -> Result<()> {
        let (Some(p), Some(prompt_y)) = (&self.prompt, layout.prompt_y) else { return Ok(()); };

        // Command palette: matching commands listed above the prompt line
        if p.kind == super::PromptKind::Command {
            let hits = self.commands.search(p.input.trim(), 10);
            let start_y = prompt_y.saturating_sub(hits.len());
            for (i, cmd) in hits.iter().enumerate() {
                let key = cmd.key.as_deref().map(|k| format!(" ({k})")).unwrap_or_default();
                let item = format!("  {:15} │ {}{key}", cmd.name, cmd.description);
                stdout.queue(cursor::MoveTo(0, (start_y + i) as u16))?;
                stdout.queue(style::SetBackgroundColor(palette.panel_bg))?;
                stdout.queue(style::SetForegroundColor(palette.fg))?;
                stdout.queue(style::Print(fit(&item, layout.width)))?;
            }
        }

        stdout.queue(cursor::MoveTo(0, prompt_y as u16))?;
        stdout.queue(terminal::Clear(ClearType::CurrentLine))?;
        stdout.queue(style::SetForegroundColor(Color::Yellow))?;
        stdout.queue(style::Print(p.kind.label()))?;
        stdout.queue(style::ResetColor)?;
        let room = layout.width.saturating_sub(p.kind.label().len());
        stdout.queue(style::Print(fit(&p.input, room)))?;
        Ok(())
    }

    fn render_status_bar(&self, stdout: &mut Stdout, layout: &Layout, palette: &Palette) -> Result<()> {
        let (pos, stats) = {
            let doc = self.ide.document();
            (doc.cursor_pos(), doc.stats())
        };
        let autosave = if self.ide.auto_save_enabled() { "AUTO-SAVE" } else { "" };
        let msg = self.status.as_ref().map(|s| s.text.as_str()).unwrap_or_default();

        let mut bar = format!(
            " {}  Ln {}, Col {}  Lines: {} | Words: {}  {autosave}",
            self.ide.title(),
            pos.y + 1,
            pos.x + 1,
            stats.line_count,
            stats.word_count,
        );
        if !msg.is_empty() {
            bar.push_str(" | ");
            bar.push_str(msg);
        }

        stdout.queue(cursor::MoveTo(0, layout.status_y as u16))?;
        stdout.queue(style::SetForegroundColor(palette.bar_fg))?;
        stdout.queue(style::SetBackgroundColor(palette.bar_bg))?;
        stdout.queue(style::Print(fit(&bar, layout.width)))?;
        stdout.queue(style::ResetColor)?;
        Ok(())
    }

    /// Where the terminal cursor goes: the prompt if one is open, else the text cursor.
    fn cursor_screen_pos(&self, layout: &Layout) -> (usize, usize) {
        if let (Some(p), Some(prompt_y)) = (&self.prompt, layout.prompt_y) {
            let x = p.kind.label().len() + display_width(&p.input, 0, p.cursor);
            return (x.min(layout.width.saturating_sub(1)), prompt_y);
        }

        let doc = self.ide.document();
        let cursor = doc.cursor_pos();
        let line = doc.buffer().line(cursor.y);
        let x = layout.gutter + display_width(&line, self.scroll_x, cursor.x);
        let y = cursor.y.saturating_sub(self.scroll_y);
        (x.min(layout.width.saturating_sub(1)), y.min(layout.editor_h.saturating_sub(1)))
    }

    /// Render the help screen: movement keys plus every bound command.
    fn render_help(&self, stdout: &mut Stdout) -> Result<()> {
        let (w, h) = terminal::size()?;
        let width = w as usize;
        let height = h as usize;

        stdout.queue(cursor::Hide)?;
        stdout.queue(style::SetBackgroundColor(Color::DarkBlue))?;
        stdout.queue(style::SetForegroundColor(Color::White))?;
        stdout.queue(terminal::Clear(ClearType::All))?;

        let mut lines = vec![
            " RUNPAD HELP: Keybindings ".to_string(),
            "==========================".to_string(),
            String::new(),
            "  Arrows           Move cursor".to_string(),
            "  Shift + Arrows   Select while moving".to_string(),
            "  Home / End       Start / end of line (Ctrl: of document)".to_string(),
            "  Esc              Cancel a run, or clear selection and matches".to_string(),
            String::new(),
        ];
        for cmd in self.commands.search("", usize::MAX) {
            if let Some(key) = &cmd.key {
                lines.push(format!("  {key:16} {}", cmd.name));
            }
        }
        lines.push(String::new());
        lines.push(" Press any key to close help...".to_string());

        let start_y = height.saturating_sub(lines.len()) / 2;
        for (i, line) in lines.iter().enumerate() {
            let x = width.saturating_sub(line.chars().count()) / 2;
            stdout.queue(cursor::MoveTo(x as u16, (start_y + i) as u16))?;
            stdout.queue(style::Print(line))?;
        }

        stdout.queue(style::ResetColor)?;
        stdout.flush()?;
        Ok(())
    }
}
