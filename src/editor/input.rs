//! Input handling: editor keys and prompt keys.

use super::prompt::PromptKind;
use super::Editor;
use crate::commands::canonical_key_string;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use runpad::types::Pos;
use runpad::utils::clamp_usize;
use std::path::PathBuf;
use std::time::Duration;

const TAB: &str = "    ";

impl Editor {
    /// Top-level key handler.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        // Any key closes the help screen
        if self.show_help {
            self.show_help = false;
            self.mark_redraw();
            return Ok(());
        }

        // Prompt mode consumes keys first
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        let shift = key.modifiers.contains(KeyModifiers::SHIFT);
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        // Movement keys (selection-aware)
        match key.code {
            KeyCode::Up
            | KeyCode::Down
            | KeyCode::Left
            | KeyCode::Right
            | KeyCode::Home
            | KeyCode::End
            | KeyCode::PageUp
            | KeyCode::PageDown => return self.move_cursor(key.code, ctrl, shift),
            _ => {}
        }

        if let Some(cmd_name) = self.commands.resolve_key(&canonical_key_string(&key)) {
            return self.run_command_by_name(&cmd_name);
        }

        match key.code {
            KeyCode::Esc => {
                if self.ide.is_running() {
                    self.cmd_cancel_run();
                } else {
                    let mut doc = self.ide.document();
                    doc.clear_selection();
                    doc.clear_matches();
                }
                self.mark_redraw();
                return Ok(());
            }
            KeyCode::Enter => self.ide.document().replace_selection("\n"),
            KeyCode::Tab => self.ide.document().replace_selection(TAB),
            KeyCode::Backspace => self.ide.document().delete_backward(),
            KeyCode::Delete => self.ide.document().delete_forward(),
            // Unbound control chords are ignored rather than typed
            KeyCode::Char(ch) if !ctrl && !alt => {
                let mut s = [0u8; 4];
                self.ide.document().replace_selection(ch.encode_utf8(&mut s));
            }
            _ => return Ok(()),
        }
        self.mark_redraw();
        self.ensure_visible()
    }

    fn move_cursor(&mut self, code: KeyCode, ctrl: bool, selecting: bool) -> Result<()> {
        let page = self.layout()?.editor_h.max(1);
        let target = {
            let doc = self.ide.document();
            let buf = doc.buffer();
            let last = buf.line_count().saturating_sub(1);
            let mut p = doc.cursor_pos();
            match code {
                KeyCode::Left if p.x > 0 => p.x -= 1,
                KeyCode::Left if p.y > 0 => {
                    p.y -= 1;
                    p.x = buf.line_len_chars(p.y);
                }
                KeyCode::Right if p.x < buf.line_len_chars(p.y) => p.x += 1,
                KeyCode::Right if p.y < last => p = Pos { y: p.y + 1, x: 0 },
                KeyCode::Up => p.y = p.y.saturating_sub(1),
                KeyCode::Down => p.y = (p.y + 1).min(last),
                KeyCode::Home if ctrl => p = Pos::default(),
                KeyCode::Home => p.x = 0,
                KeyCode::End if ctrl => p = Pos { y: last, x: buf.line_len_chars(last) },
                KeyCode::End => p.x = buf.line_len_chars(p.y),
                KeyCode::PageUp => p.y = p.y.saturating_sub(page),
                KeyCode::PageDown => p.y = (p.y + page).min(last),
                _ => {}
            }
            buf.clamp_pos(p)
        };
        self.move_to(target, selecting)
    }

    /// Handle keys while a prompt is active.
    pub fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(prompt) = &mut self.prompt else { return Ok(()); };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if prompt.kind == PromptKind::Confirm {
            let answer = match key.code {
                KeyCode::Char('y' | 'Y') => Some(true),
                KeyCode::Char('n' | 'N') => Some(false),
                KeyCode::Esc => None,
                _ => return Ok(()),
            };
            self.prompt = None;
            self.mark_redraw();
            return match answer {
                Some(yes) => self.answer_confirm(yes),
                None => {
                    self.pending = None;
                    Ok(())
                }
            };
        }

        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.pending = None;
                self.replace_query = None;
            }
            KeyCode::Tab | KeyCode::BackTab if prompt.kind.takes_path() => {
                match prompt.complete_path(key.code == KeyCode::BackTab) {
                    Some(options) => {
                        let shown: Vec<&str> = options
                            .iter()
                            .map(|s| s.trim_end_matches('/').rsplit('/').next().unwrap_or(s))
                            .take(8)
                            .collect();
                        let mut msg = shown.join(" | ");
                        if options.len() > 8 {
                            msg.push_str(&format!(" (+{} more)", options.len() - 8));
                        }
                        self.set_status(msg, Duration::from_secs(3));
                    }
                    None if prompt.completions.is_empty() => {
                        self.set_status("No completions", Duration::from_secs(1));
                    }
                    None => {}
                }
            }
            KeyCode::Enter => {
                let kind = prompt.kind;
                let input = prompt.input.clone();
                self.prompt = None;
                self.mark_redraw();
                return self.submit_prompt(kind, input);
            }
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Left => prompt.cursor = prompt.cursor.saturating_sub(1),
            KeyCode::Right => prompt.cursor = (prompt.cursor + 1).min(prompt.input.chars().count()),
            KeyCode::Home => prompt.cursor = 0,
            KeyCode::End => prompt.cursor = prompt.input.chars().count(),
            // Ctrl+U clears the prompt line
            KeyCode::Char('u') if ctrl => prompt.set_input(String::new()),
            KeyCode::Char(ch) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                prompt.insert_char(ch);
            }
            _ => return Ok(()),
        }
        self.mark_redraw();
        Ok(())
    }

    fn submit_prompt(&mut self, kind: PromptKind, input: String) -> Result<()> {
        match kind {
            PromptKind::Open | PromptKind::SaveAs => {
                let path = PathBuf::from(input.trim());
                if path.as_os_str().is_empty() {
                    self.pending = None;
                    return Ok(());
                }
                if kind == PromptKind::Open {
                    self.open_path(&path)
                } else {
                    self.save_to_path(path)
                }
            }
            PromptKind::Find => self.find_all(&input),
            PromptKind::ReplaceFind => {
                if input.is_empty() {
                    self.set_status("Nothing to replace", Duration::from_secs(2));
                    return Ok(());
                }
                self.last_find = Some(input.clone());
                self.replace_query = Some(input);
                self.open_prompt(PromptKind::ReplaceWith, "");
                Ok(())
            }
            PromptKind::ReplaceWith => match self.replace_query.take() {
                Some(query) => self.replace_all(&query, &input),
                None => Ok(()),
            },
            PromptKind::GotoLine => {
                let n: isize = input.trim().parse().unwrap_or(1);
                let last = self.ide.document().buffer().line_count().saturating_sub(1);
                self.move_to(Pos { y: clamp_usize(n.saturating_sub(1), 0, last), x: 0 }, false)
            }
            PromptKind::Command => {
                let cmdline = input.trim().trim_start_matches(':');
                if cmdline.is_empty() {
                    return Ok(());
                }
                // Vim-like shorthands
                let name = match cmdline {
                    "w" => "save",
                    "q" => "quit",
                    other => other,
                };
                self.run_command_by_name(name)
            }
            PromptKind::Confirm => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::PendingAction;
    use runpad::config::Config;

    fn press(ed: &mut Editor, code: KeyCode) {
        ed.handle_prompt_key(KeyEvent::new(code, KeyModifiers::NONE)).unwrap();
    }

    fn type_text(ed: &mut Editor, text: &str) {
        for ch in text.chars() {
            press(ed, KeyCode::Char(ch));
        }
    }

    #[test]
    fn replace_prompts_chain_into_one_replace_all() {
        let mut ed = Editor::new(&Config::default(), None).unwrap();
        ed.ide.document().replace_all("a = 1\nb = a\n");
        ed.open_prompt(PromptKind::ReplaceFind, "");
        type_text(&mut ed, "a");
        press(&mut ed, KeyCode::Enter);
        assert_eq!(ed.prompt.as_ref().map(|p| p.kind), Some(PromptKind::ReplaceWith));
        type_text(&mut ed, "x");
        // replace_all scrolls through the terminal size, which may be unavailable in tests
        let _ = ed.handle_prompt_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(ed.ide.document().text(), "x = 1\nb = x\n");
        assert!(ed.replace_query.is_none());
    }

    #[test]
    fn declining_the_save_prompt_still_runs_the_action() {
        let mut ed = Editor::new(&Config::default(), None).unwrap();
        ed.ide.document().replace_all("print(1)");
        ed.request(PendingAction::Quit).unwrap();
        assert_eq!(ed.prompt.as_ref().map(|p| p.kind), Some(PromptKind::Confirm));
        assert!(!ed.should_quit());
        press(&mut ed, KeyCode::Char('n'));
        assert!(ed.should_quit());
    }

    #[test]
    fn escape_abandons_the_pending_action() {
        let mut ed = Editor::new(&Config::default(), None).unwrap();
        ed.ide.document().replace_all("print(1)");
        ed.request(PendingAction::Quit).unwrap();
        press(&mut ed, KeyCode::Esc);
        assert!(ed.prompt.is_none());
        assert!(ed.pending.is_none());
        assert!(!ed.should_quit());
    }

    #[test]
    fn saying_yes_without_a_path_asks_for_one() {
        let mut ed = Editor::new(&Config::default(), None).unwrap();
        ed.ide.document().replace_all("print(1)");
        ed.request(PendingAction::Quit).unwrap();
        press(&mut ed, KeyCode::Char('y'));
        assert_eq!(ed.prompt.as_ref().map(|p| p.kind), Some(PromptKind::SaveAs));
        assert!(ed.pending.is_some());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.py");
        ed.prompt.as_mut().unwrap().set_input(path.display().to_string());
        press(&mut ed, KeyCode::Enter);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "print(1)");
        assert!(ed.should_quit());
    }
}
