//! Bottom-line prompt state and file-path completion.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// What the bottom-line prompt is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Open,
    SaveAs,
    Find,
    /// First half of replace: the text to look for.
    ReplaceFind,
    /// Second half of replace: the replacement for the query typed before.
    ReplaceWith,
    Command,
    GotoLine,
    /// "Save changes? (y/n)" before a destructive action.
    Confirm,
}

impl PromptKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Open: ",
            Self::SaveAs => "Save as: ",
            Self::Find => "Find: ",
            Self::ReplaceFind => "Replace: ",
            Self::ReplaceWith => "Replace with: ",
            Self::Command => "Command: ",
            Self::GotoLine => "Goto line: ",
            Self::Confirm => "Save changes? (y/n, Esc cancels) ",
        }
    }

    /// Prompts that take a file path and support Tab completion.
    pub fn takes_path(self) -> bool {
        matches!(self, Self::Open | Self::SaveAs)
    }
}

/// Prompt state (what the user is typing at the bottom).
#[derive(Debug, Clone)]
pub struct Prompt {
    pub kind: PromptKind,
    pub input: String,
    pub cursor: usize, // char index in input
    pub completions: Vec<String>,
    pub completion_index: Option<usize>,
    /// Input the current completion list was computed for.
    pub completion_base: String,
}

impl Prompt {
    /// Create a new prompt pre-filled with `initial`.
    pub fn new(kind: PromptKind, initial: impl Into<String>) -> Self {
        let input = initial.into();
        let cursor = input.chars().count();
        Self {
            kind,
            input,
            cursor,
            completions: Vec::new(),
            completion_index: None,
            completion_base: String::new(),
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        let at = byte_index(&self.input, self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = byte_index(&self.input, self.cursor - 1);
        self.input.remove(at);
        self.cursor -= 1;
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let at = byte_index(&self.input, self.cursor);
            self.input.remove(at);
        }
    }

    pub fn set_input(&mut self, input: String) {
        self.cursor = input.chars().count();
        self.input = input;
    }

    /// Tab / Shift+Tab on a path prompt: complete to the common prefix first, then cycle
    /// through candidates. Returns the candidates to show, if there are several.
    pub fn complete_path(&mut self, backwards: bool) -> Option<Vec<String>> {
        if self.completion_base != self.input {
            self.completions = path_completions(&self.input);
            self.completion_base = self.input.clone();
            self.completion_index = None;
        }

        match self.completions.len() {
            0 => return None,
            1 => {
                let only = self.completions[0].clone();
                self.set_input(only);
                self.completion_base = self.input.clone();
                self.completions = path_completions(&self.input);
                return None;
            }
            _ => {}
        }

        let n = self.completions.len();
        match self.completion_index {
            None => {
                let prefix = longest_common_prefix(&self.completions);
                if prefix.len() > self.input.len() {
                    self.set_input(prefix);
                    self.completion_base = self.input.clone();
                    self.completions = path_completions(&self.input);
                } else {
                    self.completion_index = Some(0);
                    self.set_input(self.completions[0].clone());
                    self.completion_base = self.input.clone();
                }
            }
            Some(i) => {
                let next = if backwards { (i + n - 1) % n } else { (i + 1) % n };
                self.completion_index = Some(next);
                self.set_input(self.completions[next].clone());
                self.completion_base = self.input.clone();
            }
        }
        Some(self.completions.clone())
    }
}

/// Short-lived status message shown in the status bar.
#[derive(Clone)]
pub struct StatusMsg {
    pub text: String,
    pub until: Instant,
}

fn byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Paths starting with `partial`, directories first (with a trailing `/`).
fn path_completions(partial: &str) -> Vec<String> {
    let path = Path::new(partial);
    let (dir, prefix) = if partial.is_empty() {
        (Path::new("."), "")
    } else if partial.ends_with('/') || partial.ends_with('\\') || path.is_dir() {
        (path, "")
    } else {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        (parent, name)
    };

    let Ok(entries) = fs::read_dir(dir) else { return Vec::new(); };
    let mut out: Vec<String> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with(prefix) {
                return None;
            }
            let full = if dir == Path::new(".") && !partial.starts_with("./") {
                name
            } else {
                dir.join(&name).to_string_lossy().into_owned()
            };
            Some(if entry.path().is_dir() { format!("{full}/") } else { full })
        })
        .collect();

    out.sort_by(|a, b| match (a.ends_with('/'), b.ends_with('/')) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    });
    out
}

fn longest_common_prefix(strings: &[String]) -> String {
    let Some((first, rest)) = strings.split_first() else { return String::new(); };
    let mut len = first.chars().count();
    for s in rest {
        len = len.min(first.chars().zip(s.chars()).take_while(|(a, b)| a == b).count());
    }
    first.chars().take(len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editing_respects_char_cursor() {
        let mut p = Prompt::new(PromptKind::Find, "héllo");
        assert_eq!(p.cursor, 5);
        p.cursor = 2;
        p.insert_char('X');
        assert_eq!(p.input, "héXllo");
        p.backspace();
        p.backspace();
        assert_eq!(p.input, "hllo");
        p.delete();
        assert_eq!(p.input, "hlo");
    }

    #[test]
    fn common_prefix() {
        let v = vec!["script_a.py".to_string(), "script_b.py".to_string()];
        assert_eq!(longest_common_prefix(&v), "script_");
        assert_eq!(longest_common_prefix(&[]), "");
    }

    #[test]
    fn completes_files_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("alpha.py"), "").unwrap();
        fs::write(dir.path().join("alpine.py"), "").unwrap();
        fs::create_dir(dir.path().join("algo")).unwrap();

        let base = format!("{}/al", dir.path().display());
        let hits = path_completions(&base);
        assert_eq!(hits.len(), 3);
        assert!(hits[0].ends_with("algo/"));

        let mut p = Prompt::new(PromptKind::Open, format!("{}/alp", dir.path().display()));
        assert_eq!(p.complete_path(false).map(|c| c.len()), Some(2));
        assert!(p.input.ends_with("alpha.py"));
        p.complete_path(false);
        assert!(p.input.ends_with("alpine.py"));
        p.complete_path(true);
        assert!(p.input.ends_with("alpha.py"));
    }
}
