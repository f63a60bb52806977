//! Command registry: named actions reachable from key chords and the command palette.

use crate::editor::Editor;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use runpad::utils::levenshtein_distance;
use std::collections::{BTreeMap, HashMap};

/// A user-invokable action, bound to an optional key chord such as `"Ctrl+S"`.
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub key: Option<String>,
    pub action: fn(&mut Editor) -> Result<()>,
}

/// Commands by lowercase name (kept sorted for the palette) plus the chord bindings.
#[derive(Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
    bindings: HashMap<String, String>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a command, replacing any command of the same (case-insensitive) name.
    pub fn register(&mut self, cmd: Command) {
        let id = cmd.name.to_lowercase();
        if let Some(old) = self.commands.get(&id).and_then(|c| c.key.clone()) {
            self.bindings.remove(&old);
        }
        if let Some(chord) = &cmd.key {
            self.bindings.insert(chord.clone(), id.clone());
        }
        self.commands.insert(id, cmd);
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(&name.to_lowercase())
    }

    /// Name of the command bound to `chord`.
    pub fn resolve_key(&self, chord: &str) -> Option<String> {
        self.bindings.get(chord).cloned()
    }

    /// Commands whose name or description contains `query`, in name order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&Command> {
        let needle = query.to_lowercase();
        self.commands
            .iter()
            .filter(|(id, c)| id.contains(&needle) || c.description.to_lowercase().contains(&needle))
            .map(|(_, c)| c)
            .take(limit)
            .collect()
    }

    /// Closest command name, if it is near enough to be a plausible typo.
    pub fn suggest_command(&self, name: &str) -> Option<&Command> {
        let name = name.to_lowercase();
        let (dist, id, cmd) = self
            .commands
            .iter()
            .map(|(id, c)| (levenshtein_distance(&name, id), id, c))
            .min_by_key(|(d, _, _)| *d)?;

        // Allow roughly 40% of the longer word, and never less than 2 edits.
        let longest = name.chars().count().max(id.chars().count());
        let threshold = (longest * 2).div_ceil(5).max(2);
        (dist <= threshold).then_some(cmd)
    }
}

/// The chord string for a key event: modifiers in the order Ctrl, Alt, Shift, then the key,
/// joined with `+` (`"Ctrl+Shift+S"`, `"F5"`, `"Alt+F"`).
pub fn canonical_key_string(key: &KeyEvent) -> String {
    let key_name = match key.code {
        KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
        KeyCode::F(n) => format!("F{n}"),
        other => format!("{other:?}"),
    };

    [
        (KeyModifiers::CONTROL, "Ctrl"),
        (KeyModifiers::ALT, "Alt"),
        (KeyModifiers::SHIFT, "Shift"),
    ]
    .into_iter()
    .filter(|(m, _)| key.modifiers.contains(*m))
    .map(|(_, label)| label.to_string())
    .chain(std::iter::once(key_name))
    .collect::<Vec<_>>()
    .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut Editor) -> Result<()> {
        Ok(())
    }

    fn cmd(name: &str, key: Option<&str>) -> Command {
        Command {
            name: name.to_string(),
            description: format!("{name} description"),
            key: key.map(str::to_string),
            action: noop,
        }
    }

    #[test]
    fn key_strings_are_canonical() {
        let k = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(canonical_key_string(&k), "Ctrl+S");
        let k = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::CONTROL | KeyModifiers::SHIFT);
        assert_eq!(canonical_key_string(&k), "Ctrl+Shift+S");
        let k = KeyEvent::new(KeyCode::F(5), KeyModifiers::NONE);
        assert_eq!(canonical_key_string(&k), "F5");
        let k = KeyEvent::new(KeyCode::Char('f'), KeyModifiers::ALT);
        assert_eq!(canonical_key_string(&k), "Alt+F");
        let k = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(canonical_key_string(&k), "Esc");
    }

    #[test]
    fn lookup_by_name_and_key() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("run", Some("F5")));
        reg.register(cmd("save", Some("Ctrl+S")));
        assert!(reg.get("RUN").is_some());
        assert_eq!(reg.resolve_key("Ctrl+S").as_deref(), Some("save"));
        assert!(reg.resolve_key("Ctrl+K").is_none());
    }

    #[test]
    fn re_registering_replaces_the_binding() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("run", Some("F6")));
        reg.register(cmd("run", Some("F5")));
        assert_eq!(reg.search("run", 10).len(), 1);
        assert_eq!(reg.resolve_key("F5").as_deref(), Some("run"));
        assert!(reg.resolve_key("F6").is_none());
    }

    #[test]
    fn search_is_sorted_and_limited() {
        let mut reg = CommandRegistry::new();
        for name in ["save_as", "save", "open"] {
            reg.register(cmd(name, None));
        }
        let names: Vec<&str> = reg.search("SAVE", 10).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["save", "save_as"]);
        assert_eq!(reg.search("", 2).len(), 2);
    }

    #[test]
    fn typos_get_suggestions() {
        let mut reg = CommandRegistry::new();
        reg.register(cmd("clear_console", None));
        reg.register(cmd("format", None));
        assert_eq!(reg.suggest_command("fromat").map(|c| c.name.as_str()), Some("format"));
        assert!(reg.suggest_command("zzzzzzzzzzzz").is_none());
    }
}
