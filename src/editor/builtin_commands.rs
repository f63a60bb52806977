//! Built-in command registration.

use super::prompt::PromptKind;
use super::PendingAction;
use crate::commands::{Command, CommandRegistry};

fn command(
    name: &str,
    description: &str,
    key: Option<&str>,
    action: fn(&mut super::Editor) -> anyhow::Result<()>,
) -> Command {
    Command {
        name: name.to_string(),
        description: description.to_string(),
        key: key.map(str::to_string),
        action,
    }
}

/// Register all built-in editor commands.
pub fn register_builtin_commands(reg: &mut CommandRegistry) {
    // ===== Documents =====
    reg.register(command("new", "New document (Ctrl+N)", Some("Ctrl+N"), |ed| {
        ed.request(PendingAction::New)
    }));
    reg.register(command("open", "Open file (Ctrl+O)", Some("Ctrl+O"), |ed| {
        ed.request(PendingAction::Open)
    }));
    reg.register(command("save", "Save file (Ctrl+S)", Some("Ctrl+S"), |ed| ed.cmd_save()));
    reg.register(command("save_as", "Save file as (Ctrl+Shift+S)", Some("Ctrl+Shift+S"), |ed| {
        ed.cmd_save_as();
        Ok(())
    }));
    reg.register(command("close", "Close document (Ctrl+W)", Some("Ctrl+W"), |ed| {
        ed.request(PendingAction::Close)
    }));
    reg.register(command("quit", "Quit (Ctrl+Q)", Some("Ctrl+Q"), |ed| {
        ed.request(PendingAction::Quit)
    }));

    // ===== Running =====
    reg.register(command("run", "Run the program (F5)", Some("F5"), |ed| ed.cmd_run()));
    reg.register(command("cancel_run", "Cancel the running program (Esc)", None, |ed| {
        ed.cmd_cancel_run();
        Ok(())
    }));
    reg.register(command("clear_console", "Clear the console (Ctrl+L)", Some("Ctrl+L"), |ed| {
        ed.ide.clear_console();
        ed.mark_redraw();
        Ok(())
    }));

    // ===== Editing =====
    reg.register(command("undo", "Undo (Ctrl+Z)", Some("Ctrl+Z"), |ed| {
        if !ed.ide.undo() {
            ed.set_status("Nothing to undo", std::time::Duration::from_secs(2));
        }
        ed.ensure_visible()
    }));
    reg.register(command("redo", "Redo (Ctrl+Y)", Some("Ctrl+Y"), |ed| {
        if !ed.ide.redo() {
            ed.set_status("Nothing to redo", std::time::Duration::from_secs(2));
        }
        ed.ensure_visible()
    }));
    reg.register(command("find", "Find (Ctrl+F)", Some("Ctrl+F"), |ed| {
        let initial = ed.last_find.clone().unwrap_or_default();
        ed.open_prompt(PromptKind::Find, initial);
        Ok(())
    }));
    reg.register(command("replace", "Replace all (Ctrl+R)", Some("Ctrl+R"), |ed| {
        ed.replace_query = None;
        let initial = ed.last_find.clone().unwrap_or_default();
        ed.open_prompt(PromptKind::ReplaceFind, initial);
        Ok(())
    }));
    reg.register(command("format", "Auto-format with the configured tool (Alt+F)", Some("Alt+F"), |ed| {
        ed.cmd_format()
    }));
    reg.register(command("goto_line", "Go to line (Ctrl+G)", Some("Ctrl+G"), |ed| {
        ed.open_prompt(PromptKind::GotoLine, "");
        Ok(())
    }));

    // ===== View =====
    reg.register(command("theme", "Toggle light/dark theme (Ctrl+T)", Some("Ctrl+T"), |ed| {
        ed.cmd_toggle_theme();
        Ok(())
    }));
    reg.register(command("autosave", "Toggle auto-save (Ctrl+E)", Some("Ctrl+E"), |ed| {
        ed.cmd_toggle_auto_save();
        Ok(())
    }));
    reg.register(command("command", "Command prompt / palette (Ctrl+P)", Some("Ctrl+P"), |ed| {
        ed.open_prompt(PromptKind::Command, "");
        Ok(())
    }));
    reg.register(command("help", "Show help screen (F1)", Some("F1"), |ed| {
        ed.show_help = true;
        ed.mark_redraw();
        Ok(())
    }));
}
