//! Terminal setup and teardown.

use anyhow::{Context, Result};
use crossterm::{
    cursor, style,
    terminal::{self, ClearType},
    ExecutableCommand,
};
use std::io::{self, Stdout, Write};
use std::sync::Once;

/// RAII guard for terminal state: raw mode and the alternate screen are entered in `new()`
/// and always left again in `Drop`, even on early return.
pub struct TerminalGuard;

impl TerminalGuard {
    /// Enable raw mode and the alternate screen.
    pub fn new(stdout: &mut Stdout) -> Result<Self> {
        install_panic_hook();
        terminal::enable_raw_mode().context("enable_raw_mode failed")?;
        stdout.execute(terminal::EnterAlternateScreen)?;
        stdout.execute(cursor::Hide)?;
        stdout.execute(terminal::Clear(ClearType::All))?;
        stdout.flush()?;
        Ok(Self)
    }
}

fn restore() {
    let mut stdout = io::stdout();
    let _ = stdout.execute(style::ResetColor);
    let _ = stdout.execute(cursor::Show);
    let _ = stdout.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = stdout.flush();
}

/// Leave raw mode before the default hook prints, so a panic message stays readable.
fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            tracing::error!(%info, "panic");
            default_panic(info);
        }));
    });
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}
