//! `runpad`: a terminal script editor with a run console.
//!
//! ## Reading guide (high level architecture)
//! - **`main()` / `run()`**: parses arguments, sets up logging and the terminal, and runs the
//!   main input/render loop.
//! - **`terminal::TerminalGuard`**: switches the terminal into raw mode + an alternate screen,
//!   then reliably restores it on exit (even on panic).
//! - **`editor::Editor`**: terminal-side state (viewport, prompts, status bar) wrapped around
//!   the library's `ide::Ide`, plus key handling and rendering.
//! - **`commands`**: the named actions reachable from key chords and the command palette.

mod commands;
mod editor;
mod terminal;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use editor::Editor;
use runpad::config::Config;
use runpad::ide::APP_NAME;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use terminal::TerminalGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "runpad.log";

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}

/// Log to a file in the temp directory; the terminal belongs to the editor.
/// `RUST_LOG` overrides the default `info` filter.
fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let appender = tracing_appender::rolling::never(std::env::temp_dir(), LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|()| guard)
}

fn print_help() {
    println!("runpad: a terminal script editor with a run console");
    println!();
    println!("USAGE:");
    println!("    runpad [FILE]          Open a file (a missing file becomes the save target)");
    println!("    runpad -h, --help      Show this help message");
    println!("    runpad -v, --version   Show version information");
    println!();
    println!("KEYBINDINGS:");
    println!("    F5                     Run the program");
    println!("    Esc                    Cancel a running program");
    println!("    Ctrl+P                 Command palette");
    println!("    Ctrl+N / Ctrl+O        New / open");
    println!("    Ctrl+S / Ctrl+Shift+S  Save / save as");
    println!("    Ctrl+F / Ctrl+R        Find / replace all");
    println!("    Ctrl+T / Ctrl+E        Toggle theme / auto-save");
    println!("    Ctrl+Q                 Quit");
    println!();
    println!("CONFIG:");
    println!("    runpad.toml in the current directory, then next to the executable");
}

/// Runs the editor:
/// - parses command line arguments
/// - sets up logging, loads the config
/// - sets up the terminal (raw mode + alternate screen)
/// - loops: render → read input events → update state
fn run() -> Result<()> {
    let mut file_to_open = None;
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                return Ok(());
            }
            "-v" | "--version" => {
                println!("{APP_NAME} v{}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            flag if flag.starts_with('-') => {
                eprintln!("Error: Unknown flag '{flag}'");
                eprintln!("Try 'runpad --help' for more information.");
                std::process::exit(1);
            }
            path => file_to_open = Some(PathBuf::from(path)),
        }
    }

    let _log_guard = init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config ignored, using defaults");
        Config::default()
    });

    let mut stdout = io::stdout();
    let _term = TerminalGuard::new(&mut stdout)?;

    let mut editor = Editor::new(&config, file_to_open)?;

    // Poll with a timeout so background runs, auto-saves and status expiry get picked up
    // between key presses.
    while !editor.should_quit() {
        editor.render(&mut stdout)?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Err(e) = editor.handle_key(key) {
                        tracing::warn!(error = %format!("{e:#}"), "command failed");
                        editor.set_status(format!("{e:#}"), Duration::from_secs(4));
                    }
                }
                Event::Resize(_, _) => editor.on_resize()?,
                _ => {}
            }
        }
        editor.tick();
    }

    tracing::info!("exiting");
    Ok(())
}
