//! Running the document as a program.
//!
//! A [`Sandbox`] takes the source text and returns whatever the program printed plus the
//! error it stopped with, if any. Errors raised *by the program* end up in
//! [`RunOutput::error`]; [`RunError`] is reserved for failures to run it at all.

pub mod process;
pub mod script;

pub use process::ProcessSandbox;
pub use script::ScriptSandbox;

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("nothing to run")]
    EmptyProgram,
    #[error("running programs is disabled")]
    Disabled,
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("i/o error while running program: {0}")]
    Io(#[from] io::Error),
    #[error("a program is already running")]
    Busy,
    #[error("run worker stopped unexpectedly")]
    WorkerLost,
}

/// Captured result of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    /// Message of the error that ended the program, if it did not finish normally.
    pub error: Option<String>,
}

impl RunOutput {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Text for the console panel: stdout, then stderr, then `Error: <message>`.
    pub fn console_text(&self) -> String {
        let mut out = String::with_capacity(self.stdout.len() + self.stderr.len());
        out.push_str(&self.stdout);
        out.push_str(&self.stderr);
        if let Some(e) = &self.error {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("Error: ");
            out.push_str(e);
        }
        out
    }
}

/// Shared flag a running program polls to see whether it should stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Message recorded when a run is stopped through its [`CancelToken`].
pub const CANCELLED_MESSAGE: &str = "execution cancelled";

pub trait Sandbox: Send + Sync {
    /// Short runner name for logs and the status bar.
    fn name(&self) -> &'static str;

    /// Execute `source`, observing `cancel` while it runs.
    fn execute(&self, source: &str, cancel: &CancelToken) -> Result<RunOutput, RunError>;

    /// Reject blank programs, then [`execute`](Self::execute).
    fn run(&self, source: &str, cancel: &CancelToken) -> Result<RunOutput, RunError> {
        if source.trim().is_empty() {
            return Err(RunError::EmptyProgram);
        }
        let started = std::time::Instant::now();
        let result = self.execute(source, cancel);
        match &result {
            Ok(out) => tracing::info!(
                runner = self.name(),
                elapsed_ms = started.elapsed().as_millis(),
                success = out.succeeded(),
                "program finished"
            ),
            Err(e) => tracing::warn!(runner = self.name(), error = %e, "program could not run"),
        }
        result
    }
}

/// Runner used when execution is switched off in the configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledSandbox;

impl Sandbox for DisabledSandbox {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn execute(&self, _source: &str, _cancel: &CancelToken) -> Result<RunOutput, RunError> {
        Err(RunError::Disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Counts how often `execute` is reached.
    #[derive(Default)]
    struct CountingSandbox {
        calls: AtomicUsize,
    }

    impl Sandbox for CountingSandbox {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn execute(&self, source: &str, _cancel: &CancelToken) -> Result<RunOutput, RunError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RunOutput { stdout: source.to_string(), ..RunOutput::default() })
        }
    }

    #[test]
    fn blank_program_never_executes() {
        let sandbox = CountingSandbox::default();
        for src in ["", "   ", "\n\t\r\n"] {
            assert!(matches!(
                sandbox.run(src, &CancelToken::new()),
                Err(RunError::EmptyProgram)
            ));
        }
        assert_eq!(sandbox.calls.load(Ordering::SeqCst), 0);

        let out = sandbox.run("x", &CancelToken::new()).unwrap();
        assert_eq!(out.stdout, "x");
        assert_eq!(sandbox.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn disabled_runner_refuses() {
        let err = DisabledSandbox.run("print(1)", &CancelToken::new()).unwrap_err();
        assert!(matches!(err, RunError::Disabled));
    }

    #[test]
    fn console_text_layout() {
        let out = RunOutput {
            stdout: "2\n".into(),
            stderr: "warn".into(),
            error: Some("boom".into()),
        };
        assert_eq!(out.console_text(), "2\nwarn\nError: boom");
        assert!(!out.succeeded());

        let only_error = RunOutput { error: Some("x".into()), ..RunOutput::default() };
        assert_eq!(only_error.console_text(), "Error: x");
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }
}
