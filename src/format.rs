//! Auto-format through an external command that reads source on stdin and writes the
//! formatted source to stdout (for example `autopep8 -`).

use crate::config::FormatConfig;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("no formatter configured")]
    NotConfigured,
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("i/o error while formatting: {0}")]
    Io(#[from] io::Error),
    #[error("formatter failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct ExternalFormatter {
    program: String,
    args: Vec<String>,
}

impl ExternalFormatter {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// `None` when no program is configured.
    pub fn from_config(cfg: &FormatConfig) -> Option<Self> {
        cfg.program.as_ref().map(|p| Self::new(p, cfg.args.clone()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the formatter over `text` and return its stdout.
    pub fn format(&self, text: &str) -> Result<String, FormatError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FormatError::Spawn { program: self.program.clone(), source })?;

        let writer = child.stdin.take().map(|mut stdin| {
            let text = text.to_string();
            thread::spawn(move || stdin.write_all(text.as_bytes()))
        });
        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            if let Ok(Err(e)) = writer.join() {
                tracing::debug!(error = %e, "formatter closed stdin early");
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map_or_else(|| output.status.to_string(), str::to_string);
            return Err(FormatError::Failed(reason));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_means_not_configured() {
        assert!(ExternalFormatter::from_config(&FormatConfig::default()).is_none());
        let cfg = FormatConfig { program: Some("autopep8".into()), args: vec!["-".into()] };
        assert_eq!(ExternalFormatter::from_config(&cfg).unwrap().program(), "autopep8");
    }

    #[cfg(unix)]
    #[test]
    fn stdout_becomes_the_new_text() {
        let fmt = ExternalFormatter::new("tr", vec!["\t".into(), " ".into()]);
        assert_eq!(fmt.format("if x:\n\tpass\n").unwrap(), "if x:\n pass\n");
    }

    #[cfg(unix)]
    #[test]
    fn failure_keeps_last_stderr_line() {
        let fmt = ExternalFormatter::new(
            "sh",
            vec!["-c".into(), "cat >/dev/null; echo 'E999 bad indent' >&2; exit 2".into()],
        );
        match fmt.format("x") {
            Err(FormatError::Failed(msg)) => assert_eq!(msg, "E999 bad indent"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unknown_program_is_a_spawn_error() {
        let fmt = ExternalFormatter::new("no-such-formatter-xyz", Vec::new());
        assert!(matches!(fmt.format("x"), Err(FormatError::Spawn { .. })));
    }
}
