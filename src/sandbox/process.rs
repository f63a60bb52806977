//! Runner that pipes the program into an external interpreter (`python3 -` by default).

use super::{CancelToken, RunError, RunOutput, Sandbox, CANCELLED_MESSAGE};
use std::io::{Read, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(15);

#[derive(Debug, Clone)]
pub struct ProcessSandbox {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl Default for ProcessSandbox {
    fn default() -> Self {
        Self::new("python3", vec!["-".to_string()], None)
    }
}

impl ProcessSandbox {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Option<Duration>) -> Self {
        Self { program: program.into(), args, timeout }
    }

    fn spawn(&self) -> Result<Child, RunError> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| RunError::Spawn { program: self.program.clone(), source })
    }
}

/// How the child ended.
enum Exit {
    Finished(ExitStatus),
    Killed(String),
}

impl Sandbox for ProcessSandbox {
    fn name(&self) -> &'static str {
        "process"
    }

    fn execute(&self, source: &str, cancel: &CancelToken) -> Result<RunOutput, RunError> {
        let started = Instant::now();
        let mut child = self.spawn()?;

        let writer = child.stdin.take().map(|stdin| feed_stdin(stdin, source.to_string()));
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let exit = loop {
            if let Some(status) = child.try_wait()? {
                break Exit::Finished(status);
            }
            let reason = if cancel.is_cancelled() {
                Some(CANCELLED_MESSAGE.to_string())
            } else {
                self.timeout
                    .filter(|t| started.elapsed() >= *t)
                    .map(|t| format!("timed out after {} ms", t.as_millis()))
            };
            if let Some(reason) = reason {
                // The child may exit between try_wait and kill.
                if let Err(e) = child.kill() {
                    tracing::debug!(error = %e, "kill after exit");
                }
                child.wait()?;
                break Exit::Killed(reason);
            }
            thread::sleep(POLL_INTERVAL);
        };

        if let Some(writer) = writer {
            // A program that exits without reading its input breaks the pipe; that is fine.
            if let Ok(Err(e)) = writer.join() {
                tracing::debug!(error = %e, "stdin closed early");
            }
        }
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        let error = match exit {
            Exit::Killed(reason) => Some(reason),
            Exit::Finished(status) if status.success() => None,
            Exit::Finished(status) => Some(
                stderr
                    .lines()
                    .rev()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map_or_else(|| format!("process {status}"), str::to_string),
            ),
        };
        Ok(RunOutput { stdout, stderr, error })
    }
}

fn feed_stdin(mut stdin: ChildStdin, source: String) -> JoinHandle<std::io::Result<()>> {
    thread::spawn(move || {
        // Dropping stdin at the end closes the pipe so the interpreter sees EOF.
        stdin.write_all(source.as_bytes())?;
        stdin.flush()
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf) {
            tracing::debug!(error = %e, "output pipe read failed");
        }
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> ProcessSandbox {
        ProcessSandbox::new("sh", vec!["-c".to_string(), script.to_string()], None)
    }

    fn has_python() -> bool {
        Command::new("python3")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success())
    }

    #[test]
    fn default_runs_python_source() {
        if !has_python() {
            return;
        }
        let out = ProcessSandbox::default().run("print(1+1)\n", &CancelToken::new()).unwrap();
        assert_eq!(out.stdout, "2\n");
        assert!(out.succeeded());
    }

    #[test]
    fn python_exception_becomes_the_run_error() {
        if !has_python() {
            return;
        }
        let out = ProcessSandbox::default()
            .run("raise ValueError('x')\n", &CancelToken::new())
            .unwrap();
        assert_eq!(out.stdout, "");
        let err = out.error.unwrap();
        assert!(err.contains('x'), "{err}");
        assert!(err.starts_with("ValueError"), "{err}");
        assert!(out.stderr.contains("Traceback"));
    }

    #[test]
    fn source_is_piped_to_stdin() {
        let out = ProcessSandbox::new("cat", Vec::new(), None)
            .run("print('hi')\n", &CancelToken::new())
            .unwrap();
        assert_eq!(out.stdout, "print('hi')\n");
        assert!(out.succeeded());
    }

    #[test]
    fn output_is_transformed_by_interpreter() {
        let out = ProcessSandbox::new("tr", vec!["a-z".into(), "A-Z".into()], None)
            .run("shout", &CancelToken::new())
            .unwrap();
        assert_eq!(out.stdout, "SHOUT");
    }

    #[test]
    fn failing_exit_reports_last_stderr_line() {
        let out = sh("echo partial; echo 'Traceback' >&2; echo 'ValueError: bad' >&2; exit 1")
            .run("ignored", &CancelToken::new())
            .unwrap();
        assert_eq!(out.stdout, "partial\n");
        assert_eq!(out.error.as_deref(), Some("ValueError: bad"));
        assert!(out.stderr.contains("Traceback"));
    }

    #[test]
    fn silent_failure_reports_status() {
        let out = sh("exit 3").run("x", &CancelToken::new()).unwrap();
        let err = out.error.unwrap();
        assert!(err.starts_with("process "), "{err}");
    }

    #[test]
    fn timeout_kills_the_child() {
        let sandbox = ProcessSandbox::new(
            "sh",
            vec!["-c".into(), "exec sleep 10".into()],
            Some(Duration::from_millis(100)),
        );
        let begun = Instant::now();
        let out = sandbox.run("x", &CancelToken::new()).unwrap();
        assert_eq!(out.error.as_deref(), Some("timed out after 100 ms"));
        assert!(begun.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn cancel_kills_the_child() {
        let token = CancelToken::new();
        let worker_token = token.clone();
        let handle = thread::spawn(move || sh("exec sleep 10").run("x", &worker_token));
        thread::sleep(Duration::from_millis(100));
        token.cancel();
        let out = handle.join().unwrap().unwrap();
        assert_eq!(out.error.as_deref(), Some(CANCELLED_MESSAGE));
    }

    #[test]
    fn missing_interpreter_is_a_spawn_error() {
        let err = ProcessSandbox::new("definitely-not-a-real-binary-xyz", Vec::new(), None)
            .run("x", &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }
}
