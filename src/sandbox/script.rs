//! In-process runner backed by the embedded Rhai interpreter.
//!
//! Every run gets a brand-new [`rhai::Engine`] and scope, so nothing a program defines is
//! visible to the next one. Output hooks write into sinks owned by that engine and are
//! gone when the run returns.

use super::{CancelToken, RunError, RunOutput, Sandbox, CANCELLED_MESSAGE};
use rhai::{Dynamic, Engine, EvalAltResult};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Operation budget per run, as for editor scripts.
pub const DEFAULT_MAX_OPERATIONS: u64 = 2_000_000;

#[derive(Debug, Clone)]
pub struct ScriptSandbox {
    max_operations: u64,
    timeout: Option<Duration>,
}

impl Default for ScriptSandbox {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OPERATIONS, None)
    }
}

impl ScriptSandbox {
    /// `max_operations == 0` means unlimited.
    pub fn new(max_operations: u64, timeout: Option<Duration>) -> Self {
        Self { max_operations, timeout }
    }

    fn build_engine(
        &self,
        stdout: &Rc<RefCell<String>>,
        stderr: &Rc<RefCell<String>>,
        cancel: &CancelToken,
    ) -> Engine {
        let mut engine = Engine::new();
        engine.set_max_operations(self.max_operations);

        let out = Rc::clone(stdout);
        engine.on_print(move |s| {
            let mut out = out.borrow_mut();
            out.push_str(s);
            out.push('\n');
        });

        let err = Rc::clone(stderr);
        engine.on_debug(move |s, _src, _pos| {
            let mut err = err.borrow_mut();
            err.push_str(s);
            err.push('\n');
        });

        let err = Rc::clone(stderr);
        engine.register_fn("eprint", move |v: Dynamic| {
            let mut err = err.borrow_mut();
            err.push_str(&v.to_string());
            err.push('\n');
        });

        let cancel = cancel.clone();
        let deadline = self.timeout.map(|t| (t, Instant::now() + t));
        engine.on_progress(move |_ops| {
            if cancel.is_cancelled() {
                return Some(Dynamic::from(CANCELLED_MESSAGE.to_string()));
            }
            match deadline {
                Some((limit, at)) if Instant::now() >= at => {
                    Some(Dynamic::from(format!("timed out after {} ms", limit.as_millis())))
                }
                _ => None,
            }
        });

        engine
    }
}

impl Sandbox for ScriptSandbox {
    fn name(&self) -> &'static str {
        "script"
    }

    fn execute(&self, source: &str, cancel: &CancelToken) -> Result<RunOutput, RunError> {
        let stdout = Rc::new(RefCell::new(String::new()));
        let stderr = Rc::new(RefCell::new(String::new()));

        let result = {
            let engine = self.build_engine(&stdout, &stderr, cancel);
            engine.run(source)
        };

        let error = result.err().map(|e| error_message(&e));
        Ok(RunOutput { stdout: stdout.take(), stderr: stderr.take(), error })
    }
}

/// Message shown after `Error: ` for a failed run.
fn error_message(err: &EvalAltResult) -> String {
    match err {
        // `throw "x"` reports just `x`.
        EvalAltResult::ErrorRuntime(value, _) => value.to_string(),
        EvalAltResult::ErrorTerminated(reason, _) => reason.to_string(),
        EvalAltResult::ErrorTooManyOperations(_) => "operation limit exceeded".to_string(),
        other => other.to_string(),
    }
}
