//! Optional `runpad.toml` settings.

use crate::autosave;
use crate::sandbox::script::DEFAULT_MAX_OPERATIONS;
use crate::sandbox::{DisabledSandbox, ProcessSandbox, Sandbox, ScriptSandbox};
use crate::types::Theme;
use crate::utils::default_config_dirs;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "runpad.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {}: {source}", path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub theme: Theme,
    pub autosave: AutoSaveConfig,
    pub run: RunConfig,
    pub format: FormatConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoSaveConfig {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self { enabled: false, interval_secs: autosave::DEFAULT_INTERVAL.as_secs() }
    }
}

impl AutoSaveConfig {
    /// Zero is bumped to one second so the worker never spins.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerKind {
    Script,
    #[default]
    Process,
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub runner: RunnerKind,
    pub program: String,
    pub args: Vec<String>,
    pub timeout_ms: Option<u64>,
    pub max_operations: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            runner: RunnerKind::Process,
            program: "python3".to_string(),
            args: vec!["-".to_string()],
            timeout_ms: None,
            max_operations: DEFAULT_MAX_OPERATIONS,
        }
    }
}

impl RunConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Build the runner this configuration selects.
    pub fn build_sandbox(&self) -> Box<dyn Sandbox> {
        match self.runner {
            RunnerKind::Script => Box::new(ScriptSandbox::new(self.max_operations, self.timeout())),
            RunnerKind::Process => {
                Box::new(ProcessSandbox::new(&self.program, self.args.clone(), self.timeout()))
            }
            RunnerKind::Disabled => Box::new(DisabledSandbox),
        }
    }
}

/// External formatter command. Without a `program`, formatting is unavailable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    pub program: Option<String>,
    pub args: Vec<String>,
}

impl Config {
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(path, &text)
    }

    /// Load the first `runpad.toml` found in `dirs`; defaults if there is none.
    pub fn load_first(dirs: &[PathBuf]) -> Result<Self, ConfigError> {
        for dir in dirs {
            let path = dir.join(CONFIG_FILE_NAME);
            if path.is_file() {
                tracing::info!(path = %path.display(), "loading config");
                return Self::load_from(&path);
            }
        }
        Ok(Self::default())
    }

    /// Load from the current directory or the executable's directory.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_first(&default_config_dirs())
    }
}
