//! Whole-file reads and writes.
//!
//! Files are plain UTF-8 and written back exactly as the buffer holds them. There is no
//! atomic rename or partial-write protection; callers serialize writers through the
//! document lock.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Read the whole file as UTF-8.
pub fn open(path: &Path) -> Result<String, PersistError> {
    let text = fs::read_to_string(path)
        .map_err(|source| PersistError::Read { path: path.to_path_buf(), source })?;
    tracing::info!(path = %path.display(), bytes = text.len(), "opened file");
    Ok(text)
}

/// Replace the file's contents with `content`.
pub fn save(path: &Path, content: &str) -> Result<(), PersistError> {
    fs::write(path, content)
        .map_err(|source| PersistError::Write { path: path.to_path_buf(), source })?;
    tracing::info!(path = %path.display(), bytes = content.len(), "saved file");
    Ok(())
}
