use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("failed to read checkpoint file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write checkpoint file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Single-value store for the newest processed post id.
///
/// Kept behind a trait so orchestration does not care what backs it.
pub trait CheckpointStore {
    /// Returns the id recorded by the previous run, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read.
    fn load(&self) -> Result<Option<u64>, CheckpointError>;

    /// Records `id` as the newest processed post.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    fn save(&self, id: u64) -> Result<(), CheckpointError>;
}

/// File-backed checkpoint: a plain text file holding one decimal integer.
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CheckpointStore for FileCheckpoint {
    fn load(&self) -> Result<Option<u64>, CheckpointError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CheckpointError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        match trimmed.parse() {
            Ok(id) => Ok(Some(id)),
            Err(_) => {
                warn!(
                    path = %self.path.display(),
                    content = %trimmed,
                    "Ignoring unparsable checkpoint content"
                );
                Ok(None)
            }
        }
    }

    // Write-to-temp-then-rename: a crash mid-write must not clobber a valid checkpoint.
    fn save(&self, id: u64) -> Result<(), CheckpointError> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let write = || -> std::io::Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
            tmp.write_all(id.to_string().as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&self.path).map_err(|e| e.error)?;
            Ok(())
        };

        write().map_err(|e| CheckpointError::Write {
            path: self.path.clone(),
            source: e,
        })
    }
}
