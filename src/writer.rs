//! Idempotent file writer
//!
//! The only place files are written. Content is compared with what is on
//! disk and written only when it differs, so unchanged outputs keep their
//! modification time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;

/// Errors that can occur while comparing or writing an output file
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to read existing output {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// Result of writing one output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Content differed (or the file was absent) and was written
    Changed,
    /// Content already on disk, nothing written
    Unchanged,
}

/// Writes outputs only when their content changes
#[derive(Debug, Clone, Copy, Default)]
pub struct Writer {
    dry_run: bool,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare and report, but never touch the filesystem
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Write `content` to `path` unless the file already holds exactly it
    pub fn write(&self, path: &Path, content: &str) -> Result<WriteOutcome, WriteError> {
        if read_existing(path)?.as_deref() == Some(content.as_bytes()) {
            info!("{} is up to date", path.display());
            return Ok(WriteOutcome::Unchanged);
        }

        if self.dry_run {
            info!("{} would be written", path.display());
            return Ok(WriteOutcome::Changed);
        }

        info!("writing {}", path.display());
        fs::write(path, content).map_err(|source| WriteError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(WriteOutcome::Changed)
    }
}

/// Existing content, `None` when the file does not exist
fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, WriteError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(WriteError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
