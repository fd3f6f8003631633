//! Backing-file contract and JSON file implementation.
//!
//! # Responsibility
//! - Read, overwrite and back up the single file holding the note array.
//! - Keep filesystem details out of the store.
//!
//! # Invariants
//! - A missing or zero-length file reads as `None`, never as an error.
//! - Writes replace the whole file; a failed write leaves the previous file intact.
//! - The backup lives at `<path>.backup` and is overwritten each time.

use log::{error, info};
use std::error::Error;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Default backing file location, relative to the working directory.
pub const DEFAULT_NOTES_PATH: &str = "data/notes.json";

const BACKUP_SUFFIX: &str = ".backup";
const TEMP_SUFFIX: &str = ".tmp";

pub type RepoResult<T> = Result<T, RepoError>;

/// Backing-file access error.
#[derive(Debug)]
pub enum RepoError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "`{}`: {source}", path.display()),
            Self::Encode(err) => write!(f, "failed to encode notes: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Storage contract for the serialized note collection.
pub trait NoteFile {
    /// Location of the backing file.
    fn path(&self) -> &Path;
    /// Returns file bytes, or `None` when the file is missing or empty.
    fn read_contents(&self) -> RepoResult<Option<Vec<u8>>>;
    /// Replaces the whole file with `bytes`.
    fn write_contents(&self, bytes: &[u8]) -> RepoResult<()>;
    /// Copies `bytes` to the backup sibling and returns its path.
    fn write_backup(&self, bytes: &[u8]) -> RepoResult<PathBuf>;
}

/// Filesystem-backed JSON note file.
#[derive(Debug, Clone)]
pub struct JsonNoteFile {
    path: PathBuf,
}

impl JsonNoteFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the recovery copy written for unreadable files.
    pub fn backup_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, BACKUP_SUFFIX)
    }

    fn io_error(&self, path: &Path, source: std::io::Error) -> RepoError {
        RepoError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn ensure_parent_dir(&self) -> RepoResult<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|err| self.io_error(parent, err))
            }
            _ => Ok(()),
        }
    }
}

impl Default for JsonNoteFile {
    fn default() -> Self {
        Self::new(DEFAULT_NOTES_PATH)
    }
}

impl NoteFile for JsonNoteFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read_contents(&self) -> RepoResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(self.io_error(&self.path, err)),
        }
    }

    fn write_contents(&self, bytes: &[u8]) -> RepoResult<()> {
        let started_at = Instant::now();
        let temp_path = sibling_with_suffix(&self.path, TEMP_SUFFIX);

        let result = self
            .ensure_parent_dir()
            .and_then(|()| {
                fs::write(&temp_path, bytes).map_err(|err| self.io_error(&temp_path, err))
            })
            .and_then(|()| {
                fs::rename(&temp_path, &self.path).map_err(|err| self.io_error(&self.path, err))
            });

        match result {
            Ok(()) => {
                info!(
                    "event=notes_write module=repo status=ok bytes={} duration_ms={}",
                    bytes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                let _ = fs::remove_file(&temp_path);
                error!(
                    "event=notes_write module=repo status=error duration_ms={} error_code=write_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn write_backup(&self, bytes: &[u8]) -> RepoResult<PathBuf> {
        let backup_path = self.backup_path();
        fs::write(&backup_path, bytes).map_err(|err| self.io_error(&backup_path, err))?;
        info!(
            "event=notes_backup module=repo status=ok bytes={}",
            bytes.len()
        );
        Ok(backup_path)
    }
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
