//! Note store: the in-memory note list and its JSON backing file.
//!
//! # Responsibility
//! - Own the ordered note collection (insertion order is display order).
//! - Validate add/rename/edit/delete intents, mutate, then persist.
//! - Recover from unreadable backing files by backing them up.
//!
//! # Invariants
//! - No two notes in the collection share a title (exact, case-sensitive).
//! - Every successful mutation is followed by a whole-collection write.
//! - A failed load leaves the collection empty, never partially populated.
//! - A failed persist keeps the in-memory mutation (no rollback); memory and
//!   disk may diverge until the next successful persist.
//!
//! # Concurrency
//! - Single-threaded; callers serialize access. No file locking is done, so
//!   an external writer between load and persist is silently overwritten.

use crate::model::note::{MalformedRecordError, Note, NoteRecord};
use crate::repo::note_file::{JsonNoteFile, NoteFile, RepoError};
use log::{error, info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Instant;

const JSON_INDENT: &[u8] = b"    ";

pub type StoreResult<T> = Result<T, StoreError>;

/// Reason a non-empty backing file could not be turned into a collection.
#[derive(Debug)]
pub enum CorruptCause {
    InvalidJson(serde_json::Error),
    NotAnArray,
    MalformedRecord {
        index: usize,
        error: MalformedRecordError,
    },
    /// Two elements share a title. Files written by older releases, which
    /// did not check titles on add, can hit this; the list is then only kept
    /// in the `.backup` copy once the next save overwrites the file.
    DuplicateTitle {
        index: usize,
        title: String,
    },
}

impl Display for CorruptCause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(err) => write!(f, "invalid JSON: {err}"),
            Self::NotAnArray => write!(f, "top-level value is not an array"),
            Self::MalformedRecord { index, error } => write!(f, "element {index}: {error}"),
            Self::DuplicateTitle { index, title } => {
                write!(f, "element {index}: duplicate title `{title}`")
            }
        }
    }
}

/// Unreadable backing file. The original bytes were copied to `backup_path`
/// when that copy succeeded.
#[derive(Debug)]
pub struct CorruptStoreError {
    pub path: PathBuf,
    pub backup_path: Option<PathBuf>,
    pub cause: CorruptCause,
}

impl Display for CorruptStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "corrupt note file `{}`: {}", self.path.display(), self.cause)?;
        match &self.backup_path {
            Some(backup) => write!(f, " (backup saved to `{}`)", backup.display()),
            None => write!(f, " (backup could not be written)"),
        }
    }
}

impl Error for CorruptStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            CorruptCause::InvalidJson(err) => Some(err),
            CorruptCause::MalformedRecord { error, .. } => Some(error),
            CorruptCause::NotAnArray | CorruptCause::DuplicateTitle { .. } => None,
        }
    }
}

/// Error returned by note store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Another note already uses this title. Nothing was changed.
    DuplicateTitle(String),
    /// Titles must be non-empty. Nothing was changed.
    EmptyTitle,
    /// Backing file exists but cannot be decoded; collection left empty.
    CorruptStore(CorruptStoreError),
    /// Writing the backing file failed; in-memory state is kept.
    Persistence(RepoError),
    /// Backing file exists but could not be read.
    Unreadable(RepoError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateTitle(title) => write!(f, "a note titled `{title}` already exists"),
            Self::EmptyTitle => write!(f, "note title cannot be empty"),
            Self::CorruptStore(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "failed to save notes: {err}"),
            Self::Unreadable(err) => write!(f, "failed to read notes: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CorruptStore(err) => Some(err),
            Self::Persistence(err) | Self::Unreadable(err) => Some(err),
            Self::DuplicateTitle(_) | Self::EmptyTitle => None,
        }
    }
}

impl From<CorruptStoreError> for StoreError {
    fn from(value: CorruptStoreError) -> Self {
        Self::CorruptStore(value)
    }
}

/// Authoritative note collection synchronized with one backing file.
#[derive(Debug)]
pub struct NoteStore<F: NoteFile> {
    file: F,
    notes: Vec<Note>,
}

impl NoteStore<JsonNoteFile> {
    /// Creates an empty store over a JSON file at `path`. Call `load` next.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_file(JsonNoteFile::new(path))
    }
}

impl<F: NoteFile> NoteStore<F> {
    /// Creates an empty store over the provided backing file.
    pub fn with_file(file: F) -> Self {
        Self {
            file,
            notes: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read-only snapshot in display order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, title: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.title() == title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.get(title).is_some()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Replaces the collection with the backing file contents.
    ///
    /// Returns the number of loaded notes. A missing or zero-length file
    /// yields an empty collection.
    ///
    /// # Errors
    /// - `CorruptStore` when the file is not a JSON array of valid, uniquely
    ///   titled records. Decoding stops at the first bad element. The original
    ///   bytes are copied to `<path>.backup` first.
    /// - `Unreadable` when the file exists but cannot be read.
    pub fn load(&mut self) -> StoreResult<usize> {
        let started_at = Instant::now();
        self.notes.clear();

        let bytes = match self.file.read_contents() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!(
                    "event=notes_load module=store status=ok count=0 source=empty duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Ok(0);
            }
            Err(err) => {
                error!(
                    "event=notes_load module=store status=error error_code=read_failed error={}",
                    err
                );
                return Err(StoreError::Unreadable(err));
            }
        };

        match decode_notes(&bytes) {
            Ok(notes) => {
                self.notes = notes;
                info!(
                    "event=notes_load module=store status=ok count={} duration_ms={}",
                    self.notes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(self.notes.len())
            }
            Err(cause) => Err(self.recover_corrupt(&bytes, cause).into()),
        }
    }

    /// Appends a new note and persists the collection.
    ///
    /// # Errors
    /// - `EmptyTitle` or `DuplicateTitle` without any state change.
    /// - `Persistence` after the note was appended in memory.
    pub fn add(
        &mut self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> StoreResult<Note> {
        let title = title.into();
        if title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        if self.contains(&title) {
            return Err(StoreError::DuplicateTitle(title));
        }

        let note = Note::new(title, content);
        self.notes.push(note.clone());
        info!(
            "event=note_add module=store status=ok count={}",
            self.notes.len()
        );
        self.persist()?;
        Ok(note)
    }

    /// Renames a note in place, keeping its content and creation time.
    ///
    /// Missing `old_title` and `old_title == new_title` are no-op successes.
    ///
    /// # Errors
    /// - `EmptyTitle` or `DuplicateTitle` without any state change.
    /// - `Persistence` after the rename was applied in memory.
    pub fn rename(&mut self, old_title: &str, new_title: impl Into<String>) -> StoreResult<()> {
        let new_title = new_title.into();
        if !self.contains(old_title) || old_title == new_title {
            return Ok(());
        }
        if new_title.is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        if self.contains(&new_title) {
            return Err(StoreError::DuplicateTitle(new_title));
        }

        for note in self.notes.iter_mut().filter(|note| note.title() == old_title) {
            note.set_title(new_title.as_str());
        }
        info!("event=note_rename module=store status=ok");
        self.persist()
    }

    /// Replaces a note's content. Unknown titles are ignored.
    ///
    /// # Errors
    /// - `Persistence` after the edit was applied in memory.
    pub fn update_content(&mut self, title: &str, content: impl Into<String>) -> StoreResult<()> {
        let Some(note) = self.notes.iter_mut().find(|note| note.title() == title) else {
            return Ok(());
        };
        note.set_content(content);
        self.persist()
    }

    /// Removes every note titled `title` and returns how many were removed.
    /// Unknown titles are a no-op and leave the backing file untouched.
    ///
    /// # Errors
    /// - `Persistence` after the removal was applied in memory.
    pub fn delete(&mut self, title: &str) -> StoreResult<usize> {
        let before = self.notes.len();
        self.notes.retain(|note| note.title() != title);
        let removed = before - self.notes.len();
        if removed == 0 {
            return Ok(0);
        }

        info!(
            "event=note_delete module=store status=ok removed={} count={}",
            removed,
            self.notes.len()
        );
        self.persist()?;
        Ok(removed)
    }

    /// Overwrites the backing file with the whole collection.
    ///
    /// # Errors
    /// - `Persistence` when encoding or writing fails. The collection is not
    ///   rolled back.
    pub fn persist(&self) -> StoreResult<()> {
        let result = encode_notes(&self.notes)
            .map_err(RepoError::from)
            .and_then(|bytes| self.file.write_contents(&bytes));

        result.map_err(|err| {
            warn!(
                "event=notes_persist module=store status=error count={} error_code=persist_failed error={}",
                self.notes.len(),
                err
            );
            StoreError::Persistence(err)
        })
    }

    fn recover_corrupt(&self, bytes: &[u8], cause: CorruptCause) -> CorruptStoreError {
        warn!(
            "event=notes_load module=store status=error error_code=corrupt_store bytes={} cause={}",
            bytes.len(),
            cause
        );

        let backup_path = match self.file.write_backup(bytes) {
            Ok(path) => Some(path),
            Err(err) => {
                error!(
                    "event=notes_backup module=store status=error error_code=backup_failed error={}",
                    err
                );
                None
            }
        };

        CorruptStoreError {
            path: self.file.path().to_path_buf(),
            backup_path,
            cause,
        }
    }
}

fn decode_notes(bytes: &[u8]) -> Result<Vec<Note>, CorruptCause> {
    let value: Value = serde_json::from_slice(bytes).map_err(CorruptCause::InvalidJson)?;
    let Value::Array(elements) = value else {
        return Err(CorruptCause::NotAnArray);
    };

    let mut seen = HashSet::with_capacity(elements.len());
    let mut notes = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let note = Note::from_record(element)
            .map_err(|error| CorruptCause::MalformedRecord { index, error })?;
        if !seen.insert(note.title().to_string()) {
            return Err(CorruptCause::DuplicateTitle {
                index,
                title: note.title().to_string(),
            });
        }
        notes.push(note);
    }
    Ok(notes)
}

fn encode_notes(notes: &[Note]) -> Result<Vec<u8>, serde_json::Error> {
    let records = notes.iter().map(NoteRecord::from).collect::<Vec<_>>();
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(JSON_INDENT));
    records.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}
