//! FFI intent API for the Flutter note window.
//!
//! # Responsibility
//! - Expose add/rename/edit/delete/list/load intents as sync calls.
//! - Own the single process-wide `NoteStore`; the UI never touches the
//!   collection directly.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures carry a stable `error_code` plus a human-readable message.
//! - The UI refreshes its list from `notes_list` after any `ok` mutation.

use notepad_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    JsonNoteFile, Note, NoteStore, StoreError, DEFAULT_NOTES_PATH,
};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

const NOTES_PATH_ENV: &str = "NOTEPAD_DATA_PATH";
static NOTES_PATH: OnceLock<PathBuf> = OnceLock::new();
static NOTE_STORE: OnceLock<Mutex<NoteStore<JsonNoteFile>>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One note as rendered by the list and editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub title: String,
    pub content: String,
    /// RFC 3339 UTC creation time.
    pub created_at: String,
}

/// Result envelope for note intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteActionResponse {
    /// Whether the intent completed (mutation applied and saved).
    pub ok: bool,
    /// Stable failure code, `None` on success.
    pub error_code: Option<String>,
    /// Human-readable message for dialogs/diagnostics.
    pub message: String,
    /// Note affected by the intent, when there is one.
    pub note: Option<NoteItem>,
    /// Recovery copy written when the backing file was corrupt.
    pub backup_path: Option<String>,
}

impl NoteActionResponse {
    fn success(message: impl Into<String>, note: Option<NoteItem>) -> Self {
        Self {
            ok: true,
            error_code: None,
            message: message.into(),
            note,
            backup_path: None,
        }
    }

    fn failure(action: &str, err: &StoreError) -> Self {
        let backup_path = match err {
            StoreError::CorruptStore(corrupt) => corrupt
                .backup_path
                .as_ref()
                .map(|path| path.display().to_string()),
            _ => None,
        };
        Self {
            ok: false,
            error_code: Some(error_code(err).to_string()),
            message: format!("{action} failed: {err}"),
            note: None,
            backup_path,
        }
    }
}

/// Loads notes from the backing file, replacing the in-memory list.
///
/// # FFI contract
/// - Missing or empty file succeeds with an empty list.
/// - Corrupt file returns `error_code = corrupt_store`, sets `backup_path`
///   and leaves the list empty; the UI shows a warning and keeps running.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_load() -> NoteActionResponse {
    with_store("notes_load", |store| {
        store
            .load()
            .map(|count| NoteActionResponse::success(format!("Loaded {count} note(s)."), None))
    })
}

/// Creates a note; fails with `duplicate_title` when the title is taken.
#[flutter_rust_bridge::frb(sync)]
pub fn note_add(title: String, content: String) -> NoteActionResponse {
    with_store("note_add", |store| {
        store
            .add(title, content)
            .map(|note| NoteActionResponse::success("Note created.", Some(to_note_item(&note))))
    })
}

/// Renames a note; unknown `old_title` is a successful no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn note_rename(old_title: String, new_title: String) -> NoteActionResponse {
    with_store("note_rename", |store| {
        store.rename(old_title.as_str(), new_title.as_str())?;
        let renamed = store.get(new_title.as_str()).map(to_note_item);
        Ok(NoteActionResponse::success("Note renamed.", renamed))
    })
}

/// Saves editor content; unknown `title` (no selection) is a successful no-op.
///
/// Called on every content-edit event.
#[flutter_rust_bridge::frb(sync)]
pub fn note_update_content(title: String, content: String) -> NoteActionResponse {
    with_store("note_update_content", |store| {
        store.update_content(title.as_str(), content)?;
        let updated = store.get(title.as_str()).map(to_note_item);
        Ok(NoteActionResponse::success("Note saved.", updated))
    })
}

/// Deletes a note; unknown `title` is a successful no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn note_delete(title: String) -> NoteActionResponse {
    with_store("note_delete", |store| {
        let removed = store.delete(title.as_str())?;
        Ok(NoteActionResponse::success(
            format!("Deleted {removed} note(s)."),
            None,
        ))
    })
}

/// Returns the current notes in display order.
#[flutter_rust_bridge::frb(sync)]
pub fn notes_list() -> Vec<NoteItem> {
    lock_store().notes().iter().map(to_note_item).collect()
}

/// Returns one note by exact title.
#[flutter_rust_bridge::frb(sync)]
pub fn note_get(title: String) -> Option<NoteItem> {
    lock_store().get(title.as_str()).map(to_note_item)
}

fn error_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::DuplicateTitle(_) => "duplicate_title",
        StoreError::EmptyTitle => "empty_title",
        StoreError::CorruptStore(_) => "corrupt_store",
        StoreError::Persistence(_) => "persistence_failed",
        StoreError::Unreadable(_) => "unreadable_store",
    }
}

fn resolve_notes_path() -> PathBuf {
    NOTES_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(NOTES_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            default_notes_path()
        })
        .clone()
}

#[cfg(not(test))]
fn default_notes_path() -> PathBuf {
    PathBuf::from(DEFAULT_NOTES_PATH)
}

/// Test runs share one scratch directory, cleared when the store is first
/// opened so leftovers from earlier runs do not pile up.
#[cfg(test)]
fn default_notes_path() -> PathBuf {
    let root = test_scratch_dir();
    let _ = std::fs::remove_dir_all(&root);
    root.join(DEFAULT_NOTES_PATH)
}

#[cfg(test)]
fn test_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("notepad-ffi-tests")
}

fn lock_store() -> MutexGuard<'static, NoteStore<JsonNoteFile>> {
    let store = NOTE_STORE.get_or_init(|| Mutex::new(NoteStore::open(resolve_notes_path())));
    // Recover a poisoned lock; panics must not cross FFI.
    store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn with_store(
    action: &str,
    f: impl FnOnce(&mut NoteStore<JsonNoteFile>) -> Result<NoteActionResponse, StoreError>,
) -> NoteActionResponse {
    let mut store = lock_store();
    let result = f(&mut *store);
    respond(action, result)
}

/// Converts a store result into the envelope returned across FFI.
fn respond(action: &str, result: Result<NoteActionResponse, StoreError>) -> NoteActionResponse {
    match result {
        Ok(response) => response,
        Err(err) => {
            log::warn!(
                "event=ffi_call module=ffi status=error action={} error_code={}",
                action,
                error_code(&err)
            );
            NoteActionResponse::failure(action, &err)
        }
    }
}

fn to_note_item(note: &Note) -> NoteItem {
    let record = note.to_record();
    NoteItem {
        title: record.title,
        content: record.content,
        created_at: record.created_at,
    }
}
