//! Core note persistence for the notepad desktop app.
//! This crate owns the note list and keeps it in sync with `data/notes.json`;
//! the UI only talks to it through `NoteStore` operations.

pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{MalformedRecordError, Note, NoteRecord};
pub use repo::note_file::{JsonNoteFile, NoteFile, RepoError, RepoResult, DEFAULT_NOTES_PATH};
pub use service::note_store::{
    CorruptCause, CorruptStoreError, NoteStore, StoreError, StoreResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
