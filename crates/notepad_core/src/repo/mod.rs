//! Persistence layer for the note collection.
//!
//! # Responsibility
//! - Define the backing-file contract used by the store.
//! - Isolate filesystem details from collection bookkeeping.
//!
//! # Invariants
//! - Persistence is always a whole-file overwrite, never a partial patch.
//! - No file locking; the file is owned by one process instance.

pub mod note_file;
