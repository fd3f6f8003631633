//! Domain model for the note list.
//!
//! # Responsibility
//! - Define the note value type shared by store, FFI and CLI callers.
//! - Own the plain-object wire shape of a stored note.
//!
//! # Invariants
//! - A note is identified by its title; uniqueness is enforced by the store.

pub mod note;
