//! Core use-case services.
//!
//! # Responsibility
//! - Turn presentation-layer intents into validated collection changes.
//! - Keep UI/FFI layers away from the collection and the backing file.

pub mod note_store;
