//! Flutter bridge crate for the notepad window.
//! Thin FFI layer; every rule lives in `notepad_core`.

pub mod api;
