//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `notepad_core` linkage and the default backing file from a shell.
//! - Report a corrupt note file the same way the window's startup warning does.

use notepad_core::{NoteStore, StoreError, DEFAULT_NOTES_PATH};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("notepad_core ping={}", notepad_core::ping());
    println!("notepad_core version={}", notepad_core::core_version());

    let mut store = NoteStore::open(DEFAULT_NOTES_PATH);
    match store.load() {
        Ok(count) => {
            println!("notes path={} count={count}", store.path().display());
            for note in store.notes() {
                println!("- {} ({} chars)", note.title(), note.content().chars().count());
            }
            ExitCode::SUCCESS
        }
        Err(StoreError::CorruptStore(corrupt)) => {
            eprintln!("warning: {corrupt}; starting with an empty list");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
