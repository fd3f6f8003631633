use notepad_core::{JsonNoteFile, NoteFile, NoteStore, RepoError, RepoResult, StoreError};
use serde_json::Value;
use std::cell::Cell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

fn temp_store() -> (tempfile::TempDir, NoteStore<JsonNoteFile>) {
    let dir = tempfile::tempdir().unwrap();
    let store = NoteStore::open(dir.path().join("data").join("notes.json"));
    (dir, store)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

fn titles<F: NoteFile>(store: &NoteStore<F>) -> Vec<String> {
    store
        .notes()
        .iter()
        .map(|note| note.title().to_string())
        .collect()
}

#[test]
fn groceries_scenario_end_to_end() {
    let (_dir, mut store) = temp_store();
    assert_eq!(store.load().unwrap(), 0);

    store.add("Groceries", "milk").unwrap();
    let err = store.add("Groceries", "eggs").unwrap_err();
    assert!(matches!(err, StoreError::DuplicateTitle(ref title) if title == "Groceries"));

    store.update_content("Groceries", "milk, eggs").unwrap();
    assert_eq!(store.len(), 1);
    assert_eq!(store.notes()[0].title(), "Groceries");
    assert_eq!(store.notes()[0].content(), "milk, eggs");

    store.persist().unwrap();
    let json = read_json(store.path());
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "Groceries");
    assert_eq!(items[0]["content"], "milk, eggs");
    assert!(items[0]["created_at"].is_string());
}

#[test]
fn duplicate_add_keeps_original_content() {
    let (_dir, mut store) = temp_store();
    store.add("X", "body").unwrap();

    assert!(matches!(
        store.add("X", "other"),
        Err(StoreError::DuplicateTitle(_))
    ));
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("X").unwrap().content(), "body");
}

#[test]
fn titles_are_case_sensitive() {
    let (_dir, mut store) = temp_store();
    store.add("todo", "").unwrap();
    store.add("Todo", "").unwrap();
    assert_eq!(titles(&store), vec!["todo", "Todo"]);
}

#[test]
fn add_rejects_empty_title_without_writing() {
    let (_dir, mut store) = temp_store();
    assert!(matches!(store.add("", "body"), Err(StoreError::EmptyTitle)));
    assert!(store.is_empty());
    assert!(!store.path().exists());
}

#[test]
fn add_persists_and_returns_created_note() {
    let (_dir, mut store) = temp_store();
    let created = store.add("First", "hello").unwrap();

    assert_eq!(created.title(), "First");
    assert_eq!(store.get("First"), Some(&created));
    assert_eq!(read_json(store.path())[0]["content"], "hello");
}

#[test]
fn rename_updates_title_and_keeps_content_and_timestamp() {
    let (_dir, mut store) = temp_store();
    let created = store.add("A", "body").unwrap();

    store.rename("A", "B").unwrap();

    let renamed = store.get("B").unwrap();
    assert_eq!(renamed.content(), "body");
    assert_eq!(renamed.created_at(), created.created_at());
    assert!(!store.contains("A"));
    assert_eq!(read_json(store.path())[0]["title"], "B");
}

#[test]
fn rename_onto_existing_title_fails_and_changes_nothing() {
    let (_dir, mut store) = temp_store();
    store.add("A", "a").unwrap();
    store.add("B", "b").unwrap();
    let on_disk = std::fs::read(store.path()).unwrap();

    let err = store.rename("A", "B").unwrap_err();

    assert!(matches!(err, StoreError::DuplicateTitle(ref title) if title == "B"));
    assert_eq!(titles(&store), vec!["A", "B"]);
    assert_eq!(store.get("A").unwrap().content(), "a");
    assert_eq!(std::fs::read(store.path()).unwrap(), on_disk);
}

#[test]
fn rename_missing_or_same_title_is_noop() {
    let (_dir, mut store) = temp_store();
    store.rename("ghost", "anything").unwrap();
    assert!(!store.path().exists());

    store.add("A", "a").unwrap();
    store.rename("A", "A").unwrap();
    assert_eq!(titles(&store), vec!["A"]);
}

#[test]
fn rename_to_empty_title_is_rejected() {
    let (_dir, mut store) = temp_store();
    store.add("A", "a").unwrap();
    assert!(matches!(store.rename("A", ""), Err(StoreError::EmptyTitle)));
    assert!(store.contains("A"));
}

#[test]
fn update_content_for_unknown_title_is_noop() {
    let (_dir, mut store) = temp_store();
    store.update_content("nobody", "text").unwrap();
    assert!(store.is_empty());
    assert!(!store.path().exists());
}

#[test]
fn delete_nonexistent_leaves_collection_and_file_unchanged() {
    let (_dir, mut store) = temp_store();
    store.add("Keep", "me").unwrap();
    let on_disk = std::fs::read(store.path()).unwrap();

    assert_eq!(store.delete("nonexistent").unwrap(), 0);

    assert_eq!(titles(&store), vec!["Keep"]);
    assert_eq!(std::fs::read(store.path()).unwrap(), on_disk);
}

#[test]
fn delete_removes_note_and_persists() {
    let (_dir, mut store) = temp_store();
    store.add("A", "a").unwrap();
    store.add("B", "b").unwrap();

    assert_eq!(store.delete("A").unwrap(), 1);

    assert_eq!(titles(&store), vec!["B"]);
    let json = read_json(store.path());
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["title"], "B");
}

#[test]
fn persist_then_load_reproduces_collection_in_order() {
    let (dir, mut store) = temp_store();
    store.add("one", "1").unwrap();
    store.add("two", "").unwrap();
    store.add("three", "line\n\"quoted\" ünïcode").unwrap();
    store.persist().unwrap();

    let mut reloaded = NoteStore::open(dir.path().join("data").join("notes.json"));
    assert_eq!(reloaded.load().unwrap(), 3);
    assert_eq!(reloaded.notes(), store.notes());
}

#[test]
fn load_replaces_previous_in_memory_collection() {
    let (dir, mut store) = temp_store();
    store.add("persisted", "").unwrap();

    let mut other = NoteStore::open(dir.path().join("data").join("notes.json"));
    other.load().unwrap();
    store.add("second", "").unwrap();
    other.load().unwrap();

    assert_eq!(titles(&other), vec!["persisted", "second"]);
}

#[test]
fn uniqueness_holds_across_scripted_operation_sequences() {
    let (_dir, mut store) = temp_store();
    let pool = ["a", "b", "c", "d"];
    let mut seed: u32 = 7;

    for _ in 0..200 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let pick = |shift: u32| pool[((seed >> shift) as usize) % pool.len()];
        let result = match (seed >> 8) % 3 {
            0 => store.add(pick(12), "x").map(|_| ()),
            1 => store.rename(pick(12), pick(20)),
            _ => store.delete(pick(12)).map(|_| ()),
        };
        match result {
            Ok(()) | Err(StoreError::DuplicateTitle(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }

        let unique = store
            .notes()
            .iter()
            .map(|note| note.title())
            .collect::<HashSet<_>>();
        assert_eq!(unique.len(), store.len());
    }
}

/// Backing file whose writes can be switched to fail; handles are shared
/// with the test so it can flip failures and count writes.
#[derive(Clone)]
struct FlakyFile {
    path: PathBuf,
    fail_writes: Rc<Cell<bool>>,
    writes: Rc<Cell<usize>>,
}

impl FlakyFile {
    fn new() -> Self {
        Self {
            path: PathBuf::from("flaky/notes.json"),
            fail_writes: Rc::new(Cell::new(false)),
            writes: Rc::new(Cell::new(0)),
        }
    }
}

impl NoteFile for FlakyFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read_contents(&self) -> RepoResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn write_contents(&self, _bytes: &[u8]) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::Io {
                path: self.path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }

    fn write_backup(&self, _bytes: &[u8]) -> RepoResult<PathBuf> {
        Ok(PathBuf::from("flaky/notes.json.backup"))
    }
}

#[test]
fn persistence_failure_keeps_in_memory_mutation() {
    let file = FlakyFile::new();
    let mut store = NoteStore::with_file(file.clone());
    store.add("saved", "ok").unwrap();

    file.fail_writes.set(true);
    let err = store.add("draft", "unsaved").unwrap_err();
    assert!(matches!(err, StoreError::Persistence(RepoError::Io { .. })));
    assert!(store.contains("draft"));

    let err = store.update_content("draft", "edited").unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert_eq!(store.get("draft").unwrap().content(), "edited");

    let err = store.delete("saved").unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));
    assert_eq!(titles(&store), vec!["draft"]);

    file.fail_writes.set(false);
    store.persist().unwrap();
    assert_eq!(file.writes.get(), 2);
}

#[test]
fn every_effective_mutation_writes_once_and_noops_never_write() {
    let file = FlakyFile::new();
    let mut store = NoteStore::with_file(file.clone());

    store.add("a", "").unwrap();
    store.update_content("a", "1").unwrap();
    store.rename("a", "b").unwrap();
    assert_eq!(file.writes.get(), 3);

    store.rename("missing", "c").unwrap();
    store.rename("b", "b").unwrap();
    store.update_content("missing", "x").unwrap();
    store.delete("missing").unwrap();
    let _ = store.add("b", "dup");
    assert_eq!(file.writes.get(), 3);

    store.delete("b").unwrap();
    assert_eq!(file.writes.get(), 4);
    assert!(store.is_empty());
}
