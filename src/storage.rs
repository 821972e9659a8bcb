use crate::board_core::{Note, NoteStore};
use leptos::logging::warn;
use leptos::prelude::window;
use std::fmt;
use wasm_bindgen::JsValue;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageError {
    Unavailable,
    Read(String),
    Write(String),
    Decode(String),
    Encode(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable => write!(f, "local storage is unavailable"),
            StorageError::Read(msg) => write!(f, "failed to read notes: {msg}"),
            StorageError::Write(msg) => write!(f, "failed to write notes: {msg}"),
            StorageError::Decode(msg) => write!(f, "stored notes are malformed: {msg}"),
            StorageError::Encode(msg) => write!(f, "failed to encode notes: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// `window.localStorage`, looked up on every call so a storage that becomes
/// available later (or goes away) is picked up.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    fn local_storage() -> Result<leptos::web_sys::Storage, StorageError> {
        window()
            .local_storage()
            .ok()
            .flatten()
            .ok_or(StorageError::Unavailable)
    }
}

impl KeyValueStore for BrowserStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Self::local_storage()?
            .get_item(key)
            .map_err(|e| StorageError::Read(js_error_message(&e)))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::local_storage()?
            .set_item(key, value)
            .map_err(|e| StorageError::Write(js_error_message(&e)))
    }
}

fn js_error_message(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

pub fn encode_notes(store: &NoteStore) -> Result<String, StorageError> {
    serde_json::to_string(store.notes()).map_err(|e| StorageError::Encode(e.to_string()))
}

pub fn decode_notes(raw: &str) -> Result<Vec<Note>, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Decode(e.to_string()))
}

/// Mirrors the board to one storage key.
pub struct NotePersistence<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> NotePersistence<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Never fails: anything that cannot be read or parsed starts an empty board.
    pub fn load(&self) -> NoteStore {
        match self.try_load() {
            Ok(store) => store,
            Err(err) => {
                warn!("{err}; starting with an empty board ({})", self.key);
                NoteStore::new()
            }
        }
    }

    fn try_load(&self) -> Result<NoteStore, StorageError> {
        let Some(raw) = self.store.read(&self.key)? else {
            return Ok(NoteStore::new());
        };
        let (store, report) = NoteStore::from_notes(decode_notes(&raw)?);
        if !report.is_clean() {
            warn!(
                "repaired stored notes: {} duplicate ids dropped, {} undersized, {} bad colors",
                report.duplicate_ids, report.undersized, report.bad_colors
            );
        }
        Ok(store)
    }

    pub fn save(&self, notes: &NoteStore) -> Result<(), StorageError> {
        let json = encode_notes(notes)?;
        self.store.write(&self.key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board_core::tests::ScriptedEntropy;
    use crate::board_core::{Point, Size, Viewport};
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryStorage {
        items: RefCell<HashMap<String, String>>,
    }

    impl MemoryStorage {
        fn with(key: &str, value: &str) -> Self {
            let storage = Self::default();
            storage.items.borrow_mut().insert(key.to_string(), value.to_string());
            storage
        }
    }

    impl KeyValueStore for MemoryStorage {
        fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.items.borrow().get(key).cloned())
        }

        fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.items.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    impl KeyValueStore for &MemoryStorage {
        fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            (**self).read(key)
        }

        fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
            (**self).write(key, value)
        }
    }

    struct BrokenStorage;

    impl KeyValueStore for BrokenStorage {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable)
        }

        fn write(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Write("QuotaExceededError".to_string()))
        }
    }

    fn sample_board() -> NoteStore {
        let viewport = Viewport {
            width: 1024.0,
            height: 768.0,
        };
        let (store, a) = NoteStore::new().create(viewport, &mut ScriptedEntropy::new(0, &[0.25, 0.5, 0.3]));
        let (store, b) = store.create(viewport, &mut ScriptedEntropy::new(1_700_000_000_123, &[0.75, 0.125, 0.7]));
        let store = store.update_text(a, "buy milk\nand \"eggs\"").unwrap();
        let store = store.move_to(b, Point::new(-12.5, 4000.25)).unwrap();
        store.resize(b, Size::new(333.0, 201.5)).unwrap()
    }

    #[test]
    fn reload_reproduces_saved_board() {
        let persistence = NotePersistence::new(MemoryStorage::default(), "sticky-notes");
        let board = sample_board();
        persistence.save(&board).unwrap();

        assert_eq!(persistence.load(), board);
    }

    #[test]
    fn reads_legacy_documents() {
        let raw = r##"[{"id":1712345678901,"text":"hi","position":{"x":12.3,"y":45},"color":"#ff7eb9","size":{"width":200,"height":260}}]"##;
        let persistence = NotePersistence::new(MemoryStorage::with("sticky-notes", raw), "sticky-notes");
        let board = persistence.load();

        assert_eq!(board.ids(), vec![1712345678901]);
        let note = board.get(1712345678901).unwrap();
        assert_eq!(note.position, Point::new(12.3, 45.0));
        assert_eq!(note.size, Size::new(200.0, 260.0));
    }

    #[test]
    fn missing_or_malformed_data_loads_empty() {
        let empty = NotePersistence::new(MemoryStorage::default(), "sticky-notes");
        assert!(empty.load().is_empty());

        for raw in ["{not json", "{\"id\":1}", "[{\"id\":\"x\"}]", ""] {
            let persistence = NotePersistence::new(MemoryStorage::with("sticky-notes", raw), "sticky-notes");
            assert!(persistence.load().is_empty(), "{raw}");
        }

        assert!(NotePersistence::new(BrokenStorage, "sticky-notes").load().is_empty());
    }

    #[test]
    fn creates_unique_notes_after_loading_maximum_id() {
        let raw = r##"[{"id":18446744073709551615,"text":"","position":{"x":0,"y":0},"color":"#ffd700","size":{"width":200,"height":200}}]"##;
        let board = NotePersistence::new(MemoryStorage::with("sticky-notes", raw), "sticky-notes").load();
        assert_eq!(board.ids(), vec![u64::MAX]);

        let viewport = Viewport {
            width: 800.0,
            height: 600.0,
        };
        let (board, a) = board.create(viewport, &mut ScriptedEntropy::new(5, &[]));
        let (board, b) = board.create(viewport, &mut ScriptedEntropy::new(5, &[]));
        assert_ne!(a, b);
        assert_eq!(board.ids(), vec![u64::MAX, 0, 1]);
    }

    #[test]
    fn boards_are_isolated_by_key() {
        let storage = MemoryStorage::default();
        NotePersistence::new(&storage, "sticky-notes:work").save(&sample_board()).unwrap();

        assert!(NotePersistence::new(&storage, "sticky-notes").load().is_empty());
        assert_eq!(NotePersistence::new(&storage, "sticky-notes:work").load().len(), 2);
    }

    #[test]
    fn surfaces_write_failures() {
        let persistence = NotePersistence::new(BrokenStorage, "sticky-notes");
        let err = persistence.save(&sample_board()).unwrap_err();
        assert_eq!(err, StorageError::Write("QuotaExceededError".to_string()));
        assert_eq!(err.to_string(), "failed to write notes: QuotaExceededError");
    }
}
