//! Local note store: one pretty-printed `<key>.json` file per note.

mod atomic;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::Note;
use crate::util::{generate_random_key, is_valid_key, unix_timestamp_now};

const NOTE_FILE_EXTENSION: &str = "json";

/// Store handle shared by the sync engine and user-facing mutations
pub type SharedStore = Arc<Mutex<LocalStore>>;

/// Lock the shared store. Never hold the guard across an `.await`.
pub fn lock_store(store: &SharedStore) -> MutexGuard<'_, LocalStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process collection of notes backed by a directory of JSON files
#[derive(Debug)]
pub struct LocalStore {
    dir: PathBuf,
    notes: BTreeMap<String, Note>,
    created: bool,
}

impl LocalStore {
    /// Open the store at `dir`, creating the directory when missing, and
    /// load every note file in it.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let created = !dir.exists();
        if created {
            std::fs::create_dir_all(&dir).map_err(|error| Error::Read {
                path: dir.clone(),
                message: error.to_string(),
            })?;
            tracing::info!("Created note database at {}", dir.display());
        }

        let mut store = Self {
            dir,
            notes: BTreeMap::new(),
            created,
        };
        store.load()?;
        Ok(store)
    }

    /// Whether `open` had to create the store directory.
    pub const fn was_created(&self) -> bool {
        self.created
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replace the in-memory map with the notes on disk.
    ///
    /// Any unreadable or unparsable file aborts the load with
    /// [`Error::Read`]; partial corruption is never skipped.
    pub fn load(&mut self) -> Result<()> {
        let now = unix_timestamp_now();
        let read_error = |path: &Path, error: &dyn std::fmt::Display| Error::Read {
            path: path.to_path_buf(),
            message: error.to_string(),
        };

        let mut notes = BTreeMap::new();
        let entries = std::fs::read_dir(&self.dir).map_err(|error| read_error(&self.dir, &error))?;
        for entry in entries {
            let path = entry.map_err(|error| read_error(&self.dir, &error))?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(NOTE_FILE_EXTENSION)
            {
                continue;
            }

            let raw = std::fs::read_to_string(&path).map_err(|error| read_error(&path, &error))?;
            let mut note: Note =
                serde_json::from_str(&raw).map_err(|error| read_error(&path, &error))?;

            if note.local_key.is_empty() {
                note.local_key = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or_default()
                    .to_string();
            }
            // Just read, so memory and disk agree right now.
            note.savedate = now;
            notes.insert(note.local_key.clone(), note);
        }

        tracing::debug!("Loaded {} notes from {}", notes.len(), self.dir.display());
        self.notes = notes;
        Ok(())
    }

    /// Create a new local-only note and return its key.
    pub fn create(&mut self, content: &str) -> String {
        let key = self.unique_key();
        let note = Note::new(key.clone(), content, unix_timestamp_now());
        self.notes.insert(key.clone(), note);
        key
    }

    /// Import an externally supplied note (e.g. from an export).
    ///
    /// The payload is validated before anything is inserted.
    pub fn import(&mut self, payload: &Value) -> Result<String> {
        let now = unix_timestamp_now();
        let note = parse_import(payload, now)?;
        let key = self.unique_key();
        self.notes.insert(
            key.clone(),
            Note {
                local_key: key.clone(),
                ..note
            },
        );
        Ok(key)
    }

    /// Import a batch of notes. Nothing is inserted unless every payload is valid.
    pub fn import_all(&mut self, payloads: &[Value]) -> Result<Vec<String>> {
        let now = unix_timestamp_now();
        let notes = payloads
            .iter()
            .map(|payload| parse_import(payload, now))
            .collect::<Result<Vec<Note>>>()?;

        Ok(notes
            .into_iter()
            .map(|note| {
                let key = self.unique_key();
                self.notes.insert(
                    key.clone(),
                    Note {
                        local_key: key.clone(),
                        ..note
                    },
                );
                key
            })
            .collect())
    }

    pub fn get(&self, key: &str) -> Result<&Note> {
        self.notes
            .get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    pub fn get_mut(&mut self, key: &str) -> Result<&mut Note> {
        self.notes
            .get_mut(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.notes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    pub fn set_content(&mut self, key: &str, content: &str) -> Result<bool> {
        let changed = self.get_mut(key)?.set_content(content, unix_timestamp_now());
        if changed {
            tracing::info!(key, "Note content updated");
        }
        Ok(changed)
    }

    pub fn set_category(&mut self, key: &str, category: &str) -> Result<bool> {
        let changed = self
            .get_mut(key)?
            .set_category(category, unix_timestamp_now());
        if changed {
            tracing::info!(key, "Note category updated");
        }
        Ok(changed)
    }

    pub fn set_favorite(&mut self, key: &str, favorite: bool) -> Result<bool> {
        let changed = self
            .get_mut(key)?
            .set_favorite(favorite, unix_timestamp_now());
        if changed {
            tracing::info!(
                key,
                "Note {}",
                if favorite { "favorited" } else { "unfavorited" }
            );
        }
        Ok(changed)
    }

    pub fn set_deleted(&mut self, key: &str, deleted: bool) -> Result<bool> {
        let changed = self
            .get_mut(key)?
            .set_deleted(deleted, unix_timestamp_now());
        if changed {
            tracing::info!(key, "Note marked for deletion");
        }
        Ok(changed)
    }

    /// Insert or replace a note under its own `local_key`.
    pub(crate) fn insert(&mut self, note: Note) {
        self.notes.insert(note.local_key.clone(), note);
    }

    /// Drop a note from memory; its file is left alone.
    pub(crate) fn remove(&mut self, key: &str) -> Option<Note> {
        self.notes.remove(key)
    }

    /// Write the note to `<key>.json` and record the save time.
    ///
    /// On failure the in-memory note is untouched and stays unsaved.
    pub fn persist(&mut self, key: &str) -> Result<()> {
        let path = self.note_path(key)?;
        let note = self.get_mut(key)?;
        let write_error = |error: &dyn std::fmt::Display| Error::Write {
            key: key.to_string(),
            message: error.to_string(),
        };

        let serialized = serde_json::to_string_pretty(&*note).map_err(|error| write_error(&error))?;
        atomic::write_atomic(&path, serialized.as_bytes()).map_err(|error| write_error(&error))?;
        note.savedate = unix_timestamp_now();
        Ok(())
    }

    /// Delete the backing file for `key`; missing files are fine.
    pub fn remove_file(&self, key: &str) -> Result<()> {
        let path = self.note_path(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(Error::Write {
                key: key.to_string(),
                message: error.to_string(),
            }),
        }
    }

    /// True when every note's latest change has reached the disk.
    pub fn verify_all_persisted(&self) -> bool {
        self.notes.values().all(Note::is_persisted)
    }

    pub fn note_path(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_key(key) {
            return Err(Error::Validation(format!("invalid note key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.{NOTE_FILE_EXTENSION}")))
    }

    fn unique_key(&self) -> String {
        loop {
            let key = generate_random_key();
            if !self.notes.contains_key(&key) {
                return key;
            }
        }
    }
}

fn parse_import(payload: &Value, now: i64) -> Result<Note> {
    let Some(object) = payload.as_object() else {
        return Err(Error::Validation("note must be a JSON object".to_string()));
    };

    let content = match object.get("content") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(content)) => content.clone(),
        Some(_) => return Err(Error::Validation("\"content\" must be a string".to_string())),
    };

    let modified = match object.get("modified") {
        None | Some(Value::Null) => now,
        Some(value) => parse_timestamp(value)?,
    };
    if !(0..=now).contains(&modified) {
        return Err(Error::Validation(
            "\"modified\" must be a timestamp between 0 and now".to_string(),
        ));
    }

    let category = match object.get("category") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(category)) => category.clone(),
        Some(_) => return Err(Error::Validation("\"category\" must be a string".to_string())),
    };

    let favorite = match object.get("favorite") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(favorite)) => *favorite,
        Some(_) => return Err(Error::Validation("\"favorite\" must be a boolean".to_string())),
    };

    let mut note = Note::new(String::new(), content, modified);
    if let Some(Value::String(title)) = object.get("title") {
        if !title.is_empty() {
            note.title.clone_from(title);
        }
    }
    note.category = category;
    note.favorite = favorite;
    Ok(note)
}

#[allow(clippy::cast_possible_truncation)] // seconds fit comfortably in i64
fn parse_timestamp(value: &Value) -> Result<i64> {
    let invalid = || {
        Error::Validation(
            "\"modified\" must be a number or a string representation of a number".to_string(),
        )
    };
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .ok_or_else(invalid),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|float| float.is_finite())
            .map(|float| float as i64)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn setup() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("notes")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_creates_missing_directory() {
        let (dir, store) = setup();
        assert!(store.was_created());
        assert!(dir.path().join("notes").is_dir());
        assert!(store.is_empty());

        let reopened = LocalStore::open(dir.path().join("notes")).unwrap();
        assert!(!reopened.was_created());
    }

    #[test]
    fn test_create_and_get() {
        let (_dir, mut store) = setup();
        let key = store.create("title\n\nbody");
        let note = store.get(&key).unwrap();
        assert_eq!(note.local_key, key);
        assert_eq!(note.title, "title");
        assert_eq!(note.savedate, 0);
        assert_eq!(note.syncdate, 0);
        assert!(!note.deleted);
    }

    #[test]
    fn test_get_unknown_key_is_not_found() {
        let (_dir, store) = setup();
        assert!(matches!(store.get("missing"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_persist_and_load_round_trip() {
        let (dir, mut store) = setup();
        let key = store.create("title\n\nbody");
        store.persist(&key).unwrap();
        assert!(store.get(&key).unwrap().is_persisted());
        assert!(store.verify_all_persisted());

        let reloaded = LocalStore::open(dir.path().join("notes")).unwrap();
        let note = reloaded.get(&key).unwrap();
        assert_eq!(note.content, "title\n\nbody");
        assert_eq!(note.category, "");
        assert!(!note.favorite);
        assert!(!note.deleted);
    }

    #[test]
    fn test_load_takes_key_from_file_name() {
        let (dir, _store) = setup();
        let path = dir.path().join("notes").join("17.json");
        std::fs::write(&path, r#"{"content": "legacy", "modified": 10}"#).unwrap();

        let reloaded = LocalStore::open(dir.path().join("notes")).unwrap();
        assert_eq!(reloaded.get("17").unwrap().content, "legacy");
    }

    #[test]
    fn test_load_rejects_corrupt_file() {
        let (dir, _store) = setup();
        std::fs::write(dir.path().join("notes").join("bad.json"), "{ not json").unwrap();

        let error = LocalStore::open(dir.path().join("notes")).unwrap_err();
        assert!(matches!(error, Error::Read { .. }));
        assert!(error.to_string().contains("bad.json"));
    }

    #[test]
    fn test_load_ignores_other_files() {
        let (dir, _store) = setup();
        std::fs::write(dir.path().join("notes").join("README.txt"), "hi").unwrap();
        let reloaded = LocalStore::open(dir.path().join("notes")).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_setters_mark_modified() {
        let (_dir, mut store) = setup();
        let key = store.create("a");
        store.persist(&key).unwrap();

        assert!(store.set_category(&key, "work").unwrap());
        assert!(!store.set_category(&key, "work").unwrap());
        assert!(store.set_favorite(&key, true).unwrap());
        assert!(store.set_deleted(&key, true).unwrap());
        assert!(store.set_content(&key, "b").unwrap());

        let note = store.get(&key).unwrap();
        assert_eq!(note.dirty_fields.iter().count(), 4);
        assert!(matches!(
            store.set_content("missing", "x"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_file_is_idempotent() {
        let (dir, mut store) = setup();
        let key = store.create("a");
        store.persist(&key).unwrap();
        let path = dir.path().join("notes").join(format!("{key}.json"));
        assert!(path.exists());

        store.remove_file(&key).unwrap();
        assert!(!path.exists());
        store.remove_file(&key).unwrap();
    }

    #[test]
    fn test_persist_failure_keeps_note_unsaved() {
        let (dir, mut store) = setup();
        let key = store.create("a");
        std::fs::remove_dir_all(dir.path().join("notes")).unwrap();
        // A plain file where the directory used to be makes writes fail.
        std::fs::write(dir.path().join("notes"), "").unwrap();

        let error = store.persist(&key).unwrap_err();
        assert!(matches!(error, Error::Write { .. }));
        assert_eq!(store.get(&key).unwrap().savedate, 0);
        assert!(!store.verify_all_persisted());
    }

    #[test]
    fn test_import_accepts_export_shape() {
        let (_dir, mut store) = setup();
        let key = store
            .import(&json!({
                "content": "imported\nbody",
                "modified": 1_000,
                "category": "work",
                "favorite": true,
                "title": "Imported"
            }))
            .unwrap();

        let note = store.get(&key).unwrap();
        assert_eq!(note.content, "imported\nbody");
        assert_eq!(note.modified, 1_000);
        assert_eq!(note.category, "work");
        assert!(note.favorite);
        assert_eq!(note.title, "Imported");
        assert_eq!(note.remote_id, None);
    }

    #[test]
    fn test_import_accepts_numeric_string_dates() {
        let (_dir, mut store) = setup();
        let key = store
            .import(&json!({"content": "x", "modified": "1500.5", "category": null}))
            .unwrap();
        assert_eq!(store.get(&key).unwrap().modified, 1_500);
    }

    #[test]
    fn test_import_rejects_bad_payloads() {
        let (_dir, mut store) = setup();
        let future = unix_timestamp_now() + 3_600;
        let bad = [
            json!({"content": 123}),
            json!({"content": "x", "modified": -1}),
            json!({"content": "x", "modified": future}),
            json!({"content": "x", "modified": "soon"}),
            json!({"content": "x", "category": 5}),
            json!({"content": "x", "favorite": "yes"}),
            json!(["not", "an", "object"]),
        ];

        for payload in &bad {
            let error = store.import(payload).unwrap_err();
            assert!(matches!(error, Error::Validation(_)), "{payload}");
        }
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_import_all_is_all_or_nothing() {
        let (_dir, mut store) = setup();
        let batch = vec![json!({"content": "good"}), json!({"favorite": "yes"})];
        assert!(store.import_all(&batch).is_err());
        assert!(store.is_empty());

        let keys = store
            .import_all(&[json!({"content": "one"}), json!({"content": "two"})])
            .unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(store.get(&keys[1]).unwrap().content, "two");
    }

    #[test]
    fn test_note_path_rejects_unsafe_keys() {
        let (_dir, store) = setup();
        assert!(store.note_path("../escape").is_err());
        assert!(store.note_path("42").is_ok());
    }
}
