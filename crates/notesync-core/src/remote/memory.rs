//! In-memory notes server used by engine and service tests.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{in_category, NotePayload, RemoteError, RemoteNote, RemoteNotes, RemoteResult};

#[derive(Default)]
pub struct MemoryRemote {
    notes: Mutex<BTreeMap<String, RemoteNote>>,
    next_id: AtomicU64,
    fail_list: AtomicBool,
    fail_push: AtomicBool,
    failing_gets: Mutex<BTreeSet<String>>,
    pub pushes: Mutex<Vec<NotePayload>>,
    pub deletes: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Make the next assigned id `id`.
    pub fn with_next_id(self, id: u64) -> Self {
        self.next_id.store(id, Ordering::SeqCst);
        self
    }

    pub fn insert(&self, id: &str, content: &str, modified: i64) {
        let note = RemoteNote {
            id: id.to_string(),
            title: content.lines().next().unwrap_or("").to_string(),
            content: Some(content.to_string()),
            category: String::new(),
            favorite: false,
            modified,
            etag: None,
        };
        self.lock().insert(id.to_string(), note);
    }

    pub fn set_category(&self, id: &str, category: &str) {
        if let Some(note) = self.lock().get_mut(id) {
            note.category = category.to_string();
        }
    }

    pub fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    pub fn get(&self, id: &str) -> Option<RemoteNote> {
        self.lock().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_push(&self, fail: bool) {
        self.fail_push.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get(&self, id: &str) {
        self.failing_gets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string());
    }

    pub fn pushed(&self) -> Vec<NotePayload> {
        self.pushes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, RemoteNote>> {
        self.notes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteNotes for MemoryRemote {
    async fn list_notes(&self, category: Option<&str>) -> RemoteResult<Vec<RemoteNote>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(RemoteError::Connection("list refused".to_string()));
        }
        Ok(self
            .lock()
            .values()
            .filter(|note| in_category(note, category))
            .map(|note| RemoteNote {
                content: None,
                ..note.clone()
            })
            .collect())
    }

    async fn get_note(&self, id: &str) -> RemoteResult<RemoteNote> {
        let failing = self
            .failing_gets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id);
        if failing {
            return Err(RemoteError::Request(format!("get {id} refused")));
        }
        self.get(id)
            .ok_or_else(|| RemoteError::Request(format!("HTTP 404 for {id}")))
    }

    async fn update_note(&self, payload: &NotePayload) -> RemoteResult<RemoteNote> {
        self.pushes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payload.clone());
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(RemoteError::Connection("push refused".to_string()));
        }

        let mut notes = self.lock();
        let id = payload.id.clone().unwrap_or_else(|| {
            self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
        });
        let note = notes.entry(id.clone()).or_insert_with(|| RemoteNote {
            id,
            title: String::new(),
            content: Some(String::new()),
            category: String::new(),
            favorite: false,
            modified: 0,
            etag: None,
        });
        if let Some(content) = &payload.content {
            note.title = content.lines().next().unwrap_or("").to_string();
            note.content = Some(content.clone());
        }
        if let Some(category) = &payload.category {
            note.category.clone_from(category);
        }
        if let Some(favorite) = payload.favorite {
            note.favorite = favorite;
        }
        note.modified = payload.modified;
        Ok(note.clone())
    }

    async fn delete_note(&self, id: &str) -> RemoteResult<()> {
        self.deletes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id.to_string());
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(RemoteError::Connection("delete refused".to_string()));
        }
        self.lock().remove(id);
        Ok(())
    }
}
