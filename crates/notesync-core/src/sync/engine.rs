//! One sync pass: push, index, pull, prune, persist.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::SyncReport;
use crate::models::{DirtyField, Note};
use crate::remote::{NotePayload, RemoteError, RemoteNote, RemoteNotes};
use crate::store::{lock_store, SharedStore};
use crate::util::{is_valid_key, unix_timestamp_now};

/// Invoked once after a pass that updated or removed local notes
pub type ViewCallback = Arc<dyn Fn() + Send + Sync>;

/// Runs sync passes for one store against one server.
///
/// Callers serialize passes by wrapping the engine in an async mutex;
/// see [`super::SyncScheduler`].
pub struct SyncEngine<R> {
    store: SharedStore,
    remote: R,
    last_sync: i64,
    update_view: Option<ViewCallback>,
}

#[derive(Default)]
struct PassState {
    started_at: i64,
    errors: usize,
    local_updates: BTreeSet<String>,
    local_deletes: BTreeSet<String>,
    rekeyed: Vec<(String, String)>,
}

impl PassState {
    fn queue_update(&mut self, key: &str) {
        self.local_updates.insert(key.to_string());
    }

    fn queue_delete(&mut self, key: &str) {
        self.local_updates.remove(key);
        self.local_deletes.insert(key.to_string());
    }
}

impl<R: RemoteNotes> SyncEngine<R> {
    pub fn new(store: SharedStore, remote: R) -> Self {
        Self {
            store,
            remote,
            last_sync: 0,
            update_view: None,
        }
    }

    /// Start time of the last pass that finished without sync errors
    pub const fn last_sync(&self) -> i64 {
        self.last_sync
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn set_update_view(&mut self, callback: ViewCallback) {
        self.update_view = Some(callback);
    }

    /// Run one sync pass.
    ///
    /// With `server_sync` false only pending local writes are flushed.
    /// With `full_sync` true, notes missing from a successfully fetched
    /// server index are removed locally.
    pub async fn sync_notes(&mut self, server_sync: bool, full_sync: bool) -> SyncReport {
        let mut pass = PassState {
            started_at: unix_timestamp_now(),
            ..PassState::default()
        };
        if server_sync && full_sync {
            info!("Starting full sync");
        }

        self.push_local_changes(&mut pass, server_sync).await;

        let index = if server_sync {
            match self.remote.list_notes(None).await {
                Ok(index) => Some(index),
                Err(error) => {
                    error!(%error, "Failed to fetch the note index from the server");
                    pass.errors += 1;
                    None
                }
            }
        } else {
            None
        };

        if let Some(index) = &index {
            self.pull_remote_changes(&mut pass, index).await;
            if full_sync {
                self.prune_deleted(&mut pass, index);
            }
        }

        let report = self.persist_changes(pass, server_sync, full_sync);

        if report.errors == 0 {
            self.last_sync = report.started_at;
        }
        if report.changed() {
            if let Some(callback) = &self.update_view {
                callback();
            }
        }
        if server_sync && full_sync {
            info!(
                errors = report.errors,
                write_errors = report.write_errors,
                "Full sync completed"
            );
        }
        report
    }

    async fn push_local_changes(&self, pass: &mut PassState, server_sync: bool) {
        let pending: Vec<Note> = {
            let store = lock_store(&self.store);
            let mut pending = Vec::new();
            for note in store.notes() {
                if note.needs_save() {
                    pass.queue_update(&note.local_key);
                }
                if server_sync && note.needs_sync() {
                    pending.push(note.clone());
                }
            }
            pending
        };

        for snapshot in pending {
            if snapshot.deleted {
                self.push_delete(pass, &snapshot).await;
            } else {
                self.push_update(pass, &snapshot).await;
            }
        }
    }

    async fn push_delete(&self, pass: &mut PassState, snapshot: &Note) {
        let key = snapshot.local_key.as_str();
        let Some(remote_id) = snapshot.remote_id.as_deref() else {
            self.forget_deleted(pass, key);
            info!(key, "Discarded deleted note that never reached the server");
            return;
        };

        match self.remote.delete_note(remote_id).await {
            Ok(()) => {
                self.forget_deleted(pass, key);
                info!(key, "Deleted note from server");
            }
            Err(error) => {
                warn!(key, %error, "Failed to delete note on server");
                pass.errors += 1;
            }
        }
    }

    fn forget_deleted(&self, pass: &mut PassState, key: &str) {
        let mut store = lock_store(&self.store);
        let still_deleted = store.get(key).is_ok_and(|note| note.deleted);
        if still_deleted {
            store.remove(key);
            pass.queue_delete(key);
        } else if let Ok(note) = store.get_mut(key) {
            // Restored while the delete was in flight: upload it as a new note.
            note.remote_id = None;
            pass.queue_update(key);
        }
    }

    async fn push_update(&self, pass: &mut PassState, snapshot: &Note) {
        let key = snapshot.local_key.as_str();
        let payload = build_payload(snapshot);

        let remote = match self.remote.update_note(&payload).await {
            Ok(remote) if is_valid_key(&remote.id) => remote,
            Ok(remote) => {
                let error = RemoteError::MalformedResponse(format!("invalid note id {:?}", remote.id));
                warn!(key, %error, "Failed to push note to server");
                pass.errors += 1;
                return;
            }
            Err(error) => {
                warn!(key, %error, "Failed to push note to server");
                pass.errors += 1;
                return;
            }
        };

        let mut store = lock_store(&self.store);
        let Some(mut note) = store.remove(key) else {
            return;
        };
        if note.modified == snapshot.modified {
            note.merge_remote(&remote, pass.started_at);
        } else {
            // Edited during the push: adopt the server id, keep local changes for the next pass.
            note.local_key.clone_from(&remote.id);
            note.remote_id = Some(remote.id.clone());
            if remote.etag.is_some() {
                note.etag.clone_from(&remote.etag);
            }
        }
        let new_key = note.local_key.clone();
        store.insert(note);
        drop(store);

        if new_key != key {
            pass.queue_delete(key);
            pass.rekeyed.push((key.to_string(), new_key.clone()));
        }
        pass.queue_update(&new_key);
        info!(key, remote_id = %new_key, "Synced note to server");
    }

    async fn pull_remote_changes(&self, pass: &mut PassState, index: &[RemoteNote]) {
        for entry in index {
            if !is_valid_key(&entry.id) {
                warn!(id = %entry.id, "Ignoring server note with an invalid id");
                pass.errors += 1;
                continue;
            }

            let local_modified = {
                let store = lock_store(&self.store);
                store.get(&entry.id).ok().map(|note| note.modified)
            };
            if local_modified.is_some_and(|modified| entry.modified <= modified) {
                continue;
            }

            let full = match self.remote.get_note(&entry.id).await {
                Ok(full) => RemoteNote {
                    id: entry.id.clone(),
                    ..full
                },
                Err(error) => {
                    warn!(id = %entry.id, %error, "Failed to fetch note from server");
                    pass.errors += 1;
                    continue;
                }
            };

            let mut store = lock_store(&self.store);
            match store.get_mut(&entry.id) {
                Ok(note) if Some(note.modified) == local_modified => {
                    note.merge_remote(&full, pass.started_at);
                }
                Ok(_) => {
                    debug!(key = %entry.id, "Local edit during fetch wins over server copy");
                    continue;
                }
                Err(_) => store.insert(Note::from_remote(&full, pass.started_at)),
            }
            drop(store);

            pass.queue_update(&entry.id);
            info!(key = %entry.id, "Synced newer note from server");
        }
    }

    fn prune_deleted(&self, pass: &mut PassState, index: &[RemoteNote]) {
        let server_ids: HashSet<&str> = index.iter().map(|entry| entry.id.as_str()).collect();
        let mut store = lock_store(&self.store);
        let doomed: Vec<String> = store
            .notes()
            .filter(|note| {
                note.remote_id
                    .as_deref()
                    .is_some_and(|id| !server_ids.contains(id))
            })
            .map(|note| note.local_key.clone())
            .collect();

        for key in doomed {
            store.remove(&key);
            pass.queue_delete(&key);
            info!(key, "Removed note deleted on server");
        }
    }

    fn persist_changes(&self, pass: PassState, server_sync: bool, full_sync: bool) -> SyncReport {
        let mut report = SyncReport {
            started_at: pass.started_at,
            server_sync,
            full_sync,
            errors: pass.errors,
            rekeyed: pass.rekeyed,
            ..SyncReport::default()
        };
        let mut store = lock_store(&self.store);

        for key in pass.local_updates {
            if !store.contains(&key) {
                continue;
            }
            match store.persist(&key) {
                Ok(()) => debug!(key, "Saved note to disk"),
                Err(error) => {
                    error!(key, %error, "Failed to save note to disk");
                    report.write_errors += 1;
                }
            }
            report.updated.push(key);
        }

        for key in pass.local_deletes {
            if store.contains(&key) {
                continue;
            }
            match store.remove_file(&key) {
                Ok(()) => debug!(key, "Removed note file"),
                Err(error) => {
                    error!(key, %error, "Failed to remove note file");
                    report.write_errors += 1;
                }
            }
            report.removed.push(key);
        }

        report
    }
}

/// Build the request body for pushing `note`.
///
/// Notes the server has never seen, and notes without recorded dirty
/// fields, send every field. Otherwise only the dirty fields plus
/// `modified` are sent.
#[must_use]
pub fn build_payload(note: &Note) -> NotePayload {
    let send_all = note.remote_id.is_none() || note.dirty_fields.is_empty();
    let include = |field| send_all || note.dirty_fields.contains(field);

    NotePayload {
        id: note.remote_id.clone(),
        content: include(DirtyField::Content).then(|| note.content.clone()),
        category: include(DirtyField::Category).then(|| note.category.clone()),
        favorite: include(DirtyField::Favorite).then_some(note.favorite),
        modified: note.modified,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::remote::memory::MemoryRemote;
    use crate::remote::RemoteResult;
    use crate::store::LocalStore;

    fn setup(remote: MemoryRemote) -> (tempfile::TempDir, SharedStore, SyncEngine<MemoryRemote>) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("notes")).unwrap();
        let store: SharedStore = Arc::new(Mutex::new(store));
        let engine = SyncEngine::new(Arc::clone(&store), remote);
        (dir, store, engine)
    }

    /// A note that was synced and saved at `modified`.
    fn synced_note(id: &str, content: &str, modified: i64) -> Note {
        let mut note = Note::new(id, content, modified);
        note.remote_id = Some(id.to_string());
        note.syncdate = modified;
        note.savedate = modified;
        note
    }

    #[tokio::test]
    async fn test_new_note_is_rekeyed_to_server_id() {
        let (_dir, store, mut engine) = setup(MemoryRemote::new().with_next_id(42));
        {
            let mut store = lock_store(&store);
            store.insert(Note::new("abc", "Shopping\neggs", 10));
            store.persist("abc").unwrap();
        }
        let old_path = lock_store(&store).note_path("abc").unwrap();
        assert!(old_path.exists());

        let report = engine.sync_notes(true, false).await;
        assert!(report.is_clean());

        let store = lock_store(&store);
        assert!(!store.contains("abc"));
        let note = store.get("42").unwrap();
        assert_eq!(note.remote_id.as_deref(), Some("42"));
        assert_eq!(note.syncdate, report.started_at);
        assert!(note.is_persisted());
        assert!(!old_path.exists());
        assert!(store.note_path("42").unwrap().exists());
        assert_eq!(report.removed, vec!["abc".to_string()]);
        assert_eq!(report.resolve_key("abc"), "42");
        assert_eq!(engine.remote().get("42").unwrap().content.as_deref(), Some("Shopping\neggs"));
    }

    #[tokio::test]
    async fn test_second_pass_is_idempotent() {
        let (_dir, store, mut engine) = setup(MemoryRemote::new());
        lock_store(&store).create("hello");

        let first = engine.sync_notes(true, true).await;
        assert!(first.is_clean());
        let pushes = engine.remote().pushed().len();

        let second = engine.sync_notes(true, true).await;
        assert!(second.is_clean());
        assert!(second.updated.is_empty());
        assert!(second.removed.is_empty());
        assert_eq!(engine.remote().pushed().len(), pushes);
    }

    #[tokio::test]
    async fn test_first_push_sends_all_fields() {
        let (_dir, store, mut engine) = setup(MemoryRemote::new());
        {
            let mut store = lock_store(&store);
            let key = store.create("body");
            store.set_category(&key, "work").unwrap();
        }

        engine.sync_notes(true, false).await;

        let pushed = engine.remote().pushed();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].id, None);
        assert_eq!(pushed[0].content.as_deref(), Some("body"));
        assert_eq!(pushed[0].category.as_deref(), Some("work"));
        assert_eq!(pushed[0].favorite, Some(false));
    }

    #[test]
    fn test_payload_contains_only_dirty_fields() {
        let mut note = synced_note("7", "body", 100);
        note.set_favorite(true, 200);

        let payload = build_payload(&note);
        assert_eq!(payload.id.as_deref(), Some("7"));
        assert_eq!(payload.content, None);
        assert_eq!(payload.category, None);
        assert_eq!(payload.favorite, Some(true));
        assert_eq!(payload.modified, 200);
    }

    #[test]
    fn test_payload_without_dirty_fields_sends_everything() {
        let mut note = synced_note("7", "body", 100);
        note.modified = 200;

        let payload = build_payload(&note);
        assert_eq!(payload.content.as_deref(), Some("body"));
        assert_eq!(payload.category.as_deref(), Some(""));
        assert_eq!(payload.favorite, Some(false));
    }

    #[tokio::test]
    async fn test_failed_push_keeps_note_and_dirty_fields() {
        let remote = MemoryRemote::new();
        remote.set_fail_push(true);
        let (_dir, store, mut engine) = setup(remote);
        {
            let mut store = lock_store(&store);
            store.insert(synced_note("7", "old", 100));
            store.set_content("7", "new").unwrap();
        }

        let report = engine.sync_notes(true, false).await;
        assert_eq!(report.errors, 1);
        assert_eq!(engine.last_sync(), 0);

        let store = lock_store(&store);
        let note = store.get("7").unwrap();
        assert_eq!(note.content, "new");
        assert!(note.dirty_fields.contains(DirtyField::Content));
        assert!(note.needs_sync());
        assert!(note.is_persisted());
    }

    #[tokio::test]
    async fn test_index_failure_never_prunes() {
        let remote = MemoryRemote::new();
        remote.set_fail_list(true);
        let (_dir, store, mut engine) = setup(remote);
        lock_store(&store).insert(synced_note("5", "keep me", 100));

        let report = engine.sync_notes(true, true).await;
        assert_eq!(report.errors, 1);
        assert!(lock_store(&store).contains("5"));
    }

    #[tokio::test]
    async fn test_full_sync_prunes_notes_deleted_on_server() {
        let (_dir, store, mut engine) = setup(MemoryRemote::new());
        {
            let mut store = lock_store(&store);
            store.insert(synced_note("5", "gone upstream", 100));
            store.persist("5").unwrap();
        }
        let path = lock_store(&store).note_path("5").unwrap();

        let report = engine.sync_notes(true, true).await;
        assert!(report.is_clean());
        assert_eq!(report.removed, vec!["5".to_string()]);
        assert!(!lock_store(&store).contains("5"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_incremental_sync_does_not_prune() {
        let (_dir, store, mut engine) = setup(MemoryRemote::new());
        lock_store(&store).insert(synced_note("5", "still here", 100));

        engine.sync_notes(true, false).await;
        assert!(lock_store(&store).contains("5"));
    }

    #[tokio::test]
    async fn test_prune_spares_notes_never_pushed() {
        let remote = MemoryRemote::new();
        remote.set_fail_push(true);
        let (_dir, store, mut engine) = setup(remote);
        let key = lock_store(&store).create("unsent");

        engine.sync_notes(true, true).await;
        assert!(lock_store(&store).contains(&key));
    }

    #[tokio::test]
    async fn test_newer_server_note_wins() {
        let remote = MemoryRemote::new();
        remote.insert("7", "server body", 200);
        let (_dir, store, mut engine) = setup(remote);
        lock_store(&store).insert(synced_note("7", "local body", 100));

        let report = engine.sync_notes(true, false).await;
        assert!(report.is_clean());

        let store = lock_store(&store);
        let note = store.get("7").unwrap();
        assert_eq!(note.content, "server body");
        assert_eq!(note.modified, 200);
        assert_eq!(note.syncdate, report.started_at);
        assert!(note.is_persisted());
    }

    #[tokio::test]
    async fn test_older_server_note_is_not_fetched() {
        let remote = MemoryRemote::new();
        remote.insert("7", "server body", 100);
        remote.fail_get("7");
        let (_dir, store, mut engine) = setup(remote);
        lock_store(&store).insert(synced_note("7", "local body", 100));

        let report = engine.sync_notes(true, false).await;
        assert!(report.is_clean());
        assert_eq!(lock_store(&store).get("7").unwrap().content, "local body");
    }

    #[tokio::test]
    async fn test_pull_adds_unknown_notes_and_counts_fetch_errors() {
        let remote = MemoryRemote::new();
        remote.insert("1", "first", 100);
        remote.insert("2", "second", 100);
        remote.fail_get("1");
        let (_dir, store, mut engine) = setup(remote);

        let report = engine.sync_notes(true, false).await;
        assert_eq!(report.errors, 1);
        assert_eq!(report.updated, vec!["2".to_string()]);

        let store = lock_store(&store);
        assert!(!store.contains("1"));
        assert_eq!(store.get("2").unwrap().content, "second");
    }

    #[tokio::test]
    async fn test_deleted_note_is_removed_after_server_confirms() {
        let remote = MemoryRemote::new();
        remote.insert("9", "doomed", 100);
        let (_dir, store, mut engine) = setup(remote);
        {
            let mut store = lock_store(&store);
            store.insert(synced_note("9", "doomed", 100));
            store.persist("9").unwrap();
            store.set_deleted("9", true).unwrap();
        }

        let report = engine.sync_notes(true, false).await;
        assert!(report.is_clean());
        assert_eq!(engine.remote().len(), 0);
        assert!(!lock_store(&store).contains("9"));
        assert_eq!(report.removed, vec!["9".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_tombstone() {
        let remote = MemoryRemote::new();
        remote.set_fail_push(true);
        let (_dir, store, mut engine) = setup(remote);
        {
            let mut store = lock_store(&store);
            store.insert(synced_note("9", "doomed", 100));
            store.set_deleted("9", true).unwrap();
        }

        let report = engine.sync_notes(true, false).await;
        assert_eq!(report.errors, 1);
        assert!(lock_store(&store).get("9").unwrap().deleted);
    }

    #[tokio::test]
    async fn test_unsent_tombstone_is_dropped_without_network() {
        let (_dir, store, mut engine) = setup(MemoryRemote::new());
        {
            let mut store = lock_store(&store);
            let key = store.create("draft");
            store.set_deleted(&key, true).unwrap();
        }

        let report = engine.sync_notes(true, false).await;
        assert!(report.is_clean());
        assert!(lock_store(&store).is_empty());
        assert!(engine.remote().deletes.lock().unwrap().is_empty());
        assert!(engine.remote().pushed().is_empty());
    }

    #[tokio::test]
    async fn test_offline_pass_only_persists() {
        let (_dir, store, mut engine) = setup(MemoryRemote::new());
        let key = lock_store(&store).create("offline");

        let report = engine.sync_notes(false, false).await;
        assert!(report.is_clean());
        assert_eq!(report.updated, vec![key.clone()]);
        assert_eq!(engine.remote().list_calls.load(Ordering::SeqCst), 0);
        assert!(engine.remote().pushed().is_empty());

        let store = lock_store(&store);
        let note = store.get(&key).unwrap();
        assert!(note.is_persisted());
        assert!(note.needs_sync());
    }

    #[tokio::test]
    async fn test_write_error_is_counted_separately() {
        let (dir, store, mut engine) = setup(MemoryRemote::new());
        let key = lock_store(&store).create("unsaved");
        std::fs::remove_dir_all(dir.path().join("notes")).unwrap();
        std::fs::write(dir.path().join("notes"), "not a directory").unwrap();

        let report = engine.sync_notes(false, false).await;
        assert_eq!(report.errors, 0);
        assert_eq!(report.write_errors, 1);
        assert_eq!(engine.last_sync(), report.started_at);
        assert!(!lock_store(&store).get(&key).unwrap().is_persisted());
    }

    #[tokio::test]
    async fn test_view_callback_runs_once_when_notes_change() {
        let remote = MemoryRemote::new();
        remote.insert("1", "a", 100);
        remote.insert("2", "b", 100);
        let (_dir, _store, mut engine) = setup(remote);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        engine.set_update_view(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        engine.sync_notes(true, true).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        engine.sync_notes(true, true).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_last_sync_advances_on_clean_pass() {
        let (_dir, _store, mut engine) = setup(MemoryRemote::new());
        let report = engine.sync_notes(true, true).await;
        assert!(report.is_clean());
        assert_eq!(engine.last_sync(), report.started_at);
    }

    type StoreEdit = Box<dyn FnOnce(&mut LocalStore) + Send>;

    /// Server double that lets the user edit the store while a request is in flight.
    struct EditingRemote {
        inner: MemoryRemote,
        store: SharedStore,
        edit: Mutex<Option<StoreEdit>>,
    }

    impl EditingRemote {
        fn new(inner: MemoryRemote, store: &SharedStore, edit: StoreEdit) -> Self {
            Self {
                inner,
                store: Arc::clone(store),
                edit: Mutex::new(Some(edit)),
            }
        }

        fn apply_edit(&self) {
            let edit = self.edit.lock().unwrap().take();
            if let Some(edit) = edit {
                edit(&mut lock_store(&self.store));
            }
        }
    }

    impl RemoteNotes for EditingRemote {
        async fn list_notes(&self, category: Option<&str>) -> RemoteResult<Vec<RemoteNote>> {
            self.inner.list_notes(category).await
        }

        async fn get_note(&self, id: &str) -> RemoteResult<RemoteNote> {
            self.inner.get_note(id).await
        }

        async fn update_note(&self, payload: &NotePayload) -> RemoteResult<RemoteNote> {
            self.apply_edit();
            self.inner.update_note(payload).await
        }

        async fn delete_note(&self, id: &str) -> RemoteResult<()> {
            self.apply_edit();
            self.inner.delete_note(id).await
        }
    }

    fn open_store() -> (tempfile::TempDir, SharedStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("notes")).unwrap();
        (dir, Arc::new(Mutex::new(store)))
    }

    #[tokio::test]
    async fn test_edit_during_push_keeps_local_changes() {
        let (_dir, store) = open_store();
        lock_store(&store).insert(Note::new("abc", "v1", 10));
        let remote = EditingRemote::new(
            MemoryRemote::new().with_next_id(42),
            &store,
            Box::new(|store| {
                store.set_content("abc", "v2").unwrap();
            }),
        );
        let mut engine = SyncEngine::new(Arc::clone(&store), remote);

        let report = engine.sync_notes(true, false).await;
        assert_eq!(report.errors, 0);
        assert_eq!(report.resolve_key("abc"), "42");
        {
            let store = lock_store(&store);
            assert!(!store.contains("abc"));
            let note = store.get("42").unwrap();
            assert_eq!(note.content, "v2");
            assert_eq!(note.remote_id.as_deref(), Some("42"));
            assert_eq!(note.syncdate, 0);
            assert!(note.dirty_fields.contains(DirtyField::Content));
            assert!(note.needs_sync());
            assert!(note.is_persisted());
        }
        assert_eq!(
            engine.remote().inner.get("42").unwrap().content.as_deref(),
            Some("v1")
        );

        let second = engine.sync_notes(true, false).await;
        assert!(second.is_clean());
        assert_eq!(
            engine.remote().inner.get("42").unwrap().content.as_deref(),
            Some("v2")
        );
        assert!(!lock_store(&store).get("42").unwrap().needs_sync());
    }

    #[tokio::test]
    async fn test_restore_during_delete_recreates_note() {
        let (_dir, store) = open_store();
        {
            let mut store = lock_store(&store);
            store.insert(synced_note("7", "keep me", 10));
            store.set_deleted("7", true).unwrap();
        }
        let server = MemoryRemote::new().with_next_id(100);
        server.insert("7", "keep me", 10);
        let remote = EditingRemote::new(
            server,
            &store,
            Box::new(|store| {
                store.set_deleted("7", false).unwrap();
            }),
        );
        let mut engine = SyncEngine::new(Arc::clone(&store), remote);

        let report = engine.sync_notes(true, false).await;
        assert_eq!(report.errors, 0);
        assert!(report.removed.is_empty());
        assert!(report.updated.contains(&"7".to_string()));
        assert!(engine.remote().inner.get("7").is_none());
        {
            let store = lock_store(&store);
            let note = store.get("7").unwrap();
            assert!(!note.deleted);
            assert_eq!(note.remote_id, None);
            assert!(note.is_persisted());
        }

        let second = engine.sync_notes(true, false).await;
        assert!(second.is_clean());
        assert_eq!(second.resolve_key("7"), "100");
        assert_eq!(
            engine.remote().inner.get("100").unwrap().content.as_deref(),
            Some("keep me")
        );
        assert!(lock_store(&store).get("100").is_ok());
    }
}
