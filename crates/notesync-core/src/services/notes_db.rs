//! Shared note database service used by clients.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::models::{ListSettings, Note, SearchMode, SortMode};
use crate::remote::RemoteNotes;
use crate::search::{filter_notes, FilterResult};
use crate::store::{lock_store, LocalStore, SharedStore};
use crate::sync::{SyncEngine, SyncReport, SyncScheduler};
use crate::Result;

/// Thread-safe application context: the local store, its sync
/// scheduler and the list preferences.
pub struct NotesDb<R> {
    store: SharedStore,
    scheduler: Arc<SyncScheduler<R>>,
    settings: ListSettings,
    created: bool,
}

impl<R> Clone for NotesDb<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            scheduler: Arc::clone(&self.scheduler),
            settings: self.settings.clone(),
            created: self.created,
        }
    }
}

impl<R: RemoteNotes + 'static> NotesDb<R> {
    /// Open (creating if needed) the store at `store_dir` and load every note.
    pub fn open(
        store_dir: impl Into<PathBuf>,
        remote: R,
        settings: ListSettings,
        interval: Duration,
    ) -> Result<Self> {
        let store = LocalStore::open(store_dir)?;
        let created = store.was_created();
        tracing::info!(
            "Opened note store at {} ({} notes)",
            store.dir().display(),
            store.len()
        );

        let store: SharedStore = Arc::new(Mutex::new(store));
        let engine = SyncEngine::new(Arc::clone(&store), remote);
        let scheduler = SyncScheduler::new(engine, interval);

        Ok(Self {
            store,
            scheduler: Arc::new(scheduler),
            settings,
            created,
        })
    }

    /// Whether the store directory did not exist before [`Self::open`].
    pub const fn was_created(&self) -> bool {
        self.created
    }

    /// Filter and sort notes. `sort` falls back to the configured order.
    pub fn filter(
        &self,
        search: Option<&str>,
        mode: SearchMode,
        sort: Option<SortMode>,
    ) -> FilterResult {
        let sort = sort.unwrap_or(self.settings.sort_mode);
        let store = lock_store(&self.store);
        filter_notes(store.notes(), search, mode, sort, &self.settings)
    }

    /// Snapshot of one note.
    pub fn get(&self, key: &str) -> Result<Note> {
        lock_store(&self.store).get(key).cloned()
    }

    pub fn create(&self, content: &str) -> String {
        let key = lock_store(&self.store).create(content);
        tracing::info!(key, "Created note");
        self.trigger();
        key
    }

    pub fn import(&self, payload: &Value) -> Result<String> {
        let key = lock_store(&self.store).import(payload)?;
        tracing::info!(key, "Imported note");
        self.trigger();
        Ok(key)
    }

    /// Import a batch; nothing is imported unless every payload is valid.
    pub fn import_all(&self, payloads: &[Value]) -> Result<Vec<String>> {
        let keys = lock_store(&self.store).import_all(payloads)?;
        tracing::info!("Imported {} notes", keys.len());
        if !keys.is_empty() {
            self.trigger();
        }
        Ok(keys)
    }

    pub fn set_content(&self, key: &str, content: &str) -> Result<bool> {
        self.mutate(|store| store.set_content(key, content))
    }

    pub fn set_category(&self, key: &str, category: &str) -> Result<bool> {
        self.mutate(|store| store.set_category(key, category))
    }

    pub fn set_favorite(&self, key: &str, favorite: bool) -> Result<bool> {
        self.mutate(|store| store.set_favorite(key, favorite))
    }

    pub fn set_deleted(&self, key: &str, deleted: bool) -> Result<bool> {
        self.mutate(|store| store.set_deleted(key, deleted))
    }

    fn mutate(&self, change: impl FnOnce(&mut LocalStore) -> Result<bool>) -> Result<bool> {
        let changed = change(&mut lock_store(&self.store))?;
        if changed {
            self.trigger();
        }
        Ok(changed)
    }

    /// Run one sync pass, waiting for a pass already in progress.
    pub async fn run_once(&self, server_sync: bool) -> SyncReport {
        self.scheduler.run_once(server_sync).await
    }

    /// Wake the background sync worker early.
    pub fn trigger(&self) {
        self.scheduler.trigger();
    }

    /// Whether every note's disk copy is as new as its last change.
    pub fn verify_all_persisted(&self) -> bool {
        lock_store(&self.store).verify_all_persisted()
    }

    /// Register the callback run after a pass that changed local notes.
    pub async fn set_update_view(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.scheduler
            .engine()
            .lock()
            .await
            .set_update_view(Arc::new(callback));
    }

    /// Start the periodic background sync worker.
    pub fn spawn_sync_worker(&self, server_sync: bool) -> JoinHandle<()> {
        self.scheduler.spawn(server_sync)
    }
}
