//! Background sync worker and the single-flight pass gate.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info};

use super::{SyncEngine, SyncReport};
use crate::remote::RemoteNotes;

/// Drives periodic sync passes and serializes them with manual ones.
///
/// The engine sits behind an async mutex, so at most one pass runs at a
/// time whether it was started by the worker or by [`Self::run_once`].
pub struct SyncScheduler<R> {
    engine: Arc<Mutex<SyncEngine<R>>>,
    wake: Notify,
    interval: Duration,
}

impl<R: RemoteNotes + 'static> SyncScheduler<R> {
    pub fn new(engine: SyncEngine<R>, interval: Duration) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            wake: Notify::new(),
            interval,
        }
    }

    pub const fn engine(&self) -> &Arc<Mutex<SyncEngine<R>>> {
        &self.engine
    }

    /// Run one pass now, waiting for any pass already in progress.
    ///
    /// `full_sync` is chosen automatically: the first clean pass is full.
    pub async fn run_once(&self, server_sync: bool) -> SyncReport {
        let mut engine = self.engine.lock().await;
        let full_sync = engine.last_sync() == 0;
        engine.sync_notes(server_sync, full_sync).await
    }

    /// Wake the background worker early.
    pub fn trigger(&self) {
        self.wake.notify_one();
    }

    /// Start the background worker.
    ///
    /// The worker runs a pass right away, then waits for [`Self::trigger`]
    /// or the interval, whichever comes first, before the next one. Abort
    /// the handle to stop it.
    pub fn spawn(self: &Arc<Self>, server_sync: bool) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            info!(
                interval_secs = scheduler.interval.as_secs(),
                "Sync worker started"
            );
            scheduler.run_once(server_sync).await;
            loop {
                if timeout(scheduler.interval, scheduler.wake.notified())
                    .await
                    .is_ok()
                {
                    debug!("Sync worker woken");
                }
                scheduler.run_once(server_sync).await;
            }
        })
    }
}
