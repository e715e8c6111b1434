//! Bidirectional sync between the local store and the notes server.
//!
//! A pass pushes local changes, fetches the server index, pulls newer
//! notes, optionally prunes notes deleted on the server, and finally
//! writes every touched note to disk. Network I/O never runs while the
//! store lock is held.

mod engine;
mod scheduler;

pub use engine::{build_payload, SyncEngine, ViewCallback};
pub use scheduler::SyncScheduler;

/// Outcome of a single sync pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Unix seconds at which the pass began
    pub started_at: i64,
    pub server_sync: bool,
    pub full_sync: bool,
    /// Failed network operations and malformed server replies
    pub errors: usize,
    /// Notes that could not be written to disk
    pub write_errors: usize,
    /// Keys persisted by this pass
    pub updated: Vec<String>,
    /// Keys whose files were removed by this pass
    pub removed: Vec<String>,
    /// `(local key, server id)` for notes created on the server by this pass
    pub rekeyed: Vec<(String, String)>,
}

impl SyncReport {
    /// Whether the pass finished without sync or write errors
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.errors == 0 && self.write_errors == 0
    }

    /// Current key of a note that was known as `key` before the pass
    #[must_use]
    pub fn resolve_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.rekeyed
            .iter()
            .find(|(old, _)| old == key)
            .map_or(key, |(_, new)| new.as_str())
    }

    /// Whether the pass updated or removed any local note
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.updated.is_empty() || !self.removed.is_empty()
    }
}
