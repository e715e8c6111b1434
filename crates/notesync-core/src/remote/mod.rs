//! Remote notes service interface.
//!
//! The sync engine only talks to the server through [`RemoteNotes`]. Every
//! operation returns an explicit [`RemoteResult`]; the engine counts failures
//! instead of propagating them.

mod nextcloud;
#[cfg(test)]
pub(crate) mod memory;

use std::future::Future;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::models::deserialize_null_string;

pub use nextcloud::{NextcloudClient, RemoteCredentials};

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Connection to notes server failed: {0}")]
    Connection(String),
    #[error("Notes server request failed: {0}")]
    Request(String),
    #[error("Malformed response from notes server: {0}")]
    MalformedResponse(String),
    #[error("Invalid notes server configuration: {0}")]
    InvalidConfiguration(String),
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// A note as returned by the server. `content` is `None` in index listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNote {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub category: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub modified: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Whether `note` belongs to `category`; `None` matches every note.
pub(crate) fn in_category(note: &RemoteNote, category: Option<&str>) -> bool {
    category.map_or(true, |category| note.category == category)
}

/// Minimal push body. Fields left `None` are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotePayload {
    /// Target note; `None` creates a new note
    #[serde(skip)]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    pub modified: i64,
}

/// CRUD access to the remote notes service
pub trait RemoteNotes: Send + Sync {
    /// List every note without bodies, optionally narrowed to one category
    fn list_notes(
        &self,
        category: Option<&str>,
    ) -> impl Future<Output = RemoteResult<Vec<RemoteNote>>> + Send;

    /// Fetch one note including its content
    fn get_note(&self, id: &str) -> impl Future<Output = RemoteResult<RemoteNote>> + Send;

    /// Create (`payload.id == None`) or update a note
    fn update_note(
        &self,
        payload: &NotePayload,
    ) -> impl Future<Output = RemoteResult<RemoteNote>> + Send;

    /// Permanently delete a note
    fn delete_note(&self, id: &str) -> impl Future<Output = RemoteResult<()>> + Send;
}

/// No server configured: every call fails with `InvalidConfiguration`.
impl<R: RemoteNotes> RemoteNotes for Option<R> {
    async fn list_notes(&self, category: Option<&str>) -> RemoteResult<Vec<RemoteNote>> {
        match self {
            Some(remote) => remote.list_notes(category).await,
            None => Err(not_configured()),
        }
    }

    async fn get_note(&self, id: &str) -> RemoteResult<RemoteNote> {
        match self {
            Some(remote) => remote.get_note(id).await,
            None => Err(not_configured()),
        }
    }

    async fn update_note(&self, payload: &NotePayload) -> RemoteResult<RemoteNote> {
        match self {
            Some(remote) => remote.update_note(payload).await,
            None => Err(not_configured()),
        }
    }

    async fn delete_note(&self, id: &str) -> RemoteResult<()> {
        match self {
            Some(remote) => remote.delete_note(id).await,
            None => Err(not_configured()),
        }
    }
}

fn not_configured() -> RemoteError {
    RemoteError::InvalidConfiguration("no notes server configured".to_string())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(id) => id.to_string(),
        RawId::Text(id) => id,
    })
}
