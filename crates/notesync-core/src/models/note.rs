//! Note model

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::remote::RemoteNote;
use crate::util::title_from_content;

/// A note field whose local change has not been confirmed by the server yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirtyField {
    Content,
    Category,
    Favorite,
    Deleted,
}

impl fmt::Display for DirtyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Content => "content",
            Self::Category => "category",
            Self::Favorite => "favorite",
            Self::Deleted => "deleted",
        };
        f.write_str(name)
    }
}

/// Set of fields changed since the last successful sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirtyFields(BTreeSet<DirtyField>);

impl DirtyFields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: DirtyField) {
        self.0.insert(field);
    }

    #[must_use]
    pub fn contains(&self, field: DirtyField) -> bool {
        self.0.contains(&field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = DirtyField> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<DirtyField> for DirtyFields {
    fn from_iter<I: IntoIterator<Item = DirtyField>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A note and its sync bookkeeping, as kept in memory and on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Local store key; equals `remote_id` once the server assigned one
    #[serde(default)]
    pub local_key: String,
    /// Id assigned by the server on first successful push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    /// Title as reported by the server, or the first content line
    #[serde(default)]
    pub title: String,
    /// Plain text content
    #[serde(default)]
    pub content: String,
    /// Single free-text category; empty when unset
    #[serde(default, deserialize_with = "deserialize_null_string")]
    pub category: String,
    /// Pinned flag
    #[serde(default)]
    pub favorite: bool,
    /// Tombstone awaiting remote deletion
    #[serde(default)]
    pub deleted: bool,
    /// Last content-affecting change (Unix seconds)
    #[serde(default)]
    pub modified: i64,
    /// Last write to local disk (Unix seconds, 0 = never)
    #[serde(default)]
    pub savedate: i64,
    /// Last confirmed sync with the server (Unix seconds, 0 = never)
    #[serde(default)]
    pub syncdate: i64,
    /// Server entity tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Fields to include in the next push
    #[serde(default, skip_serializing_if = "DirtyFields::is_empty")]
    pub dirty_fields: DirtyFields,
}

impl Note {
    /// Create a never-saved, never-synced note under `local_key`
    #[must_use]
    pub fn new(local_key: impl Into<String>, content: impl Into<String>, now: i64) -> Self {
        let content = content.into();
        Self {
            local_key: local_key.into(),
            remote_id: None,
            title: title_from_content(&content),
            content,
            category: String::new(),
            favorite: false,
            deleted: false,
            modified: now,
            savedate: 0,
            syncdate: 0,
            etag: None,
            dirty_fields: DirtyFields::new(),
        }
    }

    /// Build a local record for a note discovered on the server
    #[must_use]
    pub fn from_remote(remote: &RemoteNote, now: i64) -> Self {
        let mut note = Self::new(remote.id.clone(), "", remote.modified);
        note.merge_remote(remote, now);
        note
    }

    /// Overwrite local fields with the server's copy and mark the note synced
    pub fn merge_remote(&mut self, remote: &RemoteNote, now: i64) {
        self.local_key.clone_from(&remote.id);
        self.remote_id = Some(remote.id.clone());
        if let Some(content) = &remote.content {
            self.content.clone_from(content);
        }
        self.title = if remote.title.is_empty() {
            title_from_content(&self.content)
        } else {
            remote.title.clone()
        };
        self.category.clone_from(&remote.category);
        self.favorite = remote.favorite;
        self.modified = remote.modified;
        if remote.etag.is_some() {
            self.etag.clone_from(&remote.etag);
        }
        self.deleted = false;
        self.syncdate = now;
        self.dirty_fields.clear();
    }

    /// Whether the server has not yet confirmed the current state
    #[must_use]
    pub fn needs_sync(&self) -> bool {
        self.remote_id.is_none() || self.modified > self.syncdate
    }

    /// Whether the on-disk copy is at least as new as the last change
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.savedate >= self.modified
    }

    /// Whether memory holds information that is not on disk yet
    #[must_use]
    pub fn needs_save(&self) -> bool {
        self.modified > self.savedate || self.syncdate > self.savedate
    }

    pub fn set_content(&mut self, content: &str, now: i64) -> bool {
        if self.content == content {
            return false;
        }
        self.content = content.to_string();
        self.title = title_from_content(content);
        self.touch(DirtyField::Content, now);
        true
    }

    pub fn set_category(&mut self, category: &str, now: i64) -> bool {
        if self.category == category {
            return false;
        }
        self.category = category.to_string();
        self.touch(DirtyField::Category, now);
        true
    }

    pub fn set_favorite(&mut self, favorite: bool, now: i64) -> bool {
        if self.favorite == favorite {
            return false;
        }
        self.favorite = favorite;
        self.touch(DirtyField::Favorite, now);
        true
    }

    pub fn set_deleted(&mut self, deleted: bool, now: i64) -> bool {
        if self.deleted == deleted {
            return false;
        }
        self.deleted = deleted;
        self.touch(DirtyField::Deleted, now);
        true
    }

    fn touch(&mut self, field: DirtyField, now: i64) {
        self.modified = now;
        self.dirty_fields.insert(field);
    }
}

/// Deserialize a string field where the server may send `null`
pub(crate) fn deserialize_null_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
