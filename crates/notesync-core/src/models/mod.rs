//! Data models for notesync

mod note;
mod settings;

pub use note::{DirtyField, DirtyFields, Note};
pub(crate) use note::deserialize_null_string;
pub use settings::{ListSettings, SearchMode, SortMode};
