//! notesync-core - Core library for notesync
//!
//! This crate contains the note model, the local JSON note store, the
//! Nextcloud Notes client, and the bidirectional sync engine shared by the
//! notesync command-line interface.

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod search;
pub mod services;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{DirtyField, DirtyFields, Note};
pub use services::NotesDb;
