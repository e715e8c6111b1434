//! Error types for notesync-core

use std::path::PathBuf;

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias using notesync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notesync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// A note file could not be loaded at startup
    #[error("Error reading {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// A note could not be written to the local store
    #[error("Error writing note {key}: {message}")]
    Write { key: String, message: String },

    /// Rejected input for create/import
    #[error("Invalid note: {0}")]
    Validation(String),

    /// Note not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote notes service error
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}
