use std::io;

use notesync_core::remote::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] notesync_core::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Edited note content cannot be empty")]
    EmptyEditedContent,
    #[error("Note key cannot be empty")]
    EmptyNoteKey,
    #[error("Nothing to import")]
    EmptyImport,
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Sync is not configured. Set host, username and password in the config file or via NOTESYNC_HOST, NOTESYNC_USERNAME and NOTESYNC_PASSWORD."
    )]
    SyncNotConfigured,
    #[error("Some notes could not be saved to disk; see the log above")]
    UnsavedChanges,
}
