//! Service layer shared by clients.

mod notes_db;

pub use notes_db::NotesDb;
