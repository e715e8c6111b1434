//! Note export helpers. JSON exports can be fed back into `import`.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::Note;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Serializable note representation used in JSON and Markdown exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNote {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    pub title: String,
    pub content: String,
    pub category: String,
    pub favorite: bool,
    pub modified: i64,
}

/// Convert a note into an export record.
#[must_use]
pub fn note_to_export_item(note: &Note) -> ExportNote {
    ExportNote {
        key: note.local_key.clone(),
        remote_id: note.remote_id.clone(),
        title: note.title.clone(),
        content: note.content.clone(),
        category: note.category.clone(),
        favorite: note.favorite,
        modified: note.modified,
    }
}

/// Render notes as pretty-printed JSON.
pub fn render_json_export(notes: &[Note]) -> serde_json::Result<String> {
    let items = notes
        .iter()
        .map(note_to_export_item)
        .collect::<Vec<ExportNote>>();
    serde_json::to_string_pretty(&items)
}

/// Render notes in Markdown with frontmatter blocks.
#[must_use]
pub fn render_markdown_export(notes: &[Note]) -> String {
    let mut output = String::new();

    for (index, note) in notes.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let export_note = note_to_export_item(note);
        let _ = writeln!(output, "---");
        let _ = writeln!(output, "key: {}", export_note.key);
        if let Some(remote_id) = &export_note.remote_id {
            let _ = writeln!(output, "remote_id: {remote_id}");
        }
        let _ = writeln!(output, "title: {}", export_note.title);
        if !export_note.category.is_empty() {
            let _ = writeln!(output, "category: {}", export_note.category);
        }
        let _ = writeln!(output, "favorite: {}", export_note.favorite);
        let _ = writeln!(output, "modified: {}", export_note.modified);
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        output.push_str(&export_note.content);
        output.push('\n');
    }

    output
}

/// Render notes based on selected export format.
pub fn render_notes_export(notes: &[Note], format: ExportFormat) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(notes),
        ExportFormat::Markdown => Ok(render_markdown_export(notes)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp: i64) -> String {
    format!("notesync-export-{timestamp}.{}", format.extension())
}
