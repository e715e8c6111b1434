use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use notesync_core::config::AppConfig;
use notesync_core::models::SearchMode;
use notesync_core::remote::NextcloudClient;
use notesync_core::search::FilteredNote;
use notesync_core::sync::SyncReport;
use notesync_core::{Note, NotesDb};
use serde::Serialize;

use crate::error::CliError;

/// `None` when no server is configured; sync passes then stay local.
pub type Remote = Option<NextcloudClient>;

/// An open note database plus the per-invocation sync mode.
pub struct Session {
    pub db: NotesDb<Remote>,
    pub server_sync: bool,
    pub editor: Option<String>,
}

impl Session {
    /// Run a sync pass and make sure every change reached the disk.
    pub async fn finish(&self) -> Result<SyncReport, CliError> {
        let report = self.db.run_once(self.server_sync).await;
        if report.errors > 0 {
            tracing::warn!(
                errors = report.errors,
                "Sync finished with errors; changes stay queued for the next run"
            );
        }
        if !self.db.verify_all_persisted() {
            return Err(CliError::UnsavedChanges);
        }
        Ok(report)
    }
}

pub async fn open_session(
    config: &AppConfig,
    db_path: &Path,
    nosync: bool,
) -> Result<Session, CliError> {
    let credentials = if nosync {
        None
    } else {
        config.remote_credentials()?
    };
    if !nosync && credentials.is_none() {
        tracing::debug!("No notes server configured, working offline");
    }

    let remote = credentials.map(NextcloudClient::new).transpose()?;
    let server_sync = remote.is_some();
    let db = NotesDb::open(db_path, remote, config.list.clone(), config.sync_interval())?;

    if db.was_created() && server_sync {
        tracing::info!("Note cache did not exist, running a full sync");
        let report = db.run_once(true).await;
        tracing::info!(
            updated = report.updated.len(),
            errors = report.errors,
            "Initial sync finished"
        );
    }

    Ok(Session {
        db,
        server_sync,
        editor: config.editor.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub key: String,
    pub remote_id: Option<String>,
    pub title: String,
    pub category: String,
    pub favorite: bool,
    pub modified: i64,
    pub relative_time: String,
    pub flags: String,
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now = Utc::now().timestamp();
    NoteListItem {
        key: note.local_key.clone(),
        remote_id: note.remote_id.clone(),
        title: note.title.clone(),
        category: note.category.clone(),
        favorite: note.favorite,
        modified: note.modified,
        relative_time: format_relative_time(note.modified, now),
        flags: note_flags(note),
    }
}

/// `X` while the server has not confirmed the latest change, `*` for favorites.
pub fn note_flags(note: &Note) -> String {
    let unsynced = if note.needs_sync() { 'X' } else { ' ' };
    let favorite = if note.favorite { '*' } else { ' ' };
    format!("{unsynced}{favorite}")
}

pub fn format_note_lines(notes: &[FilteredNote]) -> Vec<String> {
    notes
        .iter()
        .map(|entry| {
            format!(
                "{} [{}] {}",
                entry.key,
                note_flags(&entry.note),
                entry.note.title
            )
        })
        .collect()
}

pub fn render_note_dump(note: &Note) -> String {
    const WIDTH: usize = 60;

    let separator = format!("+{}+", "-".repeat(WIDTH + 2));
    let key = note.remote_id.as_ref().map_or_else(
        || format!("Localkey: {}", note.local_key),
        Clone::clone,
    );
    let rows = [
        format!("    Title: {}", note.title),
        format!("      Key: {key}"),
        format!("     Date: {}", format_timestamp(note.modified)),
        format!(" Category: {}", note.category),
        format!("    Flags: [{}]", note_flags(note)),
    ];

    let mut output = separator.clone();
    output.push('\n');
    for row in rows {
        let row = row.chars().take(WIDTH).collect::<String>();
        output.push_str(&format!("| {row:<WIDTH$} |\n"));
    }
    output.push_str(&separator);
    output.push('\n');
    output.push_str(&note.content);
    output
}

pub fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0).map_or_else(
        || timestamp.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp: i64, now: i64) -> String {
    let diff = now.saturating_sub(timestamp);
    let minute = 60;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub const fn search_mode(regex: bool) -> SearchMode {
    if regex {
        SearchMode::Regex
    } else {
        SearchMode::Gstyle
    }
}

pub fn search_terms(terms: &[String]) -> Option<String> {
    normalize_content(&terms.join(" "))
}

/// Content from arguments, `-` (stdin), piped stdin, or the editor, in that order.
pub fn resolve_note_content(
    content_parts: &[String],
    editor: Option<&str>,
) -> Result<String, CliError> {
    if content_parts.len() == 1 && content_parts[0] == "-" {
        return normalize_content(&read_stdin_to_string()?).ok_or(CliError::EmptyContent);
    }

    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    if let Some(content) = read_piped_stdin()? {
        return Ok(content);
    }

    if let Some(content) = capture_editor_input_with_initial(editor, "")? {
        return Ok(content);
    }

    Err(CliError::EmptyContent)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_note_key(key: &str) -> Result<String, CliError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteKey)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    if io::stdin().is_terminal() {
        return Ok(None);
    }
    Ok(normalize_content(&read_stdin_to_string()?))
}

pub fn read_stdin_to_string() -> Result<String, CliError> {
    let mut buffer = String::new();
    io::stdin().lock().read_to_string(&mut buffer)?;
    Ok(buffer)
}

pub fn capture_editor_input_with_initial(
    editor: Option<&str>,
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor(editor);
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    tracing::debug!("Launching editor `{editor}` on {}", file_path.display());
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty editor command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

/// Configured editor, then `$VISUAL`, then `$EDITOR`.
pub fn preferred_editor(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|editor| !editor.is_empty())
        .map(ToString::to_string)
        .or_else(|| env::var("VISUAL").ok())
        .or_else(|| env::var("EDITOR").ok())
        .unwrap_or_else(|| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("notesync-note-{}-{now}.txt", std::process::id()))
}
