use std::path::Path;

use notesync_core::export::render_notes_export;

use crate::cli::ExportFormat;
use crate::commands::common::{normalize_note_key, search_mode, search_terms, Session};
use crate::error::CliError;

pub struct ExportOptions<'a> {
    pub key: Option<&'a str>,
    pub terms: &'a [String],
    pub regex: bool,
    pub format: ExportFormat,
    pub output: Option<&'a Path>,
}

pub fn run_export(options: &ExportOptions<'_>, session: &Session) -> Result<String, CliError> {
    let notes = if let Some(key) = options.key {
        let key = normalize_note_key(key)?;
        vec![session.db.get(&key)?]
    } else {
        let search = search_terms(options.terms);
        session
            .db
            .filter(search.as_deref(), search_mode(options.regex), None)
            .notes
            .into_iter()
            .map(|entry| entry.note)
            .collect()
    };

    let rendered = render_notes_export(&notes, options.format.into())?;

    if let Some(path) = options.output {
        std::fs::write(path, &rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(rendered)
}
