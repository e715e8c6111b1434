use crate::commands::common::{
    normalize_note_key, render_note_dump, search_mode, search_terms, Session,
};
use crate::error::CliError;

/// Print one note by key, or every note matching the search.
pub fn run_dump(
    key: Option<&str>,
    terms: &[String],
    regex: bool,
    session: &Session,
) -> Result<Vec<String>, CliError> {
    let rendered = if let Some(key) = key {
        let key = normalize_note_key(key)?;
        vec![render_note_dump(&session.db.get(&key)?)]
    } else {
        let search = search_terms(terms);
        session
            .db
            .filter(search.as_deref(), search_mode(regex), None)
            .notes
            .iter()
            .map(|entry| render_note_dump(&entry.note))
            .collect()
    };

    for dump in &rendered {
        println!("{dump}");
    }
    Ok(rendered)
}
