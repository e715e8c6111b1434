use crate::commands::common::{
    format_note_lines, note_to_list_item, search_mode, search_terms, NoteListItem, Session,
};
use crate::error::CliError;

pub fn run_list(
    terms: &[String],
    regex: bool,
    as_json: bool,
    session: &Session,
) -> Result<Vec<String>, CliError> {
    let search = search_terms(terms);
    let result = session
        .db
        .filter(search.as_deref(), search_mode(regex), None);

    if as_json {
        let json_items = result
            .notes
            .iter()
            .map(|entry| note_to_list_item(&entry.note))
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(result.notes.into_iter().map(|entry| entry.key).collect());
    }

    let lines = format_note_lines(&result.notes);
    for line in &lines {
        println!("{line}");
    }
    Ok(lines)
}
