use crate::commands::common::{capture_editor_input_with_initial, normalize_note_key, Session};
use crate::error::CliError;

pub async fn run_edit(key: &str, session: &Session) -> Result<(), CliError> {
    let key = normalize_note_key(key)?;
    let note = session.db.get(&key)?;

    let Some(edited_content) =
        capture_editor_input_with_initial(session.editor.as_deref(), &note.content)?
    else {
        return Err(CliError::EmptyEditedContent);
    };

    if edited_content == note.content.trim() {
        tracing::info!(key, "Note unchanged");
        println!("{key}");
        return Ok(());
    }

    session.db.set_content(&key, &edited_content)?;
    let report = session.finish().await?;
    println!("{}", report.resolve_key(&key));
    Ok(())
}
