use crate::commands::common::{resolve_note_content, Session};
use crate::error::CliError;

pub async fn run_create(content_parts: &[String], session: &Session) -> Result<String, CliError> {
    let content = resolve_note_content(content_parts, session.editor.as_deref())?;

    let key = session.db.create(&content);
    let report = session.finish().await?;

    let key = report.resolve_key(&key).to_string();
    println!("{key}");
    Ok(key)
}
