use crate::commands::common::{normalize_note_key, Session};
use crate::error::CliError;

pub async fn run_delete(key: &str, session: &Session) -> Result<(), CliError> {
    let key = normalize_note_key(key)?;
    session.db.set_deleted(&key, true)?;
    session.finish().await?;

    println!("{key}");
    Ok(())
}
