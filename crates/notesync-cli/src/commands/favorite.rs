use crate::commands::common::{normalize_note_key, Session};
use crate::error::CliError;

pub async fn run_favorite(key: &str, favorite: bool, session: &Session) -> Result<(), CliError> {
    let key = normalize_note_key(key)?;
    if session.db.set_favorite(&key, favorite)? {
        tracing::info!(key, favorite, "Note favorite flag updated");
    }
    let report = session.finish().await?;

    println!("{}", report.resolve_key(&key));
    Ok(())
}
