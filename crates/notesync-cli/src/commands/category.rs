use crate::commands::common::{normalize_note_key, Session};
use crate::error::CliError;

pub fn run_category_get(key: &str, session: &Session) -> Result<String, CliError> {
    let key = normalize_note_key(key)?;
    let category = session.db.get(&key)?.category;
    println!("{category}");
    Ok(category)
}

/// Categories are stored lower-cased.
pub async fn run_category_set(
    key: &str,
    category: &str,
    session: &Session,
) -> Result<(), CliError> {
    let key = normalize_note_key(key)?;
    let category = category.trim().to_lowercase();
    if session.db.set_category(&key, &category)? {
        tracing::info!(key, category, "Note category updated");
    }
    session.finish().await?;
    Ok(())
}

pub async fn run_category_rm(key: &str, session: &Session) -> Result<(), CliError> {
    run_category_set(key, "", session).await
}
