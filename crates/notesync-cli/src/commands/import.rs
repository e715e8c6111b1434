use std::path::Path;

use serde_json::Value;

use crate::commands::common::{normalize_content, read_stdin_to_string, Session};
use crate::error::CliError;

/// Import one note object or an array of them from `source` (`-` or `None` for stdin).
pub async fn run_import(source: Option<&Path>, session: &Session) -> Result<Vec<String>, CliError> {
    let raw = match source {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)?,
        _ => read_stdin_to_string()?,
    };
    let keys = import_raw(&raw, session)?;
    let report = session.finish().await?;

    let keys = keys
        .iter()
        .map(|key| report.resolve_key(key).to_string())
        .collect::<Vec<String>>();
    for key in &keys {
        println!("{key}");
    }
    Ok(keys)
}

pub fn import_raw(raw: &str, session: &Session) -> Result<Vec<String>, CliError> {
    let Some(raw) = normalize_content(raw) else {
        return Err(CliError::EmptyImport);
    };
    let payloads = match serde_json::from_str::<Value>(&raw)? {
        Value::Array(items) => items,
        item => vec![item],
    };
    if payloads.is_empty() {
        return Err(CliError::EmptyImport);
    }

    Ok(session.db.import_all(&payloads)?)
}
