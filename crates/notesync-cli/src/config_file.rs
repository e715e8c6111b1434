//! Config file and cache directory discovery.

use std::env;
use std::path::{Path, PathBuf};

use notesync_core::config::AppConfig;

use crate::error::CliError;

const APP_DIR_NAME: &str = "notesync";
const CONFIG_FILE_NAME: &str = "config.json";

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("failed to resolve config directory".to_string()))
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::cache_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| CliError::Config("failed to resolve cache directory".to_string()))
}

/// Load the config file, then apply `NOTESYNC_*` environment overrides.
///
/// An explicitly named file must exist; the default one is optional.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, CliError> {
    let path = match path {
        Some(path) if !path.exists() => {
            return Err(CliError::Config(format!(
                "config file {} does not exist",
                path.display()
            )));
        }
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };

    let mut config = AppConfig::load_from_path(&path)?;
    config.apply_env_overrides(|key| env::var(key).ok())?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Command-line flag first, then the config value, then the platform cache dir.
pub fn resolve_db_path(
    cli_db_path: Option<PathBuf>,
    config: &AppConfig,
) -> Result<PathBuf, CliError> {
    match cli_db_path.or_else(|| config.db_path.clone()) {
        Some(path) => Ok(path),
        None => default_db_path(),
    }
}
