//! Application configuration.
//!
//! Settings are read from a JSON file and then overridden by `NOTESYNC_*`
//! environment variables. Every field is optional in the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{ListSettings, SortMode};
use crate::remote::RemoteCredentials;
use crate::util::normalize_text_option;

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 15;

pub const ENV_USERNAME: &str = "NOTESYNC_USERNAME";
pub const ENV_PASSWORD: &str = "NOTESYNC_PASSWORD";
pub const ENV_PASSWORD_EVAL: &str = "NOTESYNC_PASSWORD_EVAL";
pub const ENV_HOST: &str = "NOTESYNC_HOST";
pub const ENV_DB_PATH: &str = "NOTESYNC_DB_PATH";
pub const ENV_SORT_MODE: &str = "NOTESYNC_SORT_MODE";
pub const ENV_FAVORITE_ONTOP: &str = "NOTESYNC_FAVORITE_ONTOP";
pub const ENV_SEARCH_CATEGORIES: &str = "NOTESYNC_SEARCH_CATEGORIES";
pub const ENV_SYNC_INTERVAL: &str = "NOTESYNC_SYNC_INTERVAL";
pub const ENV_EDITOR: &str = "NOTESYNC_EDITOR";

/// User configuration.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Shell command whose output is the password; wins over `password`
    pub password_eval: Option<String>,
    /// Server host name or base URL
    pub host: Option<String>,
    /// Note cache directory; the caller picks a platform default when unset
    pub db_path: Option<PathBuf>,
    #[serde(flatten)]
    pub list: ListSettings,
    pub sync_interval_secs: u64,
    pub editor: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            password_eval: None,
            host: None,
            db_path: None,
            list: ListSettings::default(),
            sync_interval_secs: DEFAULT_SYNC_INTERVAL_SECS,
            editor: None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("password_eval", &self.password_eval)
            .field("host", &self.host)
            .field("db_path", &self.db_path)
            .field("list", &self.list)
            .field("sync_interval_secs", &self.sync_interval_secs)
            .field("editor", &self.editor)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from `path`. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&raw).map_err(|error| {
            Error::Config(format!("failed to parse {}: {error}", path.display()))
        })
    }

    /// Apply `NOTESYNC_*` overrides read through `lookup`.
    ///
    /// Blank values are ignored.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let read = |key: &str| normalize_text_option(lookup(key));

        if let Some(username) = read(ENV_USERNAME) {
            self.username = Some(username);
        }
        if let Some(password) = read(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(password_eval) = read(ENV_PASSWORD_EVAL) {
            self.password_eval = Some(password_eval);
        }
        if let Some(host) = read(ENV_HOST) {
            self.host = Some(host);
        }
        if let Some(db_path) = read(ENV_DB_PATH) {
            self.db_path = Some(PathBuf::from(db_path));
        }
        if let Some(editor) = read(ENV_EDITOR) {
            self.editor = Some(editor);
        }
        if let Some(sort_mode) = read(ENV_SORT_MODE) {
            self.list.sort_mode = parse_sort_mode(&sort_mode)?;
        }
        if let Some(value) = read(ENV_FAVORITE_ONTOP) {
            self.list.favorite_ontop = parse_flag(ENV_FAVORITE_ONTOP, &value)?;
        }
        if let Some(value) = read(ENV_SEARCH_CATEGORIES) {
            self.list.search_categories = parse_flag(ENV_SEARCH_CATEGORIES, &value)?;
        }
        if let Some(value) = read(ENV_SYNC_INTERVAL) {
            self.sync_interval_secs = value.parse().map_err(|_| {
                Error::Config(format!("{ENV_SYNC_INTERVAL} must be a whole number of seconds"))
            })?;
        }
        Ok(())
    }

    /// Resolve the server password, running `password_eval` if configured.
    pub fn resolve_password(&self) -> Result<Option<String>> {
        let Some(command) = normalize_text_option(self.password_eval.clone()) else {
            return Ok(self.password.clone().filter(|password| !password.is_empty()));
        };

        let output = Command::new("sh")
            .arg("-c")
            .arg(&command)
            .output()
            .map_err(|error| Error::Config(format!("failed to run password_eval: {error}")))?;
        if !output.status.success() {
            return Err(Error::Config(format!(
                "password_eval exited with {}",
                output.status
            )));
        }

        let password = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(Some(password).filter(|password| !password.is_empty()))
    }

    /// Server credentials, or `None` when no server is configured.
    ///
    /// A partially configured server is an error.
    pub fn remote_credentials(&self) -> Result<Option<RemoteCredentials>> {
        let host = normalize_text_option(self.host.clone());
        let username = normalize_text_option(self.username.clone());
        if host.is_none() && username.is_none() {
            return Ok(None);
        }

        let password = self.resolve_password()?;
        let mut missing = Vec::new();
        if host.is_none() {
            missing.push("host");
        }
        if username.is_none() {
            missing.push("username");
        }
        if password.is_none() {
            missing.push("password");
        }

        match (host, username, password) {
            (Some(host), Some(username), Some(password)) => Ok(Some(RemoteCredentials {
                host,
                username,
                password,
            })),
            _ => Err(Error::Config(format!(
                "server configuration is incomplete. Missing: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Background sync period, never shorter than one second.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval_secs.max(1))
    }
}

fn parse_sort_mode(value: &str) -> Result<SortMode> {
    match value.to_ascii_lowercase().as_str() {
        "date" => Ok(SortMode::Date),
        "alpha" => Ok(SortMode::Alpha),
        "categories" => Ok(SortMode::Categories),
        other => Err(Error::Config(format!(
            "{ENV_SORT_MODE} must be date, alpha or categories (got {other})"
        ))),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{key} must be yes or no"))),
    }
}
