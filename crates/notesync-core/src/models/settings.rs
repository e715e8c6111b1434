//! Note list presentation settings

use serde::{Deserialize, Serialize};

/// Note list ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    /// Most recently modified first
    #[default]
    Date,
    /// By title
    Alpha,
    /// By category, then title
    Categories,
}

/// How a search string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Google-style words, `"quoted phrases"` and `category:` filters
    #[default]
    Gstyle,
    /// Regular expression with optional `/i` suffix
    Regex,
}

/// Settings that shape filtered note lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSettings {
    /// Default sort order
    #[serde(default)]
    pub sort_mode: SortMode,
    /// Pin favorites above everything else
    #[serde(default = "default_true")]
    pub favorite_ontop: bool,
    /// Let regex searches match note categories too
    #[serde(default = "default_true")]
    pub search_categories: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for ListSettings {
    fn default() -> Self {
        Self {
            sort_mode: SortMode::Date,
            favorite_ontop: true,
            search_categories: true,
        }
    }
}
