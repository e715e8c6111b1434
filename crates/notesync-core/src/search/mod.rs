//! Note search and list ordering
//!
//! Two query languages are supported. Google-style queries combine
//! `category:<pattern>` terms, `"quoted phrases"` and bare words; every term
//! must match. Regex queries take a single pattern with an optional `/i`
//! suffix for case-insensitive matching.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::models::{ListSettings, Note, SearchMode, SortMode};

/// A note that passed the filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredNote {
    pub key: String,
    pub note: Note,
    /// Whether the note matched through its category
    pub category_matched: bool,
}

/// Filtered, sorted notes plus what the view needs to render them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterResult {
    pub notes: Vec<FilteredNote>,
    /// Pattern for highlighting matches; empty when nothing to highlight
    pub match_pattern: String,
    /// Number of records in the store, tombstones included
    pub total: usize,
}

/// Filter and sort `notes`. Tombstones count toward `total` but are never listed.
pub fn filter_notes<'a>(
    notes: impl IntoIterator<Item = &'a Note>,
    search: Option<&str>,
    mode: SearchMode,
    sort: SortMode,
    settings: &ListSettings,
) -> FilterResult {
    let search = search.map(str::trim).filter(|search| !search.is_empty());
    let mut total = 0;
    let mut live = Vec::new();
    for note in notes {
        total += 1;
        if !note.deleted {
            live.push(note);
        }
    }

    let (mut filtered, match_pattern) = match mode {
        SearchMode::Gstyle => filter_gstyle(&live, search),
        SearchMode::Regex => filter_regex(&live, search, settings.search_categories),
    };
    sort_notes(&mut filtered, sort, settings.favorite_ontop);

    FilterResult {
        notes: filtered,
        match_pattern,
        total,
    }
}

/// Parsed Google-style query
#[derive(Debug, Default, PartialEq, Eq)]
struct GstyleQuery {
    categories: Vec<String>,
    words: Vec<String>,
}

fn gstyle_token_regex() -> &'static Regex {
    static TOKENS: OnceLock<Regex> = OnceLock::new();
    TOKENS.get_or_init(|| {
        Regex::new(r#"category:([^\s]+)|"([^"]+)"|([^\s]+)"#).expect("Invalid regex")
    })
}

fn parse_gstyle(search: &str) -> GstyleQuery {
    let mut query = GstyleQuery::default();
    for captures in gstyle_token_regex().captures_iter(search) {
        if let Some(category) = captures.get(1) {
            query.categories.push(category.as_str().to_lowercase());
        } else if let Some(word) = captures.get(2).or_else(|| captures.get(3)) {
            query.words.push(word.as_str().to_string());
        }
    }
    query
}

fn filter_gstyle(notes: &[&Note], search: Option<&str>) -> (Vec<FilteredNote>, String) {
    let query = search.map(parse_gstyle).unwrap_or_default();
    let words: Vec<String> = query.words.iter().map(|word| word.to_lowercase()).collect();

    let filtered = notes
        .iter()
        .filter_map(|note| {
            let category = note.category.to_lowercase();
            if !query.categories.is_empty()
                && (category.is_empty()
                    || !query
                        .categories
                        .iter()
                        .all(|pattern| category.contains(pattern.as_str())))
            {
                return None;
            }

            let content = note.content.to_lowercase();
            if !words.iter().all(|word| content.contains(word.as_str())) {
                return None;
            }

            Some(filtered_note(note, !query.categories.is_empty()))
        })
        .collect();

    (filtered, query.words.join("|"))
}

/// Compile a regex search, honoring a trailing `/i` flag.
///
/// Returns `None` for an empty or invalid pattern.
#[must_use]
pub fn build_regex_search(search: &str) -> Option<Regex> {
    if search.is_empty() {
        return None;
    }
    let (pattern, flags) = match search.rsplit_once('/') {
        Some((pattern, flags))
            if !pattern.is_empty()
                && !flags.is_empty()
                && flags.chars().all(|flag| flag.is_ascii_lowercase()) =>
        {
            (pattern, flags)
        }
        _ => (search, ""),
    };

    RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .build()
        .ok()
}

fn filter_regex(
    notes: &[&Note],
    search: Option<&str>,
    search_categories: bool,
) -> (Vec<FilteredNote>, String) {
    let Some((search, pattern)) = search.and_then(|search| Some((search, build_regex_search(search)?)))
    else {
        let all = notes.iter().map(|note| filtered_note(note, false)).collect();
        return (all, String::new());
    };

    let filtered = notes
        .iter()
        .filter_map(|note| {
            if search_categories && !note.category.is_empty() && pattern.is_match(&note.category) {
                Some(filtered_note(note, true))
            } else if pattern.is_match(&note.content) {
                Some(filtered_note(note, false))
            } else {
                None
            }
        })
        .collect();

    (filtered, search.to_string())
}

fn filtered_note(note: &Note, category_matched: bool) -> FilteredNote {
    FilteredNote {
        key: note.local_key.clone(),
        note: note.clone(),
        category_matched,
    }
}

fn sort_notes(notes: &mut [FilteredNote], sort: SortMode, favorite_ontop: bool) {
    notes.sort_by(|a, b| {
        let (a, b) = (&a.note, &b.note);
        let favorites = if favorite_ontop {
            b.favorite.cmp(&a.favorite)
        } else {
            Ordering::Equal
        };
        let by_mode = match sort {
            SortMode::Date => b.modified.cmp(&a.modified),
            SortMode::Alpha => compare_titles(a, b),
            SortMode::Categories => a
                .category
                .to_lowercase()
                .cmp(&b.category.to_lowercase())
                .then_with(|| compare_titles(a, b)),
        };
        favorites
            .then(by_mode)
            .then_with(|| a.local_key.cmp(&b.local_key))
    });
}

fn compare_titles(a: &Note, b: &Note) -> Ordering {
    a.title.to_lowercase().cmp(&b.title.to_lowercase())
}
