//! Tag model and tag-list normalization

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Display colors assigned to new tags. The choice carries no meaning.
pub const TAG_PALETTE: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8", "#F7DC6F", "#BB8FCE", "#85C1E2",
    "#F8B500", "#52BE80",
];

/// A tag record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub color: String,
}

/// Picks a color for a new tag
pub fn random_color() -> &'static str {
    TAG_PALETTE
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(TAG_PALETTE[0])
}

/// Normalizes a raw tag string into trimmed, non-empty titles.
///
/// Accepts a single title (`Алгебра`), a comma-separated list
/// (`a, b`) or a bracket-wrapped list (`[a, b]`). Duplicates are dropped,
/// first occurrence wins.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    let mut inner = raw.trim();
    if let Some(stripped) = inner.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        inner = stripped;
    }

    let mut titles: Vec<String> = Vec::new();
    for title in inner.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !titles.iter().any(|t| t == title) {
            titles.push(title.to_string());
        }
    }
    titles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_title() {
        assert_eq!(parse_tag_list("  Логарифмы "), vec!["Логарифмы"]);
    }

    #[test]
    fn comma_separated() {
        assert_eq!(parse_tag_list("a, b ,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn bracket_wrapped() {
        assert_eq!(parse_tag_list("[a, b, c]"), vec!["a", "b", "c"]);
        assert_eq!(parse_tag_list(" [ Алгебра ] "), vec!["Алгебра"]);
    }

    #[test]
    fn empty_entries_are_dropped() {
        assert!(parse_tag_list("").is_empty());
        assert!(parse_tag_list("  ").is_empty());
        assert!(parse_tag_list("[]").is_empty());
        assert_eq!(parse_tag_list("a,, ,b"), vec!["a", "b"]);
    }

    #[test]
    fn duplicates_are_dropped() {
        assert_eq!(parse_tag_list("a, b, a"), vec!["a", "b"]);
    }

    #[test]
    fn color_comes_from_palette() {
        for _ in 0..20 {
            assert!(TAG_PALETTE.contains(&random_color()));
        }
    }
}
