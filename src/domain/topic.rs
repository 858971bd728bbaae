//! Topic model and the pure topic-matching rule
//!
//! Matching order for a search term:
//! 1. exact title match (case-sensitive) wins immediately
//! 2. otherwise case-insensitive substring match over all titles
//! 3. one fuzzy match is selected; several need a caller choice; none is
//!    [`TopicMatch::NotFound`]

use serde::{Deserialize, Serialize};

/// A topic record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,

    /// Scope key used for code generation (`7`, `M14`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ege_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtopic: Option<String>,
}

impl Topic {
    /// Returns the scope key, if set and non-empty
    pub fn scope_key(&self) -> Option<&str> {
        self.ege_number
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

/// Scope key for a paragraph-based topic (`14` -> `M14`)
pub fn paragraph_scope_key(paragraph: &str) -> String {
    format!("M{}", paragraph.trim())
}

/// Outcome of matching a search term against existing topics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicMatch {
    Resolved(Topic),
    NeedsChoice(Vec<Topic>),
    NotFound,
}

/// Matches a search term against the existing topics
pub fn match_topic(term: &str, topics: &[Topic]) -> TopicMatch {
    let term = term.trim();

    if let Some(exact) = topics.iter().find(|t| t.title == term) {
        return TopicMatch::Resolved(exact.clone());
    }

    let needle = term.to_lowercase();
    let mut matches: Vec<Topic> = topics
        .iter()
        .filter(|t| t.title.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    match matches.len() {
        0 => TopicMatch::NotFound,
        1 => TopicMatch::Resolved(matches.remove(0)),
        _ => TopicMatch::NeedsChoice(matches),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: &str, title: &str) -> Topic {
        Topic {
            id: id.to_string(),
            title: title.to_string(),
            ege_number: None,
            subtopic: None,
        }
    }

    fn topics() -> Vec<Topic> {
        vec![
            topic("t1", "Логарифмы"),
            topic("t2", "Логарифмические уравнения"),
            topic("t3", "Тригонометрия"),
        ]
    }

    #[test]
    fn exact_match_wins_over_fuzzy() {
        assert_eq!(
            match_topic("Логарифмы", &topics()),
            TopicMatch::Resolved(topic("t1", "Логарифмы"))
        );
    }

    #[test]
    fn single_fuzzy_match_is_selected() {
        assert_eq!(
            match_topic("тригоно", &topics()),
            TopicMatch::Resolved(topic("t3", "Тригонометрия"))
        );
    }

    #[test]
    fn several_fuzzy_matches_need_choice() {
        match match_topic("логариф", &topics()) {
            TopicMatch::NeedsChoice(candidates) => {
                let ids: Vec<_> = candidates.iter().map(|t| t.id.as_str()).collect();
                assert_eq!(ids, vec!["t1", "t2"]);
            }
            other => panic!("unexpected match: {:?}", other),
        }
    }

    #[test]
    fn no_match() {
        assert_eq!(match_topic("Геометрия", &topics()), TopicMatch::NotFound);
        assert_eq!(match_topic("x", &[]), TopicMatch::NotFound);
    }

    #[test]
    fn scope_key_ignores_blank() {
        let mut t = topic("t1", "A");
        assert_eq!(t.scope_key(), None);
        t.ege_number = Some(" ".to_string());
        assert_eq!(t.scope_key(), None);
        t.ege_number = Some("7".to_string());
        assert_eq!(t.scope_key(), Some("7"));
    }

    #[test]
    fn paragraph_key() {
        assert_eq!(paragraph_scope_key("14"), "M14");
    }
}
