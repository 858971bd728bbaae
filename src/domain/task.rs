//! Task domain model
//!
//! A parsed document yields [`ParsedTask`]s, each optionally split into
//! lettered [`Subtask`]s. The orchestrator flattens them into
//! [`TaskUnit`]s (one per record to write) and turns every surviving unit
//! into a [`TaskRecord`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal key of a parsed task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ordinal {
    /// Appearance-order or literal integer key (`1`, `2`, ...)
    Seq(u32),
    /// Paragraph-style composite key (`14.3`)
    Composite(String),
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ordinal::Seq(n) => write!(f, "{}", n),
            Ordinal::Composite(key) => write!(f, "{}", key),
        }
    }
}

/// Normalizes a sub-part letter: Cyrillic а/б/в/г become Latin a/b/c/d.
///
/// Any other letter passes through unchanged.
pub fn normalize_letter(letter: char) -> char {
    match letter {
        'а' => 'a',
        'б' => 'b',
        'в' => 'c',
        'г' => 'd',
        other => other,
    }
}

/// A lettered sub-part of a composite task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// Normalized (Latin) letter
    pub letter: char,

    /// Full statement: instruction stem joined with the sub-part text
    pub statement: String,

    /// Answer from the answer key, empty when missing
    pub answer: String,
}

/// One numbered unit extracted from a document body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTask {
    pub ordinal: Ordinal,

    /// Statement text; for composite tasks this is the shared stem
    pub statement: String,

    /// Answer text, empty when the document has none for this task
    pub answer: String,

    /// Per-task difficulty, overriding the document default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u32>,

    /// Per-task tag titles (unresolved)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
}

impl ParsedTask {
    /// Creates a task with a statement and no answer, tags or sub-parts
    pub fn new(ordinal: Ordinal, statement: impl Into<String>) -> Self {
        Self {
            ordinal,
            statement: statement.into(),
            answer: String::new(),
            difficulty: None,
            tags: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    /// Inserts a sub-part, replacing an earlier one with the same letter
    pub fn push_subtask(&mut self, subtask: Subtask) {
        match self.subtasks.iter_mut().find(|s| s.letter == subtask.letter) {
            Some(existing) => *existing = subtask,
            None => self.subtasks.push(subtask),
        }
    }

    /// Flattens this task into the units that become records, in order.
    ///
    /// A task with sub-parts yields one unit per sub-part; a plain task
    /// yields itself.
    pub fn units(&self) -> Vec<TaskUnit> {
        if self.subtasks.is_empty() {
            return vec![TaskUnit {
                label: self.ordinal.to_string(),
                statement: self.statement.trim().to_string(),
                answer: self.answer.clone(),
                difficulty: self.difficulty,
                tags: self.tags.clone(),
            }];
        }

        self.subtasks
            .iter()
            .map(|sub| TaskUnit {
                label: format!("{}{}", self.ordinal, sub.letter),
                statement: sub.statement.trim().to_string(),
                answer: sub.answer.clone(),
                difficulty: self.difficulty,
                tags: self.tags.clone(),
            })
            .collect()
    }
}

/// A single candidate record: one plain task or one sub-part
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskUnit {
    /// Human label used in logs and citations (`7`, `14.3b`)
    pub label: String,
    pub statement: String,
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// The unit persisted to the `tasks` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub code: String,

    /// Topic record id
    pub topic: String,

    /// String-encoded integer
    pub difficulty: String,

    #[serde(rename = "statement_md")]
    pub statement: String,

    pub answer: String,

    #[serde(default)]
    pub solution_md: String,

    #[serde(default)]
    pub explanation_md: String,

    pub source: String,

    pub year: i32,

    /// Tag record ids
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub has_image: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn composite_task() -> ParsedTask {
        let mut task = ParsedTask::new(Ordinal::Composite("14.3".to_string()), "Вычислите:");
        task.difficulty = Some(2);
        task.push_subtask(Subtask {
            letter: 'a',
            statement: "Вычислите: 2+2".to_string(),
            answer: "4".to_string(),
        });
        task.push_subtask(Subtask {
            letter: 'b',
            statement: "Вычислите: 3+3".to_string(),
            answer: String::new(),
        });
        task
    }

    #[test]
    fn letters_normalize() {
        assert_eq!(normalize_letter('а'), 'a');
        assert_eq!(normalize_letter('б'), 'b');
        assert_eq!(normalize_letter('в'), 'c');
        assert_eq!(normalize_letter('г'), 'd');
    }

    #[test]
    fn latin_and_unmapped_letters_pass_through() {
        for letter in ['a', 'b', 'c', 'd', 'д', 'x'] {
            assert_eq!(normalize_letter(letter), letter);
        }
    }

    #[test]
    fn ordinal_display() {
        assert_eq!(Ordinal::Seq(12).to_string(), "12");
        assert_eq!(Ordinal::Composite("14.3".into()).to_string(), "14.3");
    }

    #[test]
    fn plain_task_is_one_unit() {
        let mut task = ParsedTask::new(Ordinal::Seq(3), "  Solve x+1=2 ");
        task.answer = "1".to_string();
        task.tags = vec!["Алгебра".to_string()];

        let units = task.units();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].label, "3");
        assert_eq!(units[0].statement, "Solve x+1=2");
        assert_eq!(units[0].answer, "1");
        assert_eq!(units[0].tags, vec!["Алгебра"]);
    }

    #[test]
    fn composite_task_yields_unit_per_subtask() {
        let units = composite_task().units();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].label, "14.3a");
        assert_eq!(units[0].statement, "Вычислите: 2+2");
        assert_eq!(units[0].difficulty, Some(2));
        assert_eq!(units[1].label, "14.3b");
        assert_eq!(units[1].answer, "");
    }

    #[test]
    fn repeated_letter_replaces_subtask() {
        let mut task = composite_task();
        task.push_subtask(Subtask {
            letter: 'a',
            statement: "Вычислите: 5+5".to_string(),
            answer: String::new(),
        });

        assert_eq!(task.subtasks.len(), 2);
        assert_eq!(task.subtasks[0].statement, "Вычислите: 5+5");
    }

    #[test]
    fn record_serializes_store_field_names() {
        let record = TaskRecord {
            code: "7-001".to_string(),
            topic: "topic1".to_string(),
            difficulty: "2".to_string(),
            statement: "Solve".to_string(),
            answer: "1".to_string(),
            solution_md: String::new(),
            explanation_md: String::new(),
            source: "Не указан".to_string(),
            year: 2026,
            tags: vec![],
            has_image: false,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["statement_md"], "Solve");
        assert_eq!(json["difficulty"], "2");
        assert!(json.get("tags").is_none());
        assert_eq!(json["has_image"], false);
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(letter in any::<char>()) {
            let once = normalize_letter(letter);
            prop_assert_eq!(normalize_letter(once), once);
            if !['а', 'б', 'в', 'г'].contains(&letter) {
                prop_assert_eq!(once, letter);
            }
        }
    }
}
