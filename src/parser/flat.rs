//! Flat numbered-list documents
//!
//! ```text
//! ### Задания
//! 1. Найдите значение выражения ...
//! 5. Решите уравнение ...
//! ### Ответы
//! | № | Ответ |
//! |---|-------|
//! | 1 | 12 |
//! | 2 | -3 |
//! ```
//!
//! Tasks are keyed by appearance order, not by the number written in the
//! source line; answer rows are keyed by that appearance order.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DocumentFormat, ParseWarning, ParsedDocument, Sections, TaskParser};
use crate::domain::{Ordinal, ParsedTask};

static TASK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s+(.+)$").expect("Invalid flat task regex"));

static ANSWER_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\|\s*(\d+)\s*\|\s*(.+?)\s*\|$").expect("Invalid flat answer regex")
});

pub struct FlatParser;

impl TaskParser for FlatParser {
    fn parse(&self, body: &str) -> ParsedDocument {
        let sections = Sections::split(body);
        let mut warnings = Vec::new();

        let mut tasks: Vec<ParsedTask> = sections
            .tasks
            .iter()
            .filter_map(|line| TASK_LINE.captures(line.trim()))
            .enumerate()
            .map(|(index, caps)| ParsedTask::new(Ordinal::Seq(index as u32 + 1), caps[2].trim()))
            .collect();

        let mut answered = vec![false; tasks.len()];

        for line in &sections.answers {
            let Some(caps) = ANSWER_ROW.captures(line.trim()) else {
                continue;
            };
            let Ok(key) = caps[1].parse::<usize>() else {
                continue;
            };

            match key.checked_sub(1).and_then(|i| tasks.get_mut(i)) {
                Some(task) => {
                    task.answer = caps[2].trim().to_string();
                    answered[key - 1] = true;
                }
                None => warnings.push(ParseWarning::OrphanAnswer {
                    key: key.to_string(),
                }),
            }
        }

        let answers = answered.iter().filter(|a| **a).count();
        if answers != tasks.len() {
            warnings.push(ParseWarning::AnswerCountMismatch {
                tasks: tasks.len(),
                answers,
                missing: tasks
                    .iter()
                    .zip(&answered)
                    .filter(|(_, a)| !**a)
                    .map(|(t, _)| t.ordinal.to_string())
                    .collect(),
            });
        }

        tracing::debug!(tasks = tasks.len(), answers, "Parsed flat document");

        ParsedDocument {
            format: DocumentFormat::Flat,
            tasks,
            warnings,
        }
    }
}
