//! Inline record blocks
//!
//! ```text
//! **1** [2] Решите уравнение
//! x + 1 = 2
//! ответ: x=1
//! tags: Алгебра, Уравнения
//!
//! **2** [1] ...
//! ```
//!
//! Statement lines accumulate until an `ответ:` or `tags:` line. A new
//! `**N**` line, a heading, or the end of input closes the current task.
//! A task that closes without statement text is dropped with a warning.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{heading_text, DocumentFormat, ParseWarning, ParsedDocument, Sections, TaskParser};
use crate::domain::{parse_tag_list, Ordinal, ParsedTask};

static TASK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\*\*(\d+)\*\*\s*(?:\[\s*(\d+)\s*\]\s*)?(.*)$").expect("Invalid inline task regex")
});

static ANSWER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:ответ|answer)\s*:\s*(.*)$").expect("Invalid inline answer regex")
});

static TAGS_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:tags|теги)\s*:\s*(.*)$").expect("Invalid inline tags regex"));

pub(crate) fn is_task_line(line: &str) -> bool {
    TASK_LINE.is_match(line.trim())
}

pub struct InlineParser;

/// Task under construction
struct OpenTask {
    task: ParsedTask,
    /// False once an answer or tags line closed the statement
    accepting_statement: bool,
}

/// Moves the open task, if any, into the finished list
fn close(
    open: &mut Option<OpenTask>,
    tasks: &mut Vec<ParsedTask>,
    warnings: &mut Vec<ParseWarning>,
) {
    let Some(OpenTask { task, .. }) = open.take() else {
        return;
    };

    if task.statement.trim().is_empty() {
        warnings.push(ParseWarning::EmptyStatement {
            key: task.ordinal.to_string(),
        });
    } else {
        tasks.push(task);
    }
}

impl TaskParser for InlineParser {
    fn parse(&self, body: &str) -> ParsedDocument {
        let sections = Sections::split(body);
        let mut tasks = Vec::new();
        let mut warnings = Vec::new();
        let mut open: Option<OpenTask> = None;

        for line in &sections.tasks {
            let line = line.trim();

            if heading_text(line).is_some() {
                close(&mut open, &mut tasks, &mut warnings);
                continue;
            }

            if let Some(caps) = TASK_LINE.captures(line) {
                close(&mut open, &mut tasks, &mut warnings);

                let Ok(number) = caps[1].parse::<u32>() else {
                    continue;
                };
                let mut task = ParsedTask::new(Ordinal::Seq(number), caps[3].trim());
                task.difficulty = caps.get(2).and_then(|d| d.as_str().parse().ok());
                open = Some(OpenTask {
                    task,
                    accepting_statement: true,
                });
                continue;
            }

            let Some(current) = open.as_mut() else {
                continue;
            };

            if line.is_empty() {
                continue;
            }

            if let Some(caps) = ANSWER_LINE.captures(line) {
                current.task.answer = caps[1].trim().to_string();
                current.accepting_statement = false;
            } else if let Some(caps) = TAGS_LINE.captures(line) {
                for title in parse_tag_list(&caps[1]) {
                    if !current.task.tags.contains(&title) {
                        current.task.tags.push(title);
                    }
                }
                current.accepting_statement = false;
            } else if current.accepting_statement {
                let statement = &mut current.task.statement;
                if !statement.is_empty() {
                    statement.push('\n');
                }
                statement.push_str(line);
            } else {
                tracing::debug!(task = %current.task.ordinal, line, "Ignoring line after answer");
            }
        }

        close(&mut open, &mut tasks, &mut warnings);

        tracing::debug!(tasks = tasks.len(), "Parsed inline document");

        ParsedDocument {
            format: DocumentFormat::Inline,
            tasks,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_task_with_answer_and_tags() {
        let doc = InlineParser.parse("**1** [2] Solve x+1=2\nответ: x=1\ntags: Алгебра\n");
        assert_eq!(doc.tasks.len(), 1);

        let task = &doc.tasks[0];
        assert_eq!(task.ordinal, Ordinal::Seq(1));
        assert_eq!(task.difficulty, Some(2));
        assert_eq!(task.statement, "Solve x+1=2");
        assert_eq!(task.answer, "x=1");
        assert_eq!(task.tags, vec!["Алгебра"]);
    }

    #[test]
    fn statement_spans_lines_until_answer() {
        let body = "**3** [1] Решите уравнение\n\nx + 1 = 2\nна отрезке [0; 5]\nОтвет: 1\nлишняя строка\n";
        let doc = InlineParser.parse(body);

        assert_eq!(
            doc.tasks[0].statement,
            "Решите уравнение\nx + 1 = 2\nна отрезке [0; 5]"
        );
        assert_eq!(doc.tasks[0].answer, "1");
    }

    #[test]
    fn tags_line_closes_statement() {
        let body = "**1** [1] a\ntags: [x, y]\nb\nответ: 2";
        let doc = InlineParser.parse(body);
        assert_eq!(doc.tasks[0].statement, "a");
        assert_eq!(doc.tasks[0].tags, vec!["x", "y"]);
        assert_eq!(doc.tasks[0].answer, "2");
    }

    #[test]
    fn new_task_line_closes_previous() {
        let body = "**1** [1] first\n**2** [3] second\nответ: 5\n";
        let doc = InlineParser.parse(body);

        assert_eq!(doc.tasks.len(), 2);
        assert_eq!(doc.tasks[0].answer, "");
        assert_eq!(doc.tasks[1].difficulty, Some(3));
        assert_eq!(doc.tasks[1].answer, "5");
    }

    #[test]
    fn difficulty_bracket_is_optional() {
        let doc = InlineParser.parse("**4** Найдите x\nответ: 0");
        assert_eq!(doc.tasks[0].difficulty, None);
        assert_eq!(doc.tasks[0].statement, "Найдите x");
    }

    #[test]
    fn statement_may_start_on_next_line() {
        let doc = InlineParser.parse("**1** [2]\nНайдите x\nответ: 0");
        assert_eq!(doc.tasks[0].statement, "Найдите x");
    }

    #[test]
    fn task_without_statement_is_dropped() {
        let doc = InlineParser.parse("**1** [2]\nответ: 5\n**2** [1] Real\nответ: 1\n**3**\n");

        assert_eq!(doc.tasks.len(), 1);
        assert_eq!(doc.tasks[0].statement, "Real");
        assert_eq!(
            doc.warnings,
            vec![
                ParseWarning::EmptyStatement { key: "1".into() },
                ParseWarning::EmptyStatement { key: "3".into() },
            ]
        );
    }

    #[test]
    fn heading_closes_task() {
        let body = "**1** [1] a\n## Раздел\nне часть задачи\n**2** [1] b";
        let doc = InlineParser.parse(body);
        assert_eq!(doc.tasks.len(), 2);
        assert_eq!(doc.tasks[0].statement, "a");
    }

    #[test]
    fn lines_before_first_task_are_skipped() {
        let doc = InlineParser.parse("Вступление\nответ: 7\n**1** [1] a");
        assert_eq!(doc.tasks.len(), 1);
        assert_eq!(doc.tasks[0].answer, "");
    }

    #[test]
    fn task_line_detection() {
        assert!(is_task_line("**12** [3] text"));
        assert!(is_task_line("  **1** text"));
        assert!(!is_task_line("**bold** text"));
        assert!(!is_task_line("1. text"));
    }
}
