//! # Document Parser
//!
//! Converts a document body (everything after the metadata block) into
//! ordered [`ParsedTask`]s. Three Markdown dialects are supported; the
//! dialect is sniffed from the body, never passed in:
//!
//! | Format | Task line | Answers |
//! |--------|-----------|---------|
//! | [`Flat`](DocumentFormat::Flat) | `1. statement` under a `Задания` heading | table rows `\| 1 \| answer \|` |
//! | [`Inline`](DocumentFormat::Inline) | `**1** [2] statement` | inline `ответ:` / `tags:` lines |
//! | [`Composite`](DocumentFormat::Composite) | `14.3. [2] stem` + `а) ...` sub-parts | table rows `\| **14.3** \| **а)** 4; **б)** 6 \|` |
//!
//! Malformed lines are skipped. Inconsistencies (missing answers, orphan
//! answer rows, composite tasks without sub-parts) are reported as
//! [`ParseWarning`]s; only a body with no recognizable task section is an
//! error.

mod composite;
mod flat;
mod inline;

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::domain::ParsedTask;

pub use composite::{CompositeParser, CompositeScanner, ScanState};
pub use flat::FlatParser;
pub use inline::InlineParser;

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s*(.*?)\s*#*\s*$").expect("Invalid heading regex"));

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("No task section found (expected a 'Задания' heading or numbered task lines)")]
    MissingTaskSection,
}

/// The Markdown dialect of a document body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// Flat numbered list plus an answer table
    Flat,
    /// `**N** [d]` blocks with inline answer and tag lines
    Inline,
    /// `N.M. [d]` problems with lettered sub-parts and an answer table
    Composite,
}

impl DocumentFormat {
    /// Sniffs the dialect from the body's structure
    pub fn detect(body: &str) -> Option<Self> {
        let sections = Sections::split(body);

        if sections.tasks.iter().any(|l| composite::is_task_line(l)) {
            Some(DocumentFormat::Composite)
        } else if sections.tasks.iter().any(|l| inline::is_task_line(l)) {
            Some(DocumentFormat::Inline)
        } else if sections.has_tasks_heading {
            Some(DocumentFormat::Flat)
        } else {
            None
        }
    }

    fn parser(&self) -> &'static dyn TaskParser {
        match self {
            DocumentFormat::Flat => &FlatParser,
            DocumentFormat::Inline => &InlineParser,
            DocumentFormat::Composite => &CompositeParser,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Flat => write!(f, "flat"),
            DocumentFormat::Inline => write!(f, "inline"),
            DocumentFormat::Composite => write!(f, "composite"),
        }
    }
}

/// A recoverable inconsistency found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParseWarning {
    /// Fewer answers than tasks (or sub-parts)
    AnswerCountMismatch {
        tasks: usize,
        answers: usize,
        missing: Vec<String>,
    },
    /// An answer row whose key matches no task
    OrphanAnswer { key: String },
    /// Answer letters with no matching sub-part
    UnmatchedLetters { key: String, letters: Vec<char> },
    /// A composite task with no lettered sub-parts; it is not emitted
    EmptyComposite { key: String },
    /// An inline task with no statement text; it is not emitted
    EmptyStatement { key: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::AnswerCountMismatch {
                tasks,
                answers,
                missing,
            } => {
                write!(
                    f,
                    "answer count ({}) does not match task count ({})",
                    answers, tasks
                )?;
                if !missing.is_empty() {
                    let shown: Vec<&str> = missing.iter().take(10).map(String::as_str).collect();
                    write!(f, "; missing answers for: {}", shown.join(", "))?;
                    if missing.len() > 10 {
                        write!(f, "...")?;
                    }
                }
                Ok(())
            }
            ParseWarning::OrphanAnswer { key } => {
                write!(f, "answer row {} matches no task", key)
            }
            ParseWarning::UnmatchedLetters { key, letters } => {
                let letters: Vec<String> = letters.iter().map(char::to_string).collect();
                write!(
                    f,
                    "answers for {} reference unknown sub-parts: {}",
                    key,
                    letters.join(", ")
                )
            }
            ParseWarning::EmptyComposite { key } => {
                write!(f, "task {} has no lettered sub-parts and was dropped", key)
            }
            ParseWarning::EmptyStatement { key } => {
                write!(f, "task {} has no statement and was dropped", key)
            }
        }
    }
}

/// Result of parsing a document body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    pub format: DocumentFormat,
    pub tasks: Vec<ParsedTask>,
    pub warnings: Vec<ParseWarning>,
}

/// One dialect's parser
pub trait TaskParser {
    /// Parses a body known to be in this parser's dialect
    fn parse(&self, body: &str) -> ParsedDocument;
}

/// Sniffs the dialect and parses the body
pub fn parse_body(body: &str) -> Result<ParsedDocument, ParseError> {
    let format = DocumentFormat::detect(body).ok_or(ParseError::MissingTaskSection)?;
    tracing::debug!(%format, "Detected document format");
    Ok(format.parser().parse(body))
}

/// Body lines grouped by section
#[derive(Debug, Default)]
pub(crate) struct Sections<'a> {
    pub has_tasks_heading: bool,
    /// Lines under the tasks heading, or every line outside the answers
    /// section when the heading is absent
    pub tasks: Vec<&'a str>,
    /// Lines after the answers heading
    pub answers: Vec<&'a str>,
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Tasks,
    Answers,
}

impl<'a> Sections<'a> {
    pub fn split(body: &'a str) -> Self {
        let mut sections = Sections::default();
        let mut preamble = Vec::new();
        let mut current = Section::Preamble;

        for line in body.lines() {
            match heading_text(line) {
                Some(text) if is_tasks_heading(text) => {
                    sections.has_tasks_heading = true;
                    current = Section::Tasks;
                    continue;
                }
                Some(text) if is_answers_heading(text) => {
                    current = Section::Answers;
                    continue;
                }
                _ => {}
            }

            match current {
                Section::Preamble => preamble.push(line),
                Section::Tasks => sections.tasks.push(line),
                Section::Answers => sections.answers.push(line),
            }
        }

        if !sections.has_tasks_heading {
            preamble.append(&mut sections.tasks);
            sections.tasks = preamble;
        }

        sections
    }
}

/// Text of a Markdown heading line, `None` for any other line
pub(crate) fn heading_text(line: &str) -> Option<&str> {
    HEADING
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn is_tasks_heading(text: &str) -> bool {
    let text = text.to_lowercase();
    text == "задания" || text == "tasks"
}

fn is_answers_heading(text: &str) -> bool {
    let text = text.to_lowercase();
    text == "ответы" || text == "answers"
}
