//! Multi-part composite problems
//!
//! ```text
//! ## Задания
//! **14.3.** [2] Вычислите:
//! а) 2 + 2
//! б) 3 + 3
//!
//! ## Ответы
//! | № | Ответ |
//! |---|-------|
//! | **14.3** | **а)** 4; **б)** 6 |
//! ```
//!
//! Task bodies are read by [`CompositeScanner`], a line-driven state
//! machine:
//!
//! | State | Task header | Sub-part `а) ..` | Heading | Other text |
//! |-------|-------------|------------------|---------|------------|
//! | `BeforeTask` | open task → `InStem` | ignore | ignore | ignore |
//! | `InStem` | close, open → `InStem` | add part → `InSubpart` | close → `BeforeTask` | extend stem |
//! | `InSubpart` | close, open → `InStem` | add part | close → `BeforeTask` | extend part |
//!
//! The remainder of a task header line is scanned as if it were the next
//! line. Each sub-part statement is the stem followed by a space and the
//! sub-part text; tasks that close without sub-parts are dropped.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{heading_text, DocumentFormat, ParseWarning, ParsedDocument, Sections, TaskParser};
use crate::domain::{normalize_letter, Ordinal, ParsedTask, Subtask};

static TASK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\*\*)?(\d+\.\d+)\.(?:\*\*)?\s*\[\s*(\d+)\s*\]\s*(.*)$")
        .expect("Invalid composite task regex")
});

static SUBPART_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([а-гa-d])\)\s*(.+)$").expect("Invalid sub-part regex"));

static ANSWER_ROW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|\s*\*\*(\d+\.\d+)\*\*\s*\|\s*(.*?)\s*\|").expect("Invalid composite answer regex")
});

static SUBANSWER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\*\*([а-гa-d])\)\*\*\s*([^;|]+)").expect("Invalid sub-answer regex")
});

pub(crate) fn is_task_line(line: &str) -> bool {
    TASK_LINE.is_match(line.trim())
}

/// Scanner position relative to the current task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    BeforeTask,
    InStem,
    InSubpart,
}

/// Task being scanned
struct OpenTask {
    key: String,
    difficulty: Option<u32>,
    stem: Vec<String>,
    /// Normalized letter and raw text, in order of appearance
    parts: Vec<(char, String)>,
}

/// Line-driven state machine over the task section
pub struct CompositeScanner {
    state: ScanState,
    open: Option<OpenTask>,
    tasks: Vec<ParsedTask>,
    warnings: Vec<ParseWarning>,
}

impl Default for CompositeScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::BeforeTask,
            open: None,
            tasks: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Feeds one line of the task section
    pub fn feed(&mut self, line: &str) {
        let line = line.trim();

        if let Some(caps) = TASK_LINE.captures(line) {
            self.close();
            self.open = Some(OpenTask {
                key: caps[1].to_string(),
                difficulty: caps[2].parse().ok(),
                stem: Vec::new(),
                parts: Vec::new(),
            });
            self.state = ScanState::InStem;

            let rest = caps[3].trim();
            if !rest.is_empty() {
                self.feed_body(rest);
            }
            return;
        }

        if heading_text(line).is_some() {
            self.close();
            return;
        }

        if !line.is_empty() {
            self.feed_body(line);
        }
    }

    /// Handles a non-empty line that is neither a task header nor a heading
    fn feed_body(&mut self, line: &str) {
        let Some(open) = self.open.as_mut() else {
            return;
        };

        if let Some(caps) = SUBPART_LINE.captures(line) {
            let letter = caps[1].chars().next().map(normalize_letter);
            if let Some(letter) = letter {
                open.parts.push((letter, caps[2].trim().to_string()));
                self.state = ScanState::InSubpart;
            }
            return;
        }

        match self.state {
            ScanState::InStem => open.stem.push(line.to_string()),
            ScanState::InSubpart => {
                if let Some((_, text)) = open.parts.last_mut() {
                    text.push(' ');
                    text.push_str(line);
                }
            }
            ScanState::BeforeTask => {}
        }
    }

    /// Closes the current task, emitting it if it has sub-parts
    fn close(&mut self) {
        self.state = ScanState::BeforeTask;
        let Some(open) = self.open.take() else {
            return;
        };

        if open.parts.is_empty() {
            tracing::debug!(task = %open.key, "Dropping composite task without sub-parts");
            self.warnings
                .push(ParseWarning::EmptyComposite { key: open.key });
            return;
        }

        let stem = open.stem.join("\n").trim().to_string();
        let mut task = ParsedTask::new(Ordinal::Composite(open.key), stem.clone());
        task.difficulty = open.difficulty;

        for (letter, text) in open.parts {
            let statement = if stem.is_empty() {
                text
            } else {
                format!("{} {}", stem, text)
            };
            task.push_subtask(Subtask {
                letter,
                statement,
                answer: String::new(),
            });
        }

        self.tasks.push(task);
    }

    /// Closes any open task and returns what was scanned
    pub fn finish(mut self) -> (Vec<ParsedTask>, Vec<ParseWarning>) {
        self.close();
        (self.tasks, self.warnings)
    }
}

/// Parses answer-key rows into `task key -> letter -> answer`
fn parse_answer_key(lines: &[&str]) -> HashMap<String, HashMap<char, String>> {
    let mut key = HashMap::new();

    for line in lines {
        for row in ANSWER_ROW.captures_iter(line) {
            let answers: HashMap<char, String> = SUBANSWER
                .captures_iter(&row[2])
                .filter_map(|caps| {
                    let letter = caps[1].chars().next().map(normalize_letter)?;
                    Some((letter, caps[2].trim().to_string()))
                })
                .collect();

            if !answers.is_empty() {
                key.insert(row[1].to_string(), answers);
            }
        }
    }

    key
}

pub struct CompositeParser;

impl TaskParser for CompositeParser {
    fn parse(&self, body: &str) -> ParsedDocument {
        let sections = Sections::split(body);

        let mut scanner = CompositeScanner::new();
        for line in &sections.tasks {
            scanner.feed(line);
        }
        let (mut tasks, mut warnings) = scanner.finish();

        let mut answer_key = parse_answer_key(&sections.answers);
        let mut total = 0;
        let mut missing = Vec::new();

        for task in &mut tasks {
            let key = task.ordinal.to_string();
            let mut answers = answer_key.remove(&key).unwrap_or_default();

            for sub in &mut task.subtasks {
                total += 1;
                match answers.remove(&sub.letter) {
                    Some(answer) => sub.answer = answer,
                    None => missing.push(format!("{}{}", key, sub.letter)),
                }
            }

            if !answers.is_empty() {
                let mut letters: Vec<char> = answers.into_keys().collect();
                letters.sort_unstable();
                warnings.push(ParseWarning::UnmatchedLetters { key, letters });
            }
        }

        let mut orphans: Vec<String> = answer_key.into_keys().collect();
        orphans.sort();
        warnings.extend(orphans.into_iter().map(|key| ParseWarning::OrphanAnswer { key }));

        if !missing.is_empty() {
            warnings.push(ParseWarning::AnswerCountMismatch {
                tasks: total,
                answers: total - missing.len(),
                missing,
            });
        }

        tracing::debug!(tasks = tasks.len(), subtasks = total, "Parsed composite document");

        ParsedDocument {
            format: DocumentFormat::Composite,
            tasks,
            warnings,
        }
    }
}
