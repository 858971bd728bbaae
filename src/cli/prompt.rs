//! Interactive topic selection on the terminal

use std::io::{self, BufRead, Write};

use crate::domain::Topic;
use crate::ingest::{ChoiceReason, TopicChooser};

/// Topics listed when nothing matched the search term
const NO_MATCH_LISTING: usize = 20;

/// Asks on stderr, reads the answer from stdin
pub struct PromptChooser<R> {
    input: R,
}

impl PromptChooser<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self {
            input: io::stdin().lock(),
        }
    }
}

impl<R: BufRead> PromptChooser<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }

    fn read_answer(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

/// Picks a topic by 1-based number or exact title
fn pick(answer: &str, candidates: &[Topic]) -> Option<Topic> {
    if let Ok(n) = answer.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| candidates.get(i)).cloned();
    }
    candidates.iter().find(|t| t.title == answer).cloned()
}

impl<R: BufRead> TopicChooser for PromptChooser<R> {
    fn choose(&mut self, term: &str, reason: ChoiceReason, candidates: &[Topic]) -> Option<Topic> {
        if candidates.is_empty() {
            return None;
        }

        let mut err = io::stderr().lock();
        let shown = match reason {
            ChoiceReason::Ambiguous => {
                let _ = writeln!(err, "Found {} topics matching '{}':", candidates.len(), term);
                candidates.len()
            }
            ChoiceReason::NoMatch => {
                let _ = writeln!(err, "No topics contain '{}'. Available topics:", term);
                candidates.len().min(NO_MATCH_LISTING)
            }
        };
        for (i, topic) in candidates.iter().take(shown).enumerate() {
            let _ = writeln!(err, "  {}. {}", i + 1, topic.title);
        }
        let _ = write!(err, "Enter a topic number or exact title: ");
        let _ = err.flush();
        drop(err);

        let answer = self.read_answer()?;
        let chosen = pick(&answer, candidates);
        if let Some(topic) = &chosen {
            tracing::info!(topic = %topic.title, "Selected topic");
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topics() -> Vec<Topic> {
        ["Логарифмы", "Логарифмические уравнения"]
            .iter()
            .enumerate()
            .map(|(i, title)| Topic {
                id: format!("t{}", i + 1),
                title: title.to_string(),
                ege_number: None,
                subtopic: None,
            })
            .collect()
    }

    #[test]
    fn choose_by_number() {
        let mut chooser = PromptChooser::new("2\n".as_bytes());
        let topic = chooser.choose("лог", ChoiceReason::Ambiguous, &topics());
        assert_eq!(topic.map(|t| t.id), Some("t2".to_string()));
    }

    #[test]
    fn choose_by_exact_title() {
        let mut chooser = PromptChooser::new("Логарифмы\n".as_bytes());
        let topic = chooser.choose("x", ChoiceReason::NoMatch, &topics());
        assert_eq!(topic.map(|t| t.id), Some("t1".to_string()));
    }

    #[test]
    fn invalid_or_missing_answer() {
        for input in ["0\n", "7\n", "unknown\n", ""] {
            let mut chooser = PromptChooser::new(input.as_bytes());
            assert_eq!(chooser.choose("лог", ChoiceReason::Ambiguous, &topics()), None);
        }
    }
}
