//! Topic resolution
//!
//! Lookup mode matches a search term against every topic in the store and
//! hands ambiguity to a [`TopicChooser`]. Paragraph mode looks the topic up
//! by its `M<paragraph>` scope key and creates it when missing.

use serde_json::json;

use super::IngestError;
use crate::domain::{match_topic, paragraph_scope_key, Topic, TopicMatch};
use crate::storage::{Collection, Filter, ListQuery, RecordStore};

const TOPIC_FIELDS: [&str; 4] = ["id", "title", "ege_number", "subtopic"];

/// Why a chooser is being asked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceReason {
    /// Several topics matched the term
    Ambiguous,
    /// Nothing matched; the candidates are every known topic
    NoMatch,
}

/// Picks a topic when matching alone cannot
pub trait TopicChooser {
    /// Returns the chosen topic, or `None` to give up
    fn choose(&mut self, term: &str, reason: ChoiceReason, candidates: &[Topic]) -> Option<Topic>;
}

/// Chooser that never picks; ambiguity becomes a resolution error
pub struct NonInteractive;

impl TopicChooser for NonInteractive {
    fn choose(&mut self, _: &str, _: ChoiceReason, _: &[Topic]) -> Option<Topic> {
        None
    }
}

/// Resolves a search term against a topic list
pub fn resolve_topic(
    term: &str,
    topics: &[Topic],
    chooser: &mut dyn TopicChooser,
) -> Result<Topic, IngestError> {
    match match_topic(term, topics) {
        TopicMatch::Resolved(topic) => Ok(topic),
        TopicMatch::NeedsChoice(candidates) => chooser
            .choose(term, ChoiceReason::Ambiguous, &candidates)
            .ok_or_else(|| {
                IngestError::Resolution(format!(
                    "'{}' matches {} topics and none was selected",
                    term,
                    candidates.len()
                ))
            }),
        TopicMatch::NotFound => chooser
            .choose(term, ChoiceReason::NoMatch, topics)
            .ok_or_else(|| IngestError::Resolution(format!("No topic matches '{}'", term))),
    }
}

pub struct TopicResolver<'s> {
    store: &'s dyn RecordStore,
}

impl<'s> TopicResolver<'s> {
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self { store }
    }

    /// Lookup-only resolution by title
    pub fn lookup(&self, term: &str, chooser: &mut dyn TopicChooser) -> Result<Topic, IngestError> {
        let query = ListQuery::new().fields(&TOPIC_FIELDS);
        let topics: Vec<Topic> = self
            .store
            .list(Collection::Topics, &query)?
            .iter()
            .map(Topic::from)
            .collect();

        tracing::debug!(term, known = topics.len(), "Matching topic");
        let topic = resolve_topic(term, &topics, chooser)?;
        tracing::info!(topic = %topic.title, id = %topic.id, "Resolved topic");
        Ok(topic)
    }

    /// Lookup-or-create resolution for a textbook paragraph
    pub fn paragraph(&self, paragraph: &str, title: &str) -> Result<Topic, IngestError> {
        let key = paragraph_scope_key(paragraph);
        let query = ListQuery::new()
            .filter(Filter::eq("ege_number", key.as_str()))
            .fields(&TOPIC_FIELDS);

        if let Some(record) = self.store.list(Collection::Topics, &query)?.first() {
            let topic = Topic::from(record);
            tracing::info!(topic = %topic.title, id = %topic.id, "Topic already exists");
            return Ok(topic);
        }

        let record = self.store.create(
            Collection::Topics,
            &json!({
                "title": title,
                "ege_number": key,
                "description": format!("Задачник Мордкович, §{}", paragraph.trim()),
            }),
        )?;
        tracing::info!(topic = title, id = %record.id, "Created topic for §{}", paragraph.trim());
        Ok(Topic::from(&record))
    }

    /// Writes a subtopic onto a topic. Failures are logged and ignored.
    pub fn set_subtopic(&self, topic: &mut Topic, subtopic: &str) {
        if topic.subtopic.as_deref() == Some(subtopic) {
            return;
        }

        match self
            .store
            .update(Collection::Topics, &topic.id, &json!({ "subtopic": subtopic }))
        {
            Ok(_) => {
                tracing::info!(topic = %topic.title, subtopic, "Updated subtopic");
                topic.subtopic = Some(subtopic.to_string());
            }
            Err(e) => tracing::warn!(topic = %topic.title, error = %e, "Failed to update subtopic"),
        }
    }
}
