//! # Storage Layer
//!
//! Access to the external record store and local configuration.
//!
//! ## Collections
//!
//! | Collection | Fields used |
//! |------------|-------------|
//! | `topics` | `title`, `ege_number` (scope key), `subtopic`, `description` |
//! | `tags` | `title`, `color` |
//! | `tasks` | `code`, `topic`, `difficulty`, `statement_md`, `answer`, `source`, `year`, `tags`, `has_image` |
//!
//! ## Key Types
//!
//! - [`RecordStore`] - CRUD over the collections; every pipeline component
//!   takes the store explicitly
//! - [`PocketBaseClient`] - HTTP implementation holding its own auth token
//! - [`MemoryStore`] - in-process implementation for tests and previews
//! - [`Config`] - store location, credentials, source folders and defaults

mod config;
mod memory;
mod pocketbase;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::{Tag, Topic};

pub use config::{Config, ConfigError, Credentials, DefaultsConfig, SourcesConfig, StoreConfig};
pub use memory::MemoryStore;
pub use pocketbase::PocketBaseClient;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Store returned {status} for {context}: {body}")]
    Api {
        status: u16,
        context: String,
        body: String,
    },

    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: Collection, id: String },

    #[error("Failed to decode store response: {0}")]
    Decode(String),

    #[error("Store rejected the write: {0}")]
    Rejected(String),
}

/// A record collection in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Topics,
    Tags,
    Tasks,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Topics => "topics",
            Collection::Tags => "tags",
            Collection::Tasks => "tasks",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored record: its id plus every other field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Returns a field rendered as text (strings and numbers), if non-empty
    pub fn text(&self, field: &str) -> Option<String> {
        let text = match self.fields.get(field)? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl From<&Record> for Topic {
    fn from(record: &Record) -> Self {
        Topic {
            id: record.id.clone(),
            title: record.text("title").unwrap_or_default(),
            ege_number: record.text("ege_number"),
            subtopic: record.text("subtopic"),
        }
    }
}

impl From<&Record> for Tag {
    fn from(record: &Record) -> Self {
        Tag {
            id: record.id.clone(),
            title: record.text("title").unwrap_or_default(),
            color: record.text("color").unwrap_or_default(),
        }
    }
}

/// Equality predicate over one string field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    field: String,
    value: String,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Renders the filter in PocketBase syntax: `field = "value"`
    pub fn render(&self) -> String {
        let escaped = self.value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("{} = \"{}\"", self.field, escaped)
    }

    /// Evaluates the filter against a record
    pub fn matches(&self, record: &Record) -> bool {
        if self.field == "id" {
            return record.id == self.value;
        }
        record.text(&self.field).unwrap_or_default() == self.value
    }
}

/// Parameters of a list call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: Option<Filter>,
    /// Field projection; `None` returns every field
    pub fields: Option<Vec<String>>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(fields.iter().map(|f| f.to_string()).collect());
        self
    }
}

/// CRUD access to the record store
///
/// Calls block until the store answers. Implementations hold whatever
/// session state they need (e.g. an auth token); callers never do.
pub trait RecordStore {
    /// Lists every record matching the query (all pages)
    fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Record>, StoreError>;

    /// Fetches one record by id
    fn get(&self, collection: Collection, id: &str) -> Result<Record, StoreError>;

    /// Creates a record and returns it as stored
    fn create(&self, collection: Collection, fields: &Value) -> Result<Record, StoreError>;

    /// Patches a record and returns it as stored
    fn update(&self, collection: Collection, id: &str, fields: &Value)
        -> Result<Record, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn record_flattens_fields() {
        let rec = record(json!({"id": "abc", "title": "Логарифмы", "ege_number": 5}));
        assert_eq!(rec.id, "abc");
        assert_eq!(rec.text("title").as_deref(), Some("Логарифмы"));
        assert_eq!(rec.text("ege_number").as_deref(), Some("5"));
        assert_eq!(rec.text("missing"), None);
    }

    #[test]
    fn topic_from_record() {
        let rec = record(json!({"id": "t1", "title": "A", "ege_number": "", "subtopic": "2"}));
        let topic = Topic::from(&rec);
        assert_eq!(topic.ege_number, None);
        assert_eq!(topic.subtopic.as_deref(), Some("2"));
    }

    #[test]
    fn filter_render_escapes_quotes() {
        let filter = Filter::eq("title", r#"Say "hi" \o/"#);
        assert_eq!(filter.render(), r#"title = "Say \"hi\" \\o/""#);
    }

    #[test]
    fn filter_matches_text_and_id() {
        let rec = record(json!({"id": "x1", "topic": "t1", "year": 2026}));
        assert!(Filter::eq("topic", "t1").matches(&rec));
        assert!(Filter::eq("year", "2026").matches(&rec));
        assert!(Filter::eq("id", "x1").matches(&rec));
        assert!(!Filter::eq("topic", "t2").matches(&rec));
    }
}
