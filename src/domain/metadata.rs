//! Source documents and their metadata block
//!
//! A source document is UTF-8 Markdown opening with a YAML block delimited
//! by `---` lines:
//!
//! ```text
//! ---
//! topic: Логарифмы
//! difficulty: 1
//! source: Сборник
//! year: 2026
//! tags: тег1, тег2
//! ---
//! ### Задания
//! ...
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use thiserror::Error;

use super::tag::parse_tag_list;

static FRONTMATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)^---[ \t]*\r?\n(.*?)\r?\n---[ \t]*(?:\r?\n|\z)")
        .expect("Invalid frontmatter regex")
});

static SPLIT_FILE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+-(\d+)\.md$").expect("Invalid file name regex"));

#[derive(Debug, Error, PartialEq)]
pub enum MetadataError {
    #[error("Metadata block not found (document must start with a '---' delimited block)")]
    MissingBlock,

    #[error("Failed to parse metadata block: {0}")]
    Invalid(String),

    #[error("Metadata field 'topic' is required")]
    MissingTopic,
}

/// Raw text of one Markdown file
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// File name, used to infer a subtopic (`16-2.md` -> `2`)
    pub name: Option<String>,
    pub text: String,
}

impl SourceDocument {
    pub fn new(name: Option<String>, text: impl Into<String>) -> Self {
        Self {
            name,
            text: text.into(),
        }
    }

    /// Reads a document from disk
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read document: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());

        Ok(Self { name, text })
    }

    /// Splits the metadata block from the body
    pub fn split(&self) -> Result<(&str, &str), MetadataError> {
        let caps = FRONTMATTER
            .captures(&self.text)
            .ok_or(MetadataError::MissingBlock)?;

        let block = caps.get(1).map_or("", |m| m.as_str());
        let body_start = caps.get(0).map_or(0, |m| m.end());
        Ok((block, &self.text[body_start..]))
    }

    /// Subtopic encoded in a `<n>-<m>.md` file name
    pub fn subtopic_from_name(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        SPLIT_FILE_NAME
            .captures(name)
            .map(|caps| caps[1].to_string())
    }
}

/// Metadata block as written; every field is loosely typed
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    topic: Option<Value>,
    subtopic: Option<Value>,
    paragraph: Option<Value>,
    difficulty: Option<Value>,
    source: Option<Value>,
    year: Option<Value>,
    tags: Option<Value>,
}

/// Parsed document metadata
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DocumentMeta {
    pub topic: String,
    pub subtopic: Option<String>,
    pub paragraph: Option<String>,
    pub difficulty: Option<String>,
    pub source: Option<String>,
    pub year: Option<i32>,
    /// Global tag titles, trimmed and non-empty
    pub tags: Vec<String>,
}

impl DocumentMeta {
    /// Parses the YAML content of a metadata block
    pub fn parse(block: &str) -> Result<Self, MetadataError> {
        let raw: RawMetadata = if block.trim().is_empty() {
            RawMetadata::default()
        } else {
            serde_yaml::from_str(block).map_err(|e| MetadataError::Invalid(e.to_string()))?
        };

        let topic = raw
            .topic
            .as_ref()
            .and_then(scalar)
            .ok_or(MetadataError::MissingTopic)?;

        let tags = match raw.tags {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(scalar)
                .flat_map(|item| parse_tag_list(&item))
                .collect(),
            Some(ref value) => scalar(value)
                .map(|s| parse_tag_list(&s))
                .unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(Self {
            topic,
            subtopic: raw.subtopic.as_ref().and_then(scalar),
            paragraph: raw.paragraph.as_ref().and_then(scalar),
            difficulty: raw.difficulty.as_ref().and_then(scalar),
            source: raw.source.as_ref().and_then(scalar),
            year: raw.year.as_ref().and_then(scalar).and_then(|y| y.parse().ok()),
            tags,
        })
    }
}

/// Renders a YAML scalar as trimmed text; empty and non-scalar values are `None`
fn scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---\ntopic: Логарифмы\ndifficulty: 2\nsource: Сборник\nyear: 2025\ntags: Алгебра, ЕГЭ\n---\n### Задания\n1. Найдите x\n";

    #[test]
    fn split_block_and_body() {
        let doc = SourceDocument::new(None, DOC);
        let (block, body) = doc.split().unwrap();
        assert!(block.starts_with("topic: Логарифмы"));
        assert!(block.ends_with("tags: Алгебра, ЕГЭ"));
        assert_eq!(body, "### Задания\n1. Найдите x\n");
    }

    #[test]
    fn split_requires_block() {
        let doc = SourceDocument::new(None, "### Задания\n1. x\n");
        assert_eq!(doc.split().unwrap_err(), MetadataError::MissingBlock);
    }

    #[test]
    fn parse_full_metadata() {
        let doc = SourceDocument::new(None, DOC);
        let (block, _) = doc.split().unwrap();
        let meta = DocumentMeta::parse(block).unwrap();

        assert_eq!(meta.topic, "Логарифмы");
        assert_eq!(meta.difficulty.as_deref(), Some("2"));
        assert_eq!(meta.source.as_deref(), Some("Сборник"));
        assert_eq!(meta.year, Some(2025));
        assert_eq!(meta.tags, vec!["Алгебра", "ЕГЭ"]);
        assert_eq!(meta.subtopic, None);
    }

    #[test]
    fn parse_sequence_tags() {
        let meta = DocumentMeta::parse("topic: T\ntags: [a, ' b ', '']").unwrap();
        assert_eq!(meta.tags, vec!["a", "b"]);
    }

    #[test]
    fn parse_numeric_fields_as_text() {
        let meta = DocumentMeta::parse("topic: 15\nparagraph: 14\nsubtopic: 2").unwrap();
        assert_eq!(meta.topic, "15");
        assert_eq!(meta.paragraph.as_deref(), Some("14"));
        assert_eq!(meta.subtopic.as_deref(), Some("2"));
    }

    #[test]
    fn parse_requires_topic() {
        assert_eq!(
            DocumentMeta::parse("difficulty: 1").unwrap_err(),
            MetadataError::MissingTopic
        );
        assert_eq!(
            DocumentMeta::parse("topic: '  '").unwrap_err(),
            MetadataError::MissingTopic
        );
    }

    #[test]
    fn parse_rejects_invalid_yaml() {
        assert!(matches!(
            DocumentMeta::parse("topic: [unclosed"),
            Err(MetadataError::Invalid(_))
        ));
    }

    #[test]
    fn subtopic_from_file_name() {
        let doc = SourceDocument::new(Some("16-2.md".to_string()), DOC);
        assert_eq!(doc.subtopic_from_name().as_deref(), Some("2"));

        let doc = SourceDocument::new(Some("16.md".to_string()), DOC);
        assert_eq!(doc.subtopic_from_name(), None);
    }
}
