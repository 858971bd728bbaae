//! Ingestion orchestrator
//!
//! Order of a run:
//! 1. split and parse the metadata block
//! 2. parse the body (a missing task section stops here, before any write)
//! 3. resolve global tags and the topic
//! 4. load existing statements for dedup
//! 5. per unit, in document order: skip duplicates, allocate a code, write
//!
//! A failed task write is counted and the run continues. Everything else
//! that goes wrong is an [`IngestError`].

use serde::Serialize;

use super::{
    CodeAllocator, DedupFilter, IngestError, TagResolver, TopicChooser, TopicResolver,
};
use crate::domain::{
    paragraph_scope_key, CodeScope, DocumentMeta, SourceDocument, TaskRecord, TaskUnit, Topic,
};
use crate::parser::{parse_body, ParseWarning, ParsedDocument};
use crate::storage::{Collection, DefaultsConfig, RecordStore};

/// How the target topic is found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicMode {
    /// Match the metadata topic against existing topics
    Lookup,
    /// Find or create the topic of a textbook paragraph. Metadata
    /// `paragraph` takes precedence over this value.
    Paragraph(String),
}

/// A document split into metadata and parsed tasks, without store access
#[derive(Debug, Clone, Serialize)]
pub struct PreparedDocument {
    pub meta: DocumentMeta,
    #[serde(flatten)]
    pub parsed: ParsedDocument,
}

impl PreparedDocument {
    pub fn from_source(doc: &SourceDocument) -> Result<Self, IngestError> {
        let (block, body) = doc.split()?;
        let meta = DocumentMeta::parse(block)?;
        let parsed = parse_body(body)?;

        for warning in &parsed.warnings {
            tracing::warn!("{}", warning);
        }
        tracing::info!(
            format = %parsed.format,
            tasks = parsed.tasks.len(),
            "Parsed document"
        );

        Ok(Self { meta, parsed })
    }

    /// Every unit that would become a record, in document order
    pub fn units(&self) -> Vec<TaskUnit> {
        self.parsed.tasks.iter().flat_map(|t| t.units()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedTask {
    pub label: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTask {
    pub label: String,
    pub message: String,
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub topic: Topic,
    pub added: Vec<AddedTask>,
    /// Labels of units skipped as duplicates
    pub skipped: Vec<String>,
    pub errors: Vec<FailedTask>,
    pub warnings: Vec<ParseWarning>,
}

impl IngestReport {
    fn new(topic: Topic, warnings: Vec<ParseWarning>) -> Self {
        Self {
            topic,
            added: Vec::new(),
            skipped: Vec::new(),
            errors: Vec::new(),
            warnings,
        }
    }

    pub fn total(&self) -> usize {
        self.added.len() + self.skipped.len() + self.errors.len()
    }
}

/// Values shared by every record of one document
struct RecordTemplate {
    topic_id: String,
    scope: CodeScope,
    difficulty: String,
    source: String,
    /// Set in paragraph mode: `§` number for the per-task citation
    paragraph: Option<String>,
    year: i32,
    tags: Vec<String>,
}

impl RecordTemplate {
    fn record(&self, code: String, unit: &TaskUnit, tags: Vec<String>) -> TaskRecord {
        let source = match &self.paragraph {
            Some(p) => format!("{}, §{}, №{}", self.source, p, unit.label),
            None => self.source.clone(),
        };

        TaskRecord {
            code,
            topic: self.topic_id.clone(),
            difficulty: unit
                .difficulty
                .map(|d| d.to_string())
                .unwrap_or_else(|| self.difficulty.clone()),
            statement: unit.statement.clone(),
            answer: unit.answer.clone(),
            solution_md: String::new(),
            explanation_md: String::new(),
            source,
            year: self.year,
            tags,
            has_image: false,
        }
    }
}

/// Runs documents into a record store
pub struct Ingestor<'s> {
    store: &'s dyn RecordStore,
    defaults: DefaultsConfig,
}

impl<'s> Ingestor<'s> {
    pub fn new(store: &'s dyn RecordStore, defaults: DefaultsConfig) -> Self {
        Self { store, defaults }
    }

    /// Ingests one document
    pub fn run(
        &self,
        doc: &SourceDocument,
        mode: &TopicMode,
        chooser: &mut dyn TopicChooser,
    ) -> Result<IngestReport, IngestError> {
        let prepared = PreparedDocument::from_source(doc)?;
        let meta = &prepared.meta;

        let difficulty = match &meta.difficulty {
            Some(d) => d
                .trim()
                .parse::<u32>()
                .map(|d| d.to_string())
                .map_err(|_| {
                    IngestError::Configuration(format!(
                        "metadata difficulty must be an integer, got '{}'",
                        d
                    ))
                })?,
            None => self.defaults.difficulty.trim().to_string(),
        };

        let mut tags = TagResolver::new(self.store);
        let global_tags = tags.resolve_titles(&meta.tags);

        let topics = TopicResolver::new(self.store);
        let (topic, scope, paragraph) = match mode {
            TopicMode::Lookup => {
                let mut topic = topics.lookup(&meta.topic, chooser)?;
                let key = topic.scope_key().map(str::to_string).ok_or_else(|| {
                    IngestError::Configuration(format!(
                        "topic '{}' has no ege_number to build codes from",
                        topic.title
                    ))
                })?;

                let subtopic = meta.subtopic.clone().or_else(|| doc.subtopic_from_name());
                if let Some(subtopic) = subtopic {
                    topics.set_subtopic(&mut topic, &subtopic);
                }
                (topic, CodeScope::Topic(key), None)
            }
            TopicMode::Paragraph(number) => {
                let paragraph = meta.paragraph.clone().unwrap_or_else(|| number.clone());
                let topic = topics.paragraph(&paragraph, &meta.topic)?;
                let scope = CodeScope::Prefixed(paragraph_scope_key(&paragraph));
                (topic, scope, Some(paragraph))
            }
        };

        let default_source = match mode {
            TopicMode::Lookup => &self.defaults.source,
            TopicMode::Paragraph(_) => &self.defaults.paragraph_source,
        };
        let template = RecordTemplate {
            topic_id: topic.id.clone(),
            scope,
            difficulty,
            source: meta.source.clone().unwrap_or_else(|| default_source.clone()),
            paragraph,
            year: meta.year.unwrap_or(self.defaults.year),
            tags: global_tags,
        };

        let mut dedup = DedupFilter::load(self.store, &topic.id)?;
        let allocator = CodeAllocator::new(self.store);
        let mut report = IngestReport::new(topic, prepared.parsed.warnings.clone());

        for unit in prepared.units() {
            if dedup.is_duplicate(&unit.statement) {
                tracing::info!(task = %unit.label, "Skipped duplicate");
                report.skipped.push(unit.label);
                continue;
            }

            let mut unit_tags = template.tags.clone();
            for id in tags.resolve_titles(&unit.tags) {
                if !unit_tags.contains(&id) {
                    unit_tags.push(id);
                }
            }

            let code = allocator.allocate(&template.topic_id, &template.scope)?;
            let record = template.record(code.to_string(), &unit, unit_tags);
            let written = serde_json::to_value(&record)
                .map_err(|e| e.to_string())
                .and_then(|fields| {
                    self.store
                        .create(Collection::Tasks, &fields)
                        .map_err(|e| e.to_string())
                });

            match written {
                Ok(_) => {
                    tracing::info!(task = %unit.label, code = %record.code, "Added task");
                    dedup.remember(&unit.statement);
                    report.added.push(AddedTask {
                        label: unit.label,
                        code: record.code,
                    });
                }
                Err(message) => {
                    tracing::warn!(task = %unit.label, error = %message, "Failed to write task");
                    report.errors.push(FailedTask {
                        label: unit.label,
                        message,
                    });
                }
            }
        }

        tracing::info!(
            added = report.added.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "Ingestion finished"
        );
        Ok(report)
    }
}
