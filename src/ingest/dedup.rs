//! Statement-text deduplication

use std::collections::HashSet;

use crate::storage::{Collection, Filter, ListQuery, RecordStore, StoreError};

/// Statements already stored under one topic, compared after trimming
#[derive(Debug, Default)]
pub struct DedupFilter {
    statements: HashSet<String>,
}

impl DedupFilter {
    /// Loads every existing statement of a topic in one batch
    pub fn load(store: &dyn RecordStore, topic_id: &str) -> Result<Self, StoreError> {
        let query = ListQuery::new()
            .filter(Filter::eq("topic", topic_id))
            .fields(&["statement_md"]);

        let statements: HashSet<String> = store
            .list(Collection::Tasks, &query)?
            .iter()
            .filter_map(|r| r.text("statement_md"))
            .map(|s| s.trim().to_string())
            .collect();

        tracing::info!(topic = topic_id, existing = statements.len(), "Loaded existing statements");
        Ok(Self { statements })
    }

    pub fn is_duplicate(&self, statement: &str) -> bool {
        self.statements.contains(statement.trim())
    }

    /// Adds a statement written during this run
    pub fn remember(&mut self, statement: &str) {
        self.statements.insert(statement.trim().to_string());
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
