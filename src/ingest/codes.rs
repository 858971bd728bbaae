//! Code allocation
//!
//! The next code is recomputed from the store on every call. Nothing is
//! reserved: a second allocation before the first code is written returns
//! the same code, so callers must write before allocating again.

use crate::domain::{next_code, CodeScope, TaskCode};
use super::IngestError;
use crate::storage::{Collection, Filter, ListQuery, RecordStore};

pub struct CodeAllocator<'s> {
    store: &'s dyn RecordStore,
}

impl<'s> CodeAllocator<'s> {
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self { store }
    }

    /// Returns the next unused code for a topic within a scope
    pub fn allocate(&self, topic_id: &str, scope: &CodeScope) -> Result<TaskCode, IngestError> {
        let query = ListQuery::new()
            .filter(Filter::eq("topic", topic_id))
            .fields(&["code"]);
        let records = self.store.list(Collection::Tasks, &query)?;
        let codes: Vec<String> = records.iter().filter_map(|r| r.text("code")).collect();

        let code = next_code(scope, codes.iter().map(String::as_str))?;
        tracing::debug!(topic = topic_id, existing = codes.len(), %code, "Allocated code");
        Ok(code)
    }
}
