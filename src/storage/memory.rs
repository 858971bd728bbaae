//! In-process record store
//!
//! Mirrors the PocketBase semantics the pipeline relies on: equality
//! filters, field projection, generated ids and insertion-ordered listing.
//! Writes can be made to fail on purpose to exercise error accounting.

use std::cell::RefCell;
use std::collections::HashMap;

use serde_json::{Map, Value};

use super::{Collection, ListQuery, Record, RecordStore, StoreError};

/// Rule that rejects matching create calls
#[derive(Debug, Clone)]
struct FailRule {
    collection: Collection,
    field: String,
    value: String,
}

#[derive(Default)]
struct Inner {
    records: HashMap<Collection, Vec<Record>>,
    next_id: u64,
    fail_rules: Vec<FailRule>,
}

/// Record store held in memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RefCell<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record directly, bypassing failure rules; returns its id
    pub fn insert(&self, collection: Collection, fields: Value) -> String {
        let mut inner = self.inner.borrow_mut();
        let record = inner.make_record(fields);
        let id = record.id.clone();
        inner.records.entry(collection).or_default().push(record);
        id
    }

    /// Makes every create in `collection` whose `field` equals `value` fail
    pub fn fail_creates_where(
        &self,
        collection: Collection,
        field: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.inner.borrow_mut().fail_rules.push(FailRule {
            collection,
            field: field.into(),
            value: value.into(),
        });
    }

    /// Returns every record of a collection, in insertion order
    pub fn records(&self, collection: Collection) -> Vec<Record> {
        self.inner
            .borrow()
            .records
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }
}

impl Inner {
    fn make_record(&mut self, fields: Value) -> Record {
        self.next_id += 1;
        let mut fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.remove("id");

        Record {
            id: format!("mem{:012}", self.next_id),
            fields,
        }
    }
}

/// Keeps only the projected fields
fn project(record: &Record, fields: Option<&Vec<String>>) -> Record {
    let Some(fields) = fields else {
        return record.clone();
    };

    Record {
        id: record.id.clone(),
        fields: record
            .fields
            .iter()
            .filter(|(name, _)| fields.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect(),
    }
}

impl RecordStore for MemoryStore {
    fn list(&self, collection: Collection, query: &ListQuery) -> Result<Vec<Record>, StoreError> {
        let inner = self.inner.borrow();
        let records = inner.records.get(&collection).map(Vec::as_slice).unwrap_or(&[]);

        Ok(records
            .iter()
            .filter(|r| query.filter.as_ref().map_or(true, |f| f.matches(r)))
            .map(|r| project(r, query.fields.as_ref()))
            .collect())
    }

    fn get(&self, collection: Collection, id: &str) -> Result<Record, StoreError> {
        self.inner
            .borrow()
            .records
            .get(&collection)
            .and_then(|records| records.iter().find(|r| r.id == id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })
    }

    fn create(&self, collection: Collection, fields: &Value) -> Result<Record, StoreError> {
        let mut inner = self.inner.borrow_mut();
        let record = inner.make_record(fields.clone());

        let rejected = inner.fail_rules.iter().find(|rule| {
            rule.collection == collection
                && record.text(&rule.field).as_deref() == Some(rule.value.as_str())
        });
        if let Some(rule) = rejected {
            return Err(StoreError::Rejected(format!(
                "{} with {} = {}",
                collection, rule.field, rule.value
            )));
        }

        inner
            .records
            .entry(collection)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: &Value,
    ) -> Result<Record, StoreError> {
        let mut inner = self.inner.borrow_mut();
        let record = inner
            .records
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .ok_or_else(|| StoreError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        if let Value::Object(patch) = fields {
            for (name, value) in patch {
                if name != "id" {
                    record.fields.insert(name.clone(), value.clone());
                }
            }
        }

        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Filter;
    use serde_json::json;

    #[test]
    fn create_then_list_with_filter() {
        let store = MemoryStore::new();
        store
            .create(Collection::Tags, &json!({"title": "a", "color": "#fff"}))
            .unwrap();
        store.create(Collection::Tags, &json!({"title": "b"})).unwrap();

        let all = store.list(Collection::Tags, &ListQuery::new()).unwrap();
        assert_eq!(all.len(), 2);

        let query = ListQuery::new().filter(Filter::eq("title", "b"));
        let found = store.list(Collection::Tags, &query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text("title").as_deref(), Some("b"));
    }

    #[test]
    fn ids_are_unique() {
        let store = MemoryStore::new();
        let a = store.insert(Collection::Topics, json!({"title": "A"}));
        let b = store.insert(Collection::Topics, json!({"title": "A"}));
        assert_ne!(a, b);
    }

    #[test]
    fn projection_keeps_requested_fields() {
        let store = MemoryStore::new();
        store.insert(Collection::Tasks, json!({"code": "7-001", "answer": "1"}));

        let query = ListQuery::new().fields(&["code"]);
        let records = store.list(Collection::Tasks, &query).unwrap();
        assert_eq!(records[0].text("code").as_deref(), Some("7-001"));
        assert_eq!(records[0].text("answer"), None);
    }

    #[test]
    fn update_patches_fields() {
        let store = MemoryStore::new();
        let id = store.insert(Collection::Topics, json!({"title": "A"}));

        let updated = store
            .update(Collection::Topics, &id, &json!({"subtopic": "2"}))
            .unwrap();
        assert_eq!(updated.text("subtopic").as_deref(), Some("2"));
        assert_eq!(updated.text("title").as_deref(), Some("A"));
    }

    #[test]
    fn missing_records() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get(Collection::Topics, "nope"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(store
            .update(Collection::Topics, "nope", &json!({}))
            .is_err());
    }

    #[test]
    fn fail_rule_rejects_matching_creates() {
        let store = MemoryStore::new();
        store.fail_creates_where(Collection::Tasks, "statement_md", "bad");

        assert!(store
            .create(Collection::Tasks, &json!({"statement_md": "bad"}))
            .is_err());
        assert!(store
            .create(Collection::Tasks, &json!({"statement_md": "good"}))
            .is_ok());
        assert_eq!(store.records(Collection::Tasks).len(), 1);
    }
}
