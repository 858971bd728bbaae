//! Tag resolution
//!
//! Titles are matched exactly (case-sensitive). A miss creates the tag with
//! a palette color. Failures never abort the run: the tag is logged and
//! dropped from the list.

use std::collections::HashMap;

use serde_json::json;

use crate::domain::{parse_tag_list, random_color, Tag};
use crate::storage::{Collection, Filter, ListQuery, RecordStore, StoreError};

pub struct TagResolver<'s> {
    store: &'s dyn RecordStore,
    /// title -> id for this run
    cache: HashMap<String, String>,
}

impl<'s> TagResolver<'s> {
    pub fn new(store: &'s dyn RecordStore) -> Self {
        Self {
            store,
            cache: HashMap::new(),
        }
    }

    /// Resolves one title to a tag id; `None` for blank titles or on failure
    pub fn resolve(&mut self, title: &str) -> Option<String> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }

        if let Some(id) = self.cache.get(title) {
            return Some(id.clone());
        }

        match self.find_or_create(title) {
            Ok(id) => {
                self.cache.insert(title.to_string(), id.clone());
                Some(id)
            }
            Err(e) => {
                tracing::warn!(tag = title, error = %e, "Dropping tag");
                None
            }
        }
    }

    /// Resolves a raw tag string (`a`, `a, b` or `[a, b]`)
    pub fn resolve_many(&mut self, raw: &str) -> Vec<String> {
        self.resolve_titles(&parse_tag_list(raw))
    }

    /// Resolves titles in order, dropping failures and duplicate ids
    pub fn resolve_titles<S: AsRef<str>>(&mut self, titles: &[S]) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for title in titles {
            if let Some(id) = self.resolve(title.as_ref()) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
        }
        ids
    }

    fn find_or_create(&self, title: &str) -> Result<String, StoreError> {
        let query = ListQuery::new()
            .filter(Filter::eq("title", title))
            .fields(&["id", "title"]);

        // Store filters may be looser than an exact byte match
        let existing = self
            .store
            .list(Collection::Tags, &query)?
            .iter()
            .map(Tag::from)
            .find(|tag| tag.title == title);

        if let Some(tag) = existing {
            return Ok(tag.id);
        }

        let record = self.store.create(
            Collection::Tags,
            &json!({ "title": title, "color": random_color() }),
        )?;
        tracing::info!(tag = title, id = %record.id, "Created tag");
        Ok(record.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TAG_PALETTE;
    use crate::storage::MemoryStore;

    #[test]
    fn blank_title_creates_nothing() {
        let store = MemoryStore::new();
        let mut resolver = TagResolver::new(&store);

        assert_eq!(resolver.resolve("   "), None);
        assert!(store.records(Collection::Tags).is_empty());
    }

    #[test]
    fn existing_tag_is_reused() {
        let store = MemoryStore::new();
        let id = store.insert(Collection::Tags, json!({"title": "Логарифмы", "color": "#fff"}));
        let mut resolver = TagResolver::new(&store);

        assert_eq!(resolver.resolve(" Логарифмы ").as_deref(), Some(id.as_str()));
        assert_eq!(store.records(Collection::Tags).len(), 1);
    }

    #[test]
    fn missing_tag_is_created_with_palette_color() {
        let store = MemoryStore::new();
        let mut resolver = TagResolver::new(&store);

        let id = resolver.resolve("Алгебра").unwrap();
        let tags = store.records(Collection::Tags);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].id, id);
        let color = tags[0].text("color").unwrap();
        assert!(TAG_PALETTE.contains(&color.as_str()));
    }

    #[test]
    fn resolution_is_stable_within_and_across_runs() {
        let store = MemoryStore::new();

        let first = TagResolver::new(&store).resolve("Логарифмы");
        let mut resolver = TagResolver::new(&store);
        let second = resolver.resolve("Логарифмы");
        let third = resolver.resolve("Логарифмы");

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(second, third);
        assert_eq!(store.records(Collection::Tags).len(), 1);
    }

    #[test]
    fn titles_are_case_sensitive() {
        let store = MemoryStore::new();
        let mut resolver = TagResolver::new(&store);

        let lower = resolver.resolve("егэ");
        let upper = resolver.resolve("ЕГЭ");
        assert_ne!(lower, upper);
    }

    #[test]
    fn resolve_many_accepts_bracket_list() {
        let store = MemoryStore::new();
        let mut resolver = TagResolver::new(&store);

        let ids = resolver.resolve_many("[a, b, , a]");
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn failed_creation_is_dropped() {
        let store = MemoryStore::new();
        store.fail_creates_where(Collection::Tags, "title", "bad");
        let mut resolver = TagResolver::new(&store);

        let ids = resolver.resolve_many("good, bad");
        assert_eq!(ids.len(), 1);
        assert_eq!(store.records(Collection::Tags).len(), 1);
    }
}
