//! In-memory document store

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::{
    Document, DocumentStore, Filter, FindOptions, StoreError, StoreResult, document_id,
    merge_into,
};

/// Process-local store. Collections keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, Vec<Document>>>>,
    counters: Arc<DashMap<String, i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let docs: Vec<Document> = {
            let guard = self.collections.read();
            guard
                .get(collection)
                .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
                .unwrap_or_default()
        };
        Ok(options.apply(docs))
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let guard = self.collections.read();
        Ok(guard.get(collection).and_then(|docs| {
            docs.iter()
                .find(|d| d.get("id").and_then(|v| v.as_str()) == Some(id))
                .cloned()
        }))
    }

    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document> {
        let id = document_id(&doc)?;
        let mut guard = self.collections.write();
        let docs = guard.entry(collection.to_string()).or_default();
        if docs
            .iter()
            .any(|d| d.get("id").and_then(|v| v.as_str()) == Some(id.as_str()))
        {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn insert_sequenced(
        &self,
        collection: &str,
        key: &str,
        floor: i64,
        field: &str,
        mut doc: Document,
    ) -> StoreResult<Document> {
        let id = document_id(&doc)?;
        // Collection write lock first, then the counter entry; nothing
        // else takes them in the opposite order.
        let mut guard = self.collections.write();
        let docs = guard.entry(collection.to_string()).or_default();
        if docs
            .iter()
            .any(|d| d.get("id").and_then(|v| v.as_str()) == Some(id.as_str()))
        {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }

        let mut counter = self.counters.entry(key.to_string()).or_insert(0);
        let next = (*counter).max(floor) + 1;
        doc.insert(field.to_string(), Value::from(next));
        docs.push(doc.clone());
        *counter = next;
        Ok(doc)
    }

    async fn update_by_id_if(
        &self,
        collection: &str,
        id: &str,
        condition: &Filter,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        let mut guard = self.collections.write();
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(None);
        };
        let Some(doc) = docs
            .iter_mut()
            .find(|d| d.get("id").and_then(|v| v.as_str()) == Some(id))
        else {
            return Ok(None);
        };
        if !condition.matches(doc) {
            return Ok(None);
        }
        merge_into(doc, patch);
        Ok(Some(doc.clone()))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let mut guard = self.collections.write();
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.get("id").and_then(|v| v.as_str()) != Some(id));
        Ok(docs.len() < before)
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let guard = self.collections.read();
        Ok(guard
            .get(collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count() as u64)
            .unwrap_or(0))
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let mut guard = self.collections.write();
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }

    async fn reset_counter(&self, key: &str) -> StoreResult<()> {
        self.counters.remove(key);
        Ok(())
    }
}
