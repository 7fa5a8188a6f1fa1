//! Document store abstraction
//!
//! Orders, versions and pricing policies are persisted as JSON object
//! documents grouped in named collections. Two backends implement
//! [`DocumentStore`]:
//!
//! - [`MemoryStore`] - process-local, used by tests and `STORAGE_BACKEND=memory`
//! - [`RedbStore`] - embedded redb file under the work dir
//!
//! Besides document CRUD, the store owns named counters. A counter only
//! advances together with the insert that consumes its value
//! ([`DocumentStore::insert_sequenced`]), so a failed insert never burns a
//! number.

pub mod memory;
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;
use thiserror::Error;

/// A stored record: a JSON object with a string `id` field.
pub type Document = Map<String, Value>;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] ::redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] ::redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] ::redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] ::redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] ::redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document has no id")]
    MissingId,

    #[error("Duplicate id in {collection}: {id}")]
    DuplicateId { collection: String, id: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One filter condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals value
    Eq(String, Value),
    /// Any of the fields contains the needle (case-insensitive)
    Contains(Vec<String>, String),
    /// Field sorts strictly below value (missing sorts lowest)
    Lt(String, Value),
}

/// Conjunction of conditions; empty matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(field.into(), value.into()));
        self
    }

    pub fn lt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Lt(field.into(), value.into()));
        self
    }

    pub fn contains<I, S>(mut self, fields: I, needle: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions.push(Condition::Contains(
            fields.into_iter().map(Into::into).collect(),
            needle.into(),
        ));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|cond| match cond {
            Condition::Eq(field, value) => doc.get(field) == Some(value),
            Condition::Contains(fields, needle) => {
                let needle = needle.to_lowercase();
                fields.iter().any(|f| {
                    doc.get(f)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
            Condition::Lt(field, value) => {
                compare_values(doc.get(field), Some(value)) == Ordering::Less
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort / paging options for [`DocumentStore::find`]
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn paginate(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }

    /// Apply sort, skip and limit to an already filtered result set.
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if let Some((field, order)) = &self.sort {
            docs.sort_by(|a, b| {
                let ord = compare_values(a.get(field), b.get(field));
                match order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }
        let iter = docs.into_iter().skip(self.skip);
        match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        }
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Persistence collaborator for all domain records
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let options = FindOptions {
            limit: Some(1),
            ..Default::default()
        };
        Ok(self
            .find(collection, filter, &options)
            .await?
            .into_iter()
            .next())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Insert a document; it must carry a string `id`.
    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document>;

    /// Insert `doc` with `field` set to the next value of counter `key`
    /// (at least `floor + 1`). The counter advance and the insert commit
    /// together: if the insert fails the counter is left untouched.
    async fn insert_sequenced(
        &self,
        collection: &str,
        key: &str,
        floor: i64,
        field: &str,
        doc: Document,
    ) -> StoreResult<Document>;

    /// Shallow-merge `patch` into the stored document.
    /// Returns `None` when no document has this id.
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        self.update_by_id_if(collection, id, &Filter::new(), patch)
            .await
    }

    /// Compare-and-merge: apply `patch` only if the stored document
    /// matches `condition`, checked under the same lock or transaction as
    /// the write. Returns `None` when the id is missing or the condition
    /// does not hold.
    async fn update_by_id_if(
        &self,
        collection: &str,
        id: &str,
        condition: &Filter,
        patch: Document,
    ) -> StoreResult<Option<Document>>;

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<bool>;

    async fn count_documents(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64>;

    async fn reset_counter(&self, key: &str) -> StoreResult<()>;
}

/// Shared handle to the configured backend
pub type SharedStore = Arc<dyn DocumentStore>;

/// Extract the `id` of a document.
pub fn document_id(doc: &Document) -> StoreResult<String> {
    doc.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StoreError::MissingId)
}

/// Serialize a model into a document.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::MissingId),
    }
}

/// Deserialize a document into a model.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Shallow merge; `patch` keys overwrite `target` keys.
pub(crate) fn merge_into(target: &mut Document, patch: Document) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}
