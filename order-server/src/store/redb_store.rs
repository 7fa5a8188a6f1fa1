//! redb-backed document store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `documents` | `(collection, id)` | JSON bytes | All domain records |
//! | `counters` | `key` | `i64` | Per-order version counters |
//!
//! Every mutation runs in its own write transaction; redb serializes
//! write transactions, so read-modify-write operations (conditional
//! merges, a counter advance plus the insert that consumes it) are atomic.

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

use super::{
    Document, DocumentStore, Filter, FindOptions, StoreError, StoreResult, document_id,
    merge_into,
};

/// key = (collection, id), value = JSON-serialized document
const DOCUMENTS_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("documents");

/// key = counter name, value = last issued number
const COUNTERS_TABLE: TableDefinition<&str, i64> = TableDefinition::new("counters");

#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
            let _ = write_txn.open_table(COUNTERS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// All documents of a collection, in id order.
    fn scan(&self, collection: &str, filter: &Filter) -> StoreResult<Vec<Document>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;

        let mut docs = Vec::new();
        for result in table.range((collection, "")..)? {
            let (key, value) = result?;
            if key.value().0 != collection {
                break;
            }
            let doc: Document = serde_json::from_slice(value.value())?;
            if filter.matches(&doc) {
                docs.push(doc);
            }
        }
        Ok(docs)
    }
}

#[async_trait]
impl DocumentStore for RedbStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<Document>> {
        let docs = self.scan(collection, filter)?;
        Ok(options.apply(docs))
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        match table.get((collection, id))? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document> {
        let id = document_id(&doc)?;
        let bytes = serde_json::to_vec(&doc)?;

        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            if table.get((collection, id.as_str()))?.is_some() {
                return Err(StoreError::DuplicateId {
                    collection: collection.to_string(),
                    id,
                });
            }
            table.insert((collection, id.as_str()), bytes.as_slice())?;
        }
        txn.commit()?;
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

        // Dropping the transaction on an early return aborts it, so the
        // counter only moves when the document lands.
        let txn = self.db.begin_write()?;
        {
            let mut counters = txn.open_table(COUNTERS_TABLE)?;
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            if table.get((collection, id.as_str()))?.is_some() {
                return Err(StoreError::DuplicateId {
                    collection: collection.to_string(),
                    id,
                });
            }

            let current = counters.get(key)?.map(|g| g.value()).unwrap_or(0);
            let next = current.max(floor) + 1;
            doc.insert(field.to_string(), serde_json::Value::from(next));

            let bytes = serde_json::to_vec(&doc)?;
            table.insert((collection, id.as_str()), bytes.as_slice())?;
            counters.insert(key, next)?;
        }
        txn.commit()?;
        Ok(doc)
    }

    async fn update_by_id_if(
        &self,
        collection: &str,
        id: &str,
        condition: &Filter,
        patch: Document,
    ) -> StoreResult<Option<Document>> {
        let txn = self.db.begin_write()?;
        let merged = {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            let existing: Option<Document> = match table.get((collection, id))? {
                Some(guard) => Some(serde_json::from_slice(guard.value())?),
                None => None,
            };
            let Some(mut doc) = existing else {
                return Ok(None);
            };
            if !condition.matches(&doc) {
                return Ok(None);
            }
            merge_into(&mut doc, patch);
            let bytes = serde_json::to_vec(&doc)?;
            table.insert((collection, id), bytes.as_slice())?;
            doc
        };
        txn.commit()?;
        Ok(Some(merged))
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            table.remove((collection, id))?.is_some()
        };
        txn.commit()?;
        Ok(removed)
    }

    async fn count_documents(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        Ok(self.scan(collection, filter)?.len() as u64)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;

            let mut ids = Vec::new();
            for result in table.range((collection, "")..)? {
                let (key, value) = result?;
                let (coll, id) = key.value();
                if coll != collection {
                    break;
                }
                let doc: Document = serde_json::from_slice(value.value())?;
                if filter.matches(&doc) {
                    ids.push(id.to_string());
                }
            }

            for id in &ids {
                table.remove((collection, id.as_str()))?;
            }
            ids.len() as u64
        };
        txn.commit()?;
        Ok(removed)
    }

    async fn reset_counter(&self, key: &str) -> StoreResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(COUNTERS_TABLE)?;
            table.remove(key)?;
        }
        txn.commit()?;
        Ok(())
    }
}
