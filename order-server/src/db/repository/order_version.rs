//! Order Version Repository
//!
//! Versions are insert-only; the only deletion path removes every version
//! of one order.

use super::{BaseRepository, RepoResult};
use crate::store::{Filter, FindOptions, SharedStore, SortOrder, from_document, to_document};
use shared::models::OrderVersion;

const COLLECTION: &str = "order_versions";

fn counter_key(order_id: &str) -> String {
    format!("order_version:{order_id}")
}

#[derive(Clone)]
pub struct OrderVersionRepository {
    base: BaseRepository,
}

impl OrderVersionRepository {
    pub fn new(store: SharedStore) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    /// Insert `version` under the next number of its order's counter
    /// (at least `floor + 1`). The stored record carries the assigned
    /// number; `version.version_number` is ignored.
    pub async fn insert_next(&self, version: &OrderVersion, floor: i64) -> RepoResult<OrderVersion> {
        let doc = to_document(version)?;
        let stored = self
            .base
            .store()
            .insert_sequenced(
                COLLECTION,
                &counter_key(&version.order_id),
                floor,
                "version_number",
                doc,
            )
            .await?;
        Ok(from_document(stored)?)
    }

    /// All versions of an order, highest number first
    pub async fn find_by_order(&self, order_id: &str) -> RepoResult<Vec<OrderVersion>> {
        let options = FindOptions::default().sort_by("version_number", SortOrder::Desc);
        self.query(order_id, Filter::new(), options).await
    }

    pub async fn find_by_number(
        &self,
        order_id: &str,
        version_number: i64,
    ) -> RepoResult<Option<OrderVersion>> {
        let filter = Filter::new().eq("version_number", version_number);
        Ok(self
            .query(order_id, filter, FindOptions::default())
            .await?
            .into_iter()
            .next())
    }

    pub async fn find_latest(&self, order_id: &str) -> RepoResult<Option<OrderVersion>> {
        let options = FindOptions::default()
            .sort_by("version_number", SortOrder::Desc)
            .paginate(0, 1);
        Ok(self
            .query(order_id, Filter::new(), options)
            .await?
            .into_iter()
            .next())
    }

    /// Highest stored version number, 0 when the order has none
    pub async fn max_version_number(&self, order_id: &str) -> RepoResult<i64> {
        Ok(self
            .find_latest(order_id)
            .await?
            .map(|v| v.version_number)
            .unwrap_or(0))
    }

    pub async fn delete_by_order(&self, order_id: &str) -> RepoResult<u64> {
        let filter = Filter::new().eq("order_id", order_id);
        let removed = self.base.store().delete_many(COLLECTION, &filter).await?;
        self.base
            .store()
            .reset_counter(&counter_key(order_id))
            .await?;
        Ok(removed)
    }

    async fn query(
        &self,
        order_id: &str,
        filter: Filter,
        options: FindOptions,
    ) -> RepoResult<Vec<OrderVersion>> {
        let filter = filter.eq("order_id", order_id);
        let docs = self.base.store().find(COLLECTION, &filter, &options).await?;
        Ok(docs
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
