//! Order Repository

use super::{BaseRepository, RepoResult};
use crate::store::{
    Document, Filter, FindOptions, SharedStore, SortOrder, from_document, to_document,
};
use serde_json::Value;
use shared::models::{Order, OrderStatus};

const COLLECTION: &str = "orders";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

/// `draft` is stored as `normal`.
fn normalize_status(doc: &mut Document) {
    if doc.get("status").and_then(Value::as_str) == Some(OrderStatus::Draft.as_str()) {
        doc.insert(
            "status".to_string(),
            Value::String(OrderStatus::Normal.as_str().to_string()),
        );
    }
}

impl OrderRepository {
    pub fn new(store: SharedStore) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        match self.base.store().find_by_id(COLLECTION, id).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// One page of orders, newest first, plus the total match count.
    pub async fn find_page(
        &self,
        filter: &Filter,
        skip: usize,
        limit: usize,
    ) -> RepoResult<(Vec<Order>, u64)> {
        let options = FindOptions::default()
            .sort_by("created_at", SortOrder::Desc)
            .paginate(skip, limit);
        let docs = self.base.store().find(COLLECTION, filter, &options).await?;
        let total = self.base.store().count_documents(COLLECTION, filter).await?;

        let orders = docs
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<Order>, _>>()?;
        Ok((orders, total))
    }

    pub async fn create(&self, order: &Order) -> RepoResult<Order> {
        let mut doc = to_document(order)?;
        normalize_status(&mut doc);
        let stored = self.base.store().insert(COLLECTION, doc).await?;
        Ok(from_document(stored)?)
    }

    /// Merge `patch` into the order. Returns `None` if it does not exist.
    pub async fn update(&self, id: &str, mut patch: Document) -> RepoResult<Option<Order>> {
        patch.remove("id");
        normalize_status(&mut patch);
        match self.base.store().update_by_id(COLLECTION, id, patch).await? {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Merge `patch` only while the stored `current_version` is below
    /// `version`. Returns `None` if the order is missing or already points
    /// at `version` or later.
    pub async fn update_if_version_below(
        &self,
        id: &str,
        version: i64,
        mut patch: Document,
    ) -> RepoResult<Option<Order>> {
        patch.remove("id");
        normalize_status(&mut patch);
        let condition = Filter::new().lt("current_version", version);
        match self
            .base
            .store()
            .update_by_id_if(COLLECTION, id, &condition, patch)
            .await?
        {
            Some(doc) => Ok(Some(from_document(doc)?)),
            None => Ok(None),
        }
    }

    /// Hard delete (versions are kept)
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        Ok(self.base.store().delete_by_id(COLLECTION, id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::sync::Arc;

    fn sample(id: &str, created_at: i64, status: OrderStatus) -> Order {
        Order {
            id: id.to_string(),
            client_id: "c1".to_string(),
            client_name: "Acme".to_string(),
            project_name: format!("project {id}"),
            contact_name: None,
            contact_phone: None,
            status,
            current_version: 1,
            current_amount: dec!(100),
            current_amount_rmb: "人民币壹佰元整".to_string(),
            selected_services: vec![],
            created_by: "system".to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    #[tokio::test]
    async fn test_draft_coerced_on_create_and_update() {
        let repo = OrderRepository::new(Arc::new(MemoryStore::new()));
        let created = repo.create(&sample("o1", 1, OrderStatus::Draft)).await.unwrap();
        assert_eq!(created.status, OrderStatus::Normal);

        let mut patch = Document::new();
        patch.insert("status".to_string(), json!("cancelled"));
        let updated = repo.update("o1", patch).await.unwrap().unwrap();
        assert_eq!(updated.status, OrderStatus::Cancelled);

        let mut patch = Document::new();
        patch.insert("status".to_string(), json!("draft"));
        let updated = repo.update("o1", patch).await.unwrap().unwrap();
        assert_eq!(updated.status, OrderStatus::Normal);
    }

    #[tokio::test]
    async fn test_find_page_newest_first() {
        let repo = OrderRepository::new(Arc::new(MemoryStore::new()));
        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            repo.create(&sample(id, i as i64, OrderStatus::Normal))
                .await
                .unwrap();
        }
        let (page, total) = repo.find_page(&Filter::new(), 0, 2).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, "c");
        assert_eq!(page[1].id, "b");
    }

    #[tokio::test]
    async fn test_head_never_moves_backwards() {
        let repo = OrderRepository::new(Arc::new(MemoryStore::new()));
        let mut order = sample("o1", 1, OrderStatus::Normal);
        order.current_version = 3;
        repo.create(&order).await.unwrap();

        let mut patch = Document::new();
        patch.insert("current_version".to_string(), json!(2));
        assert!(repo.update_if_version_below("o1", 2, patch).await.unwrap().is_none());

        let mut patch = Document::new();
        patch.insert("current_version".to_string(), json!(4));
        let moved = repo
            .update_if_version_below("o1", 4, patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.current_version, 4);
        assert!(
            repo.update_if_version_below("missing", 9, Document::new())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_update_cannot_change_id() {
        let repo = OrderRepository::new(Arc::new(MemoryStore::new()));
        repo.create(&sample("o1", 1, OrderStatus::Normal)).await.unwrap();
        let mut patch = Document::new();
        patch.insert("id".to_string(), json!("hijack"));
        let updated = repo.update("o1", patch).await.unwrap().unwrap();
        assert_eq!(updated.id, "o1");
    }
}
