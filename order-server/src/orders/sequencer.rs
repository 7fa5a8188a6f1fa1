//! Version Sequencer
//!
//! Sole authority for version numbers. Numbers come from a per-order store
//! counter floored at the highest stored version. The counter advances in
//! the same store operation as the version insert, so concurrent writers
//! to one order never share a number and a failed insert never leaves a
//! gap.

use super::error::{OrderError, OrderResult};
use crate::db::repository::OrderVersionRepository;
use crate::store::SharedStore;
use shared::models::{OrderSnapshot, OrderVersion};
use shared::util::{new_id, now_millis};

#[derive(Clone)]
pub struct VersionSequencer {
    repo: OrderVersionRepository,
}

impl VersionSequencer {
    pub fn new(store: SharedStore) -> Self {
        Self {
            repo: OrderVersionRepository::new(store),
        }
    }

    /// Highest stored number + 1. A peek only: `create_version` reserves.
    pub async fn next_version_number(&self, order_id: &str) -> OrderResult<i64> {
        Ok(self.repo.max_version_number(order_id).await? + 1)
    }

    /// Assign the next number and persist an immutable version record.
    pub async fn create_version(
        &self,
        order_id: &str,
        snapshot: OrderSnapshot,
        created_by: &str,
    ) -> OrderResult<OrderVersion> {
        let expected = snapshot.version_number;
        let floor = self.repo.max_version_number(order_id).await?;
        let version = OrderVersion::from_snapshot(
            new_id(),
            order_id,
            expected,
            snapshot,
            created_by,
            now_millis(),
        );
        let stored = self.repo.insert_next(&version, floor).await?;

        if stored.version_number != expected {
            tracing::debug!(
                order_id = %order_id,
                expected,
                assigned = stored.version_number,
                "Snapshot built for a different version number"
            );
        }
        tracing::info!(
            order_id = %order_id,
            version = stored.version_number,
            total_amount = %stored.total_amount,
            "Order version recorded"
        );
        Ok(stored)
    }

    /// All versions, highest number first
    pub async fn list_versions(&self, order_id: &str) -> OrderResult<Vec<OrderVersion>> {
        Ok(self.repo.find_by_order(order_id).await?)
    }

    pub async fn get_version(
        &self,
        order_id: &str,
        version_number: i64,
    ) -> OrderResult<Option<OrderVersion>> {
        Ok(self.repo.find_by_number(order_id, version_number).await?)
    }

    pub async fn get_latest_version(&self, order_id: &str) -> OrderResult<Option<OrderVersion>> {
        Ok(self.repo.find_latest(order_id).await?)
    }

    /// Irreversible. Also resets the order's counter.
    pub async fn delete_all_versions(&self, order_id: &str) -> OrderResult<u64> {
        let removed = self.repo.delete_by_order(order_id).await?;
        tracing::warn!(order_id = %order_id, removed, "All order versions deleted");
        Ok(removed)
    }

    /// Like [`get_version`](Self::get_version) but missing is an error.
    pub async fn require_version(
        &self,
        order_id: &str,
        version_number: i64,
    ) -> OrderResult<OrderVersion> {
        self.get_version(order_id, version_number)
            .await?
            .ok_or_else(|| OrderError::VersionNotFound {
                order_id: order_id.to_string(),
                version: version_number,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;
    use shared::models::{CalculationSummary, ClientInfo};
    use std::sync::Arc;

    fn snapshot(version: i64) -> OrderSnapshot {
        OrderSnapshot {
            version_number: version,
            client: ClientInfo {
                client_id: "c1".to_string(),
                client_name: "甲方".to_string(),
                contact_name: None,
                contact_phone: None,
            },
            project_name: "项目".to_string(),
            items: vec![],
            total_amount: dec!(100),
            total_amount_rmb: "人民币壹佰元整".to_string(),
            calculation_summary: CalculationSummary::default(),
        }
    }

    fn sequencer() -> VersionSequencer {
        VersionSequencer::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_sequential_numbers_without_gaps() {
        let seq = sequencer();
        assert_eq!(seq.next_version_number("o1").await.unwrap(), 1);

        for expected in 1..=5 {
            let next = seq.next_version_number("o1").await.unwrap();
            assert_eq!(next, expected);
            let version = seq.create_version("o1", snapshot(next), "admin").await.unwrap();
            assert_eq!(version.version_number, expected);
            // Interleaved reads do not disturb numbering
            let latest = seq.get_latest_version("o1").await.unwrap().unwrap();
            assert_eq!(latest.version_number, expected);
        }

        let numbers: Vec<i64> = seq
            .list_versions("o1")
            .await
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(numbers, vec![5, 4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn test_orders_numbered_independently() {
        let seq = sequencer();
        seq.create_version("a", snapshot(1), "x").await.unwrap();
        seq.create_version("a", snapshot(2), "x").await.unwrap();
        let b = seq.create_version("b", snapshot(1), "x").await.unwrap();
        assert_eq!(b.version_number, 1);
        assert_eq!(seq.next_version_number("a").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_creation_is_gap_free() {
        let seq = sequencer();
        let mut handles = Vec::new();
        for _ in 0..20 {
            let seq = seq.clone();
            handles.push(tokio::spawn(async move {
                seq.create_version("o1", snapshot(0), "admin")
                    .await
                    .unwrap()
                    .version_number
            }));
        }

        let mut numbers = Vec::new();
        for handle in handles {
            numbers.push(handle.await.unwrap());
        }
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=20).collect::<Vec<i64>>());
    }

    #[tokio::test]
    async fn test_get_version_and_require() {
        let seq = sequencer();
        seq.create_version("o1", snapshot(1), "admin").await.unwrap();

        let v1 = seq.get_version("o1", 1).await.unwrap().unwrap();
        assert_eq!(v1.created_by, "admin");
        assert!(v1.iteration_time > 0);
        assert!(seq.get_version("o1", 2).await.unwrap().is_none());

        let err = seq.require_version("o1", 2).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::VersionNotFound { version: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_all_versions_restarts_numbering() {
        let seq = sequencer();
        seq.create_version("o1", snapshot(1), "admin").await.unwrap();
        seq.create_version("o1", snapshot(2), "admin").await.unwrap();
        seq.create_version("o2", snapshot(1), "admin").await.unwrap();

        assert_eq!(seq.delete_all_versions("o1").await.unwrap(), 2);
        assert!(seq.list_versions("o1").await.unwrap().is_empty());
        assert!(seq.get_latest_version("o1").await.unwrap().is_none());
        assert_eq!(seq.list_versions("o2").await.unwrap().len(), 1);

        let fresh = seq.create_version("o1", snapshot(1), "admin").await.unwrap();
        assert_eq!(fresh.version_number, 1);
    }
}
