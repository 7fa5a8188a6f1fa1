//! Order Aggregate Service
//!
//! Owns the order head record. Pricing goes through the snapshot builder;
//! version numbers come from the [`VersionSequencer`], and the order's
//! `current_version` is only a cache of the last number it handed out.
//!
//! Version recording is best-effort: a failed version write is logged and
//! the order mutation still succeeds, but the head's pricing fields are
//! only moved to a version that was actually stored. `current_version`
//! is 0 while an order has no stored version.
//!
//! The head's pricing fields are written with a compare-and-swap on
//! `current_version`, so overlapping re-pricings can only move the head
//! forward.

use super::error::{OrderError, OrderResult};
use super::sequencer::VersionSequencer;
use crate::db::repository::OrderRepository;
use crate::pricing::build_snapshot;
use crate::store::{Document, Filter, SharedStore};
use crate::utils::validation::{validate_order_create, validate_order_update};
use serde_json::{Value, json};
use shared::models::{
    ClientInfo, Order, OrderCreate, OrderQuery, OrderSnapshot, OrderStatus, OrderUpdate,
    OrderVersion, PaginatedResponse,
};
use shared::util::{new_id, now_millis};

/// Upper bound for `limit` in order listings
pub const MAX_PAGE_SIZE: u32 = 100;

const DEFAULT_CREATOR: &str = "system";

#[derive(Clone)]
pub struct OrderService {
    orders: OrderRepository,
    sequencer: VersionSequencer,
    default_page_size: u32,
}

impl OrderService {
    pub fn new(store: SharedStore, default_page_size: u32) -> Self {
        Self {
            orders: OrderRepository::new(store.clone()),
            sequencer: VersionSequencer::new(store),
            default_page_size: default_page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn sequencer(&self) -> &VersionSequencer {
        &self.sequencer
    }

    /// Price the order at version 1, store it, then record version 1.
    pub async fn create_order(&self, input: OrderCreate) -> OrderResult<Order> {
        validate_order_create(&input)?;

        let client = ClientInfo {
            client_id: input.client_id.clone(),
            client_name: input.client_name.clone(),
            contact_name: input.contact_name.clone(),
            contact_phone: input.contact_phone.clone(),
        };
        let snapshot = build_snapshot(
            1,
            client,
            &input.project_name,
            &input.selected_services,
            &input.service_details,
            &input.policies,
        );

        let now = now_millis();
        let created_by = input
            .created_by
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CREATOR.to_string());
        let order = Order {
            id: new_id(),
            client_id: input.client_id,
            client_name: input.client_name,
            project_name: input.project_name,
            contact_name: input.contact_name,
            contact_phone: input.contact_phone,
            status: OrderStatus::Normal,
            current_version: 1,
            current_amount: snapshot.total_amount,
            current_amount_rmb: snapshot.total_amount_rmb.clone(),
            selected_services: input.selected_services,
            created_by: created_by.clone(),
            created_at: now,
            updated_at: now,
        };
        let order = self.orders.create(&order).await?;

        tracing::info!(
            order_id = %order.id,
            client_id = %order.client_id,
            total_amount = %order.current_amount,
            "Order created"
        );

        let (bound, patch) = match self.record_version(&order.id, snapshot, &created_by).await {
            Some(version) if version.version_number == order.current_version => return Ok(order),
            // Sequencer is authoritative; refresh the cached pointer.
            Some(version) => (
                version.version_number,
                head_patch(&version, &order.selected_services),
            ),
            // Nothing stored: the head must not name a missing version.
            None => {
                let mut patch = Document::new();
                patch.insert("current_version".to_string(), json!(0));
                (order.current_version + 1, patch)
            }
        };

        let order_id = order.id.clone();
        Ok(self
            .orders
            .update_if_version_below(&order_id, bound, patch)
            .await?
            .unwrap_or(order))
    }

    /// Apply basic fields; re-price and record a new version only when
    /// `selected_services`, `service_details` and `policies` are all given.
    pub async fn update_order(&self, order_id: &str, patch: OrderUpdate) -> OrderResult<Order> {
        validate_order_update(&patch)?;

        let order = self.require_order(order_id).await?;
        let mut doc = Document::new();

        let OrderUpdate {
            client_id,
            client_name,
            project_name,
            contact_name,
            contact_phone,
            selected_services,
            service_details,
            policies,
            updated_by,
        } = patch;

        let client = ClientInfo {
            client_id: client_id.clone().unwrap_or_else(|| order.client_id.clone()),
            client_name: client_name.clone().unwrap_or_else(|| order.client_name.clone()),
            contact_name: contact_name.clone().or_else(|| order.contact_name.clone()),
            contact_phone: contact_phone.clone().or_else(|| order.contact_phone.clone()),
        };
        let project = project_name
            .clone()
            .unwrap_or_else(|| order.project_name.clone());

        for (field, value) in [
            ("client_id", client_id),
            ("client_name", client_name),
            ("project_name", project_name),
            ("contact_name", contact_name),
            ("contact_phone", contact_phone),
        ] {
            if let Some(value) = value {
                doc.insert(field.to_string(), Value::String(value));
            }
        }

        let mut pricing = None;
        if let (Some(selected), Some(details), Some(policies)) =
            (selected_services, service_details, policies)
        {
            let expected = order.current_version + 1;
            let snapshot = build_snapshot(expected, client, &project, &selected, &details, &policies);

            let author = updated_by
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| order.created_by.clone());
            match self.record_version(order_id, snapshot, &author).await {
                Some(version) => {
                    pricing = Some((version.version_number, head_patch(&version, &selected)));
                }
                None => tracing::warn!(
                    order_id = %order_id,
                    version = order.current_version,
                    "Re-pricing not applied to the order, head keeps its version"
                ),
            }
        }

        if doc.is_empty() && pricing.is_none() {
            return Ok(order);
        }

        let mut updated = None;
        if !doc.is_empty() {
            doc.insert("updated_at".to_string(), json!(now_millis()));
            let order = self
                .orders
                .update(order_id, doc)
                .await?
                .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;
            updated = Some(order);
        }

        if let Some((version, patch)) = pricing {
            match self
                .orders
                .update_if_version_below(order_id, version, patch)
                .await?
            {
                Some(order) => updated = Some(order),
                None => tracing::debug!(
                    order_id = %order_id,
                    version,
                    "Order head already at a newer version"
                ),
            }
        }

        let updated = match updated {
            Some(order) => order,
            None => self.require_order(order_id).await?,
        };

        tracing::info!(
            order_id = %order_id,
            version = updated.current_version,
            "Order updated"
        );
        Ok(updated)
    }

    /// `draft` is accepted and stored as `normal`.
    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> OrderResult<Order> {
        let mut doc = Document::new();
        doc.insert("status".to_string(), json!(status));
        doc.insert("updated_at".to_string(), json!(now_millis()));

        let updated = self
            .orders
            .update(order_id, doc)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;

        tracing::info!(order_id = %order_id, status = %updated.status, "Order status updated");
        Ok(updated)
    }

    /// Delete the order record only; versions stay until
    /// [`delete_order_versions`](Self::delete_order_versions).
    pub async fn delete_order(&self, order_id: &str) -> OrderResult<()> {
        if !self.orders.delete(order_id).await? {
            return Err(OrderError::OrderNotFound(order_id.to_string()));
        }
        tracing::info!(order_id = %order_id, "Order deleted");
        Ok(())
    }

    /// Newest first, filtered by client, status and keyword.
    pub async fn get_orders(&self, query: OrderQuery) -> OrderResult<PaginatedResponse<Order>> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(self.default_page_size)
            .clamp(1, MAX_PAGE_SIZE);

        let mut filter = Filter::new();
        if let Some(client_id) = query.client_id.filter(|s| !s.is_empty()) {
            filter = filter.eq("client_id", client_id);
        }
        if let Some(status) = query.status {
            filter = filter.eq("status", status.normalized().as_str());
        }
        if let Some(keyword) = query.keyword.filter(|s| !s.trim().is_empty()) {
            filter = filter.contains(["project_name", "client_name"], keyword.trim());
        }

        let skip = (page as usize - 1) * limit as usize;
        let (orders, total) = self.orders.find_page(&filter, skip, limit as usize).await?;
        Ok(PaginatedResponse::new(orders, total, page, limit))
    }

    pub async fn get_order_by_id(&self, order_id: &str) -> OrderResult<Order> {
        self.require_order(order_id).await
    }

    /// All versions, highest number first. Versions of a deleted order
    /// remain readable.
    pub async fn get_order_version_history(&self, order_id: &str) -> OrderResult<Vec<OrderVersion>> {
        let versions = self.sequencer.list_versions(order_id).await?;
        if versions.is_empty() {
            self.require_order(order_id).await?;
        }
        Ok(versions)
    }

    /// A stored version. Missing versions are `VersionNotFound` when the
    /// order exists and `OrderNotFound` when it does not.
    pub async fn get_order_snapshot(
        &self,
        order_id: &str,
        version_number: i64,
    ) -> OrderResult<OrderVersion> {
        if let Some(version) = self.sequencer.get_version(order_id, version_number).await? {
            return Ok(version);
        }
        self.require_order(order_id).await?;
        Err(OrderError::VersionNotFound {
            order_id: order_id.to_string(),
            version: version_number,
        })
    }

    pub async fn get_latest_snapshot(&self, order_id: &str) -> OrderResult<OrderVersion> {
        if let Some(version) = self.sequencer.get_latest_version(order_id).await? {
            return Ok(version);
        }
        let order = self.require_order(order_id).await?;
        Err(OrderError::VersionNotFound {
            order_id: order.id,
            version: order.current_version,
        })
    }

    /// Explicit cascade: remove every version of the order.
    pub async fn delete_order_versions(&self, order_id: &str) -> OrderResult<u64> {
        self.sequencer.delete_all_versions(order_id).await
    }

    async fn require_order(&self, order_id: &str) -> OrderResult<Order> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    async fn record_version(
        &self,
        order_id: &str,
        snapshot: OrderSnapshot,
        created_by: &str,
    ) -> Option<OrderVersion> {
        match self
            .sequencer
            .create_version(order_id, snapshot, created_by)
            .await
        {
            Ok(version) => Some(version),
            Err(e) => {
                tracing::error!(
                    order_id = %order_id,
                    error = %e,
                    "Failed to record order version, order kept"
                );
                None
            }
        }
    }
}

/// Head fields cached from a stored version
fn head_patch(version: &OrderVersion, selected_services: &[String]) -> Document {
    let mut patch = Document::new();
    patch.insert("current_version".to_string(), json!(version.version_number));
    patch.insert("current_amount".to_string(), json!(version.total_amount));
    patch.insert(
        "current_amount_rmb".to_string(),
        json!(version.total_amount_rmb),
    );
    patch.insert("selected_services".to_string(), json!(selected_services));
    patch.insert("updated_at".to_string(), json!(now_millis()));
    patch
}
