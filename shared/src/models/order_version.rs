//! Order Version Model (immutable snapshots)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Frozen copy of a policy's effect on one line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingPolicySnapshot {
    pub policy_id: String,
    pub policy_name: String,
    pub policy_type: String,
    pub discount_ratio: Decimal,
    pub calculation_details: String,
}

/// One priced line within a version
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItemSnapshot {
    pub service_id: String,
    pub service_name: String,
    pub category_name: String,
    pub unit_price: Decimal,
    pub unit: String,
    pub quantity: u32,
    pub original_price: Decimal,
    pub discounted_price: Decimal,
    pub discount_amount: Decimal,
    pub subtotal: Decimal,
    pub price_description: String,
    #[serde(default)]
    pub pricing_policies: Vec<PricingPolicySnapshot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CalculationSummary {
    pub total_items: u32,
    pub total_quantity: u32,
    pub applied_policies: Vec<String>,
}

/// Client / project references copied into every snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientInfo {
    pub client_id: String,
    pub client_name: String,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
}

/// Computed order state, before it is numbered and persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSnapshot {
    /// Version the snapshot was built for; the sequencer assigns the final number
    pub version_number: i64,
    pub client: ClientInfo,
    pub project_name: String,
    pub items: Vec<OrderItemSnapshot>,
    pub total_amount: Decimal,
    pub total_amount_rmb: String,
    pub calculation_summary: CalculationSummary,
}

/// Order version entity (订单版本)
///
/// Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderVersion {
    pub id: String,
    pub order_id: String,
    pub version_number: i64,
    pub iteration_time: i64,
    pub client_id: String,
    pub client_name: String,
    pub project_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    pub items: Vec<OrderItemSnapshot>,
    pub total_amount: Decimal,
    pub total_amount_rmb: String,
    pub calculation_summary: CalculationSummary,
    pub created_by: String,
}

impl OrderVersion {
    pub fn from_snapshot(
        id: String,
        order_id: &str,
        version_number: i64,
        snapshot: OrderSnapshot,
        created_by: &str,
        iteration_time: i64,
    ) -> Self {
        let OrderSnapshot {
            client,
            project_name,
            items,
            total_amount,
            total_amount_rmb,
            calculation_summary,
            ..
        } = snapshot;

        Self {
            id,
            order_id: order_id.to_string(),
            version_number,
            iteration_time,
            client_id: client.client_id,
            client_name: client.client_name,
            project_name,
            contact_name: client.contact_name,
            contact_phone: client.contact_phone,
            items,
            total_amount,
            total_amount_rmb,
            calculation_summary,
            created_by: created_by.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_snapshot_takes_assigned_number() {
        let snapshot = OrderSnapshot {
            version_number: 1,
            client: ClientInfo {
                client_id: "c1".to_string(),
                client_name: "甲方".to_string(),
                contact_name: Some("张三".to_string()),
                contact_phone: None,
            },
            project_name: "官网".to_string(),
            items: vec![],
            total_amount: dec!(0),
            total_amount_rmb: "人民币零元整".to_string(),
            calculation_summary: CalculationSummary::default(),
        };

        let version =
            OrderVersion::from_snapshot("v1".to_string(), "o1", 4, snapshot, "admin", 1000);
        assert_eq!(version.version_number, 4);
        assert_eq!(version.order_id, "o1");
        assert_eq!(version.client_name, "甲方");
        assert_eq!(version.contact_name.as_deref(), Some("张三"));
        assert_eq!(version.created_by, "admin");
        assert_eq!(version.iteration_time, 1000);
    }

    #[test]
    fn test_decimal_serializes_as_string() {
        let snap = PricingPolicySnapshot {
            policy_id: "p".to_string(),
            policy_name: "n".to_string(),
            policy_type: "uniform_discount".to_string(),
            discount_ratio: dec!(85),
            calculation_details: String::new(),
        };
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["discount_ratio"], "85");
    }
}
