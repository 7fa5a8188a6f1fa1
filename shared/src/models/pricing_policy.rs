//! Pricing Policy Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Policy status
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    #[default]
    Active,
    Inactive,
}

/// One quantity band of a tiered discount (价格阶梯)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiscountTier {
    pub start_quantity: u32,
    /// `None` = unbounded (X 以上)
    #[serde(default)]
    pub end_quantity: Option<u32>,
    /// Charged percentage, (0, 100]
    pub discount_ratio: Decimal,
}

/// Policy kind, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyKind {
    UniformDiscount { discount_ratio: Decimal },
    TieredDiscount { tiers: Vec<DiscountTier> },
}

impl PolicyKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            PolicyKind::UniformDiscount { .. } => "uniform_discount",
            PolicyKind::TieredDiscount { .. } => "tiered_discount",
        }
    }

    /// Human-readable billing method used in calculation details.
    pub fn label(&self) -> &'static str {
        match self {
            PolicyKind::UniformDiscount { .. } => "统一折扣",
            PolicyKind::TieredDiscount { .. } => "阶梯折扣",
        }
    }
}

/// Normalize a stored ratio to a percentage in (0, 100].
///
/// Legacy records store decimal fractions (0.85); anything in (0, 1] is
/// scaled by 100. Returns `None` for ratios outside the valid range.
pub fn normalize_ratio(ratio: Decimal) -> Option<Decimal> {
    let hundred = Decimal::ONE_HUNDRED;
    if ratio <= Decimal::ZERO {
        None
    } else if ratio <= Decimal::ONE {
        Some(ratio * hundred)
    } else if ratio <= hundred {
        Some(ratio)
    } else {
        None
    }
}

/// Pricing policy entity (价格政策)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricingPolicy {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: PolicyKind,
    #[serde(default)]
    pub status: PolicyStatus,
    /// Single-service binding (older records)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Multi-service binding
    #[serde(default, alias = "selectedPolicies")]
    pub selected_services: Vec<String>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl PricingPolicy {
    pub fn is_active(&self) -> bool {
        self.status == PolicyStatus::Active
    }

    /// Whether this policy is bound to the given service by either data shape.
    pub fn applies_to(&self, service_id: &str) -> bool {
        self.service_id.as_deref() == Some(service_id)
            || self.selected_services.iter().any(|s| s == service_id)
    }
}

/// Create pricing policy payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingPolicyCreate {
    pub name: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: PolicyKind,
    pub status: Option<PolicyStatus>,
    pub service_id: Option<String>,
    #[serde(default, alias = "selectedPolicies")]
    pub selected_services: Vec<String>,
}

/// Update pricing policy payload
///
/// `kind` replaces the whole discount definition when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingPolicyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<PolicyKind>,
    pub status: Option<PolicyStatus>,
    pub service_id: Option<String>,
    #[serde(alias = "selectedPolicies")]
    pub selected_services: Option<Vec<String>>,
}

/// Reference to the policy that determined a price
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppliedPolicy {
    pub id: String,
    pub name: String,
    pub policy_type: String,
}

/// Result of resolving one line item against a set of policies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceCalculationResult {
    pub original_price: Decimal,
    pub discounted_price: Decimal,
    pub discount_amount: Decimal,
    /// Effective charged percentage (100 = no discount)
    pub discount_ratio: Decimal,
    pub applied_policy: Option<AppliedPolicy>,
    pub calculation_details: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn uniform(ratio: Decimal) -> PricingPolicy {
        PricingPolicy {
            id: "p1".to_string(),
            name: "九折".to_string(),
            description: None,
            kind: PolicyKind::UniformDiscount {
                discount_ratio: ratio,
            },
            status: PolicyStatus::Active,
            service_id: None,
            selected_services: vec!["s1".to_string()],
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_normalize_ratio() {
        assert_eq!(normalize_ratio(dec!(0.85)), Some(dec!(85)));
        assert_eq!(normalize_ratio(dec!(1)), Some(dec!(100)));
        assert_eq!(normalize_ratio(dec!(85)), Some(dec!(85)));
        assert_eq!(normalize_ratio(dec!(100)), Some(dec!(100)));
        assert_eq!(normalize_ratio(dec!(0)), None);
        assert_eq!(normalize_ratio(dec!(-5)), None);
        assert_eq!(normalize_ratio(dec!(100.01)), None);
    }

    #[test]
    fn test_serialize_tagged_kind() {
        let policy = uniform(dec!(90));
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["type"], "uniform_discount");
        assert_eq!(json["status"], "active");
        assert_eq!(json["selected_services"][0], "s1");
    }

    #[test]
    fn test_deserialize_tiered_with_legacy_key() {
        let json = r#"{
            "id": "p2",
            "name": "阶梯",
            "type": "tiered_discount",
            "tiers": [
                {"start_quantity": 1, "end_quantity": 5, "discount_ratio": 100},
                {"start_quantity": 6, "end_quantity": null, "discount_ratio": "0.8"}
            ],
            "status": "inactive",
            "selectedPolicies": ["s1", "s2"]
        }"#;
        let policy: PricingPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy.status, PolicyStatus::Inactive);
        assert_eq!(policy.selected_services, vec!["s1", "s2"]);
        match policy.kind {
            PolicyKind::TieredDiscount { tiers } => {
                assert_eq!(tiers.len(), 2);
                assert_eq!(tiers[1].end_quantity, None);
                assert_eq!(tiers[1].discount_ratio, dec!(0.8));
            }
            other => panic!("unexpected kind: {:?}", other),
        }
    }

    #[test]
    fn test_applies_to_both_shapes() {
        let mut policy = uniform(dec!(90));
        assert!(policy.applies_to("s1"));
        assert!(!policy.applies_to("s2"));

        policy.selected_services.clear();
        policy.service_id = Some("s2".to_string());
        assert!(policy.applies_to("s2"));
        assert!(!policy.applies_to("s1"));
    }
}
