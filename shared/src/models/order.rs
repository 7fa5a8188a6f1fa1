//! Order Model (aggregate head)

use super::pricing_policy::PricingPolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status
///
/// `Draft` is a deprecated alias of `Normal`: it is accepted on input and
/// stored as `Normal`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Normal,
    Cancelled,
    Draft,
}

impl OrderStatus {
    pub fn normalized(self) -> Self {
        match self {
            OrderStatus::Draft => OrderStatus::Normal,
            other => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Normal => "normal",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Draft => "draft",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(OrderStatus::Normal),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "draft" => Ok(OrderStatus::Draft),
            other => Err(format!("invalid order status: {}", other)),
        }
    }
}

/// A billable service as submitted with an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDetail {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(alias = "serviceName")]
    pub name: String,
    #[serde(default)]
    pub category_name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub unit: String,
    /// Missing or zero means 1
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl ServiceDetail {
    pub fn effective_quantity(&self) -> u32 {
        match self.quantity {
            Some(q) if q > 0 => q,
            _ => 1,
        }
    }
}

/// Order entity (订单)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    pub project_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    pub status: OrderStatus,
    /// Cache of the latest version number recorded for this order
    pub current_version: i64,
    pub current_amount: Decimal,
    pub current_amount_rmb: String,
    /// Service selection used by the latest pricing run
    #[serde(default)]
    pub selected_services: Vec<String>,
    pub created_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub client_id: String,
    pub client_name: String,
    pub project_name: String,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub selected_services: Vec<String>,
    #[serde(default)]
    pub service_details: Vec<ServiceDetail>,
    #[serde(default)]
    pub policies: Vec<PricingPolicy>,
    pub created_by: Option<String>,
}

/// Update order payload
///
/// Basic fields are applied whenever present. Re-pricing (and a new
/// version) only happens when `selected_services`, `service_details` and
/// `policies` are all present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderUpdate {
    pub client_id: Option<String>,
    pub client_name: Option<String>,
    pub project_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub selected_services: Option<Vec<String>>,
    pub service_details: Option<Vec<ServiceDetail>>,
    pub policies: Option<Vec<PricingPolicy>>,
    pub updated_by: Option<String>,
}

/// Update order status payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatus,
}

/// Order list query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQuery {
    pub client_id: Option<String>,
    pub status: Option<OrderStatus>,
    /// Case-insensitive match on project or client name
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
