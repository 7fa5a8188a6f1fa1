//! Data models
//!
//! Shared between order-server and API clients.
//! Monetary values are `rust_decimal::Decimal`, timestamps are Unix millis.

pub mod order;
pub mod order_version;
pub mod pagination;
pub mod pricing_policy;

// Re-exports
pub use order::*;
pub use order_version::*;
pub use pagination::*;
pub use pricing_policy::*;
