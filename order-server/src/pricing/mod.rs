//! Pricing engine
//!
//! Synchronous and pure: nothing in this module touches storage.
//!
//! - [`currency`]: 大写金额 rendering and figure formatting
//! - [`resolver`]: best-discount resolution for one line item
//! - [`snapshot`]: priced line items and totals for one order version

pub mod currency;
pub mod resolver;
pub mod snapshot;

pub use currency::{format_amount, render_rmb, round_money};
pub use resolver::{NO_POLICY_FOUND, NO_POLICY_SELECTED, resolve};
pub use snapshot::build_snapshot;
