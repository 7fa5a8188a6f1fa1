//! Order lifecycle
//!
//! - **service**: [`OrderService`], the aggregate owning the order head record
//! - **sequencer**: [`VersionSequencer`], numbering and storage of immutable versions
//! - **error**: [`OrderError`] and its mapping onto API errors
//!
//! # Data Flow
//!
//! ```text
//! OrderService → build_snapshot (resolver + currency) → VersionSequencer → DocumentStore
//!      ↓
//! OrderRepository (current_version cache)
//! ```

pub mod error;
pub mod sequencer;
pub mod service;

pub use error::{OrderError, OrderResult};
pub use sequencer::VersionSequencer;
pub use service::{MAX_PAGE_SIZE, OrderService};
