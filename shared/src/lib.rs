//! Shared types for the order pricing service
//!
//! Wire/domain models (pricing policies, orders, version snapshots),
//! the unified error system and small utility helpers.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use models::PaginatedResponse;
