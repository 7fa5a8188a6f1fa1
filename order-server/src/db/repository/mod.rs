//! Repository Module
//!
//! Typed CRUD over the [`DocumentStore`](crate::store::DocumentStore)
//! collections.

pub mod order;
pub mod order_version;
pub mod pricing_policy;

// Re-exports
pub use order::OrderRepository;
pub use order_version::OrderVersionRepository;
pub use pricing_policy::PricingPolicyRepository;

use crate::store::{SharedStore, StoreError};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateId { collection, id } => {
                RepoError::Duplicate(format!("{collection}:{id}"))
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::AlreadyExists, msg),
            RepoError::Database(msg) => AppError::database(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Base repository with store reference
#[derive(Clone)]
pub struct BaseRepository {
    store: SharedStore,
}

impl BaseRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}
