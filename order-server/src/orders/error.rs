use crate::db::repository::RepoError;
use crate::store::StoreError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Order service errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Version {version} of order {order_id} not found")]
    VersionNotFound { order_id: String, version: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<RepoError> for OrderError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => OrderError::OrderNotFound(msg),
            RepoError::Validation(msg) => OrderError::Validation(msg),
            RepoError::Duplicate(msg) | RepoError::Database(msg) => OrderError::Persistence(msg),
        }
    }
}

impl From<StoreError> for OrderError {
    fn from(err: StoreError) -> Self {
        OrderError::Persistence(err.to_string())
    }
}

/// 将存储错误转换为错误码
fn classify_persistence_error(message: &str) -> ErrorCode {
    let lower = message.to_lowercase();

    // 磁盘空间不足
    if lower.contains("no space") || lower.contains("disk full") || lower.contains("enospc") {
        return ErrorCode::StorageFull;
    }

    // 数据损坏
    if lower.contains("corrupt") || lower.contains("invalid database") {
        return ErrorCode::StorageCorrupted;
    }

    // 数据库被占用或暂不可用
    if lower.contains("unavailable") || lower.contains("already open") {
        return ErrorCode::SystemBusy;
    }

    ErrorCode::DatabaseError
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::OrderNotFound(id) => AppError::order_not_found(id),
            OrderError::VersionNotFound { order_id, version } => {
                AppError::version_not_found(order_id, version)
            }
            OrderError::Validation(msg) => AppError::validation(msg),
            OrderError::Persistence(msg) => {
                let code = classify_persistence_error(&msg);
                AppError::with_message(code, msg)
            }
        }
    }
}
