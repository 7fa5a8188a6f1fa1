//! 工具模块
//!
//! - [`logger`] - tracing 初始化
//! - [`validation`] - 输入校验

pub mod logger;
pub mod validation;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
