//! API 路由模块
//!
//! # 结构
//!
//! - [`extract`] - 请求提取器 (拒绝统一为 AppError)
//! - [`health`] - 健康检查
//! - [`orders`] - 订单与版本接口
//! - [`pricing_policies`] - 价格政策管理接口

pub mod extract;
pub mod health;
pub mod orders;
pub mod pricing_policies;

// Re-export common types for handlers
pub use crate::utils::{ApiResponse, AppError, AppResult};
