//! Order Server - 订单定价与版本服务
//!
//! # 架构概述
//!
//! - **定价** (`pricing`): 价格政策解析、订单快照、人民币大写
//! - **订单** (`orders`): 订单聚合服务与版本序号
//! - **存储** (`store`): 文档存储抽象 (redb / 内存)
//! - **数据访问** (`db`): 各集合的 Repository
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单服务、版本序号
//! ├── pricing/       # 定价引擎 (纯函数)
//! ├── db/            # Repository 层
//! ├── store/         # DocumentStore 及其实现
//! └── utils/         # 日志、校验
//! ```

pub mod api;
pub mod core;
pub mod db;
pub mod orders;
pub mod pricing;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState, build_app};
pub use orders::{OrderError, OrderService, VersionSequencer};
pub use pricing::{build_snapshot, render_rmb, resolve};
pub use store::{DocumentStore, MemoryStore, RedbStore, SharedStore};

// Re-export unified error types from shared
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境
///
/// 1. 加载 .env
/// 2. 创建工作目录结构
/// 3. 初始化日志 (work_dir/logs 下按天滚动)
pub fn setup_environment(config: &Config) -> std::io::Result<()> {
    config.ensure_work_dir_structure()?;
    let log_dir = config.log_dir();
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        log_dir.to_str(),
    );
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
  ___          _              ___
 / _ \ _ _ __| |___ _ _     / __| ___ _ ___ _____ _ _
| (_) | '_/ _` / -_) '_|    \__ \/ -_) '_\ V / -_) '_|
 \___/|_| \__,_\___|_|      |___/\___|_|  \_/\___|_|
    "#
    );
}
