use std::sync::Arc;

use crate::core::{Config, Result, StorageBackend};
use crate::orders::OrderService;
use crate::store::{MemoryStore, RedbStore, SharedStore};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求克隆一份。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | SharedStore | 文档存储 (redb / memory) |
/// | order_service | Arc<OrderService> | 订单聚合服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 文档存储
    pub store: SharedStore,
    /// 订单聚合服务
    pub order_service: Arc<OrderService>,
}

impl ServerState {
    /// 创建服务器状态 (手动构造)
    ///
    /// 通常使用 [`initialize()`](Self::initialize) 代替
    pub fn new(config: Config, store: SharedStore) -> Self {
        let order_service = Arc::new(OrderService::new(
            store.clone(),
            config.default_page_size,
        ));
        Self {
            config,
            store,
            order_service,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 存储 (redb: work_dir/data/orders.redb，或内存)
    /// 3. 各服务
    pub async fn initialize(config: &Config) -> Result<Self> {
        config.ensure_work_dir_structure()?;

        let store: SharedStore = match config.storage_backend {
            StorageBackend::Redb => {
                let path = config.database_path();
                tracing::info!(path = %path.display(), "Opening redb store");
                Arc::new(RedbStore::open(&path)?)
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self::new(config.clone(), store))
    }

    /// 获取订单服务
    pub fn order_service(&self) -> &OrderService {
        &self.order_service
    }
}
