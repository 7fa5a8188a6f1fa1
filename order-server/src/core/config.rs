use std::path::PathBuf;

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// 嵌入式 redb 文件 (work_dir/data/orders.redb)
    Redb,
    /// 进程内存储，重启即丢失
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "redb" => Some(StorageBackend::Redb),
            "memory" => Some(StorageBackend::Memory),
            _ => None,
        }
    }
}

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据 + 日志) |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | STORAGE_BACKEND | redb | redb 或 memory |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | DEFAULT_PAGE_SIZE | 20 | 订单列表默认分页大小 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 日志级别 (tracing filter)
    pub log_level: String,
    /// 是否输出 JSON 日志
    pub log_json: bool,
    /// 存储后端
    pub storage_backend: StorageBackend,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 订单列表默认分页大小
    pub default_page_size: u32,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        let storage_backend = std::env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|v| StorageBackend::parse(&v))
            .unwrap_or(StorageBackend::Redb);

        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_parse("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_parse("LOG_JSON", false),
            storage_backend,
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS", 30000),
            default_page_size: env_parse("DEFAULT_PAGE_SIZE", 20),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(
        work_dir: impl Into<String>,
        http_port: u16,
        storage_backend: StorageBackend,
    ) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config.storage_backend = storage_backend;
        config
    }

    /// 数据目录 (work_dir/data)
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("data")
    }

    /// 日志目录 (work_dir/logs)
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// redb 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("orders.redb")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.data_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
