use thiserror::Error;

/// 服务器启动错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("存储初始化失败: {0}")]
    Storage(#[from] crate::store::StoreError),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

/// 启动流程的 Result 类型别名
pub type Result<T> = std::result::Result<T, ServerError>;
