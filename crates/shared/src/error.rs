//! 统一错误处理模块
//!
//! 定义各服务共享的基础设施错误类型，使用 thiserror 提供良好的错误信息。
//! 注意业务规则失败（如库存不足、欺诈嫌疑）不属于这里——它们是处理结论
//! 而非错误，由 `domain::FailureReason` 单独建模。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum OrderFlowError {
    // ==================== 存储错误 ====================
    #[error("存储错误: {0}")]
    Store(String),

    #[error("记录未找到: {entity} id={id}")]
    NotFound { entity: String, id: String },

    // ==================== Kafka 错误 ====================
    #[error("Kafka 错误: {0}")]
    Kafka(String),

    // ==================== 序列化错误 ====================
    #[error("序列化失败: {0}")]
    Serialization(String),

    // ==================== 通用错误 ====================
    #[error("配置错误: {0}")]
    Config(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, OrderFlowError>;

impl OrderFlowError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(_) => "STORE_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Kafka(_) => "KAFKA_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 是否为可重试错误
    ///
    /// 只有存储与消息中间件的瞬时故障值得重试；
    /// 序列化失败、记录缺失等错误重试也不会有不同结果。
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Kafka(_))
    }
}
