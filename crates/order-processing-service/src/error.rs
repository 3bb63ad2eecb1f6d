//! 订单处理服务专用错误类型
//!
//! 在共享库 OrderFlowError 基础上区分三类情况：应被静默丢弃的跳过
//! 条件（订单不存在、重复投递）、作为处理结论的业务规则失败、
//! 以及需要按重试策略处理的基础设施故障。

use orderflow_shared::domain::{FailureReason, OrderStatus};
use orderflow_shared::error::OrderFlowError;

/// 订单处理错误
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    /// 通知对应的订单在存储中不存在，可能从未落库或已被删除，
    /// 丢弃通知而不向消息中间件报错
    #[error("订单不存在: {order_id}")]
    OrderNotFound { order_id: String },

    /// 幂等守卫识别出重复投递：订单已离开 Pending 状态，直接跳过
    #[error("订单已处理: {order_id} 当前状态 {status}")]
    AlreadySettled {
        order_id: String,
        status: OrderStatus,
    },

    /// 业务规则失败，是结论性判定而非错误，永远不会被重试
    #[error("业务规则失败: {0}")]
    Rule(FailureReason),

    /// 透传共享库错误，避免在每个 match 分支手动转换
    #[error(transparent)]
    Shared(#[from] OrderFlowError),
}

impl ProcessingError {
    /// 是否为应静默丢弃的跳过条件
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::OrderNotFound { .. } | Self::AlreadySettled { .. }
        )
    }
}

impl From<FailureReason> for ProcessingError {
    fn from(reason: FailureReason) -> Self {
        Self::Rule(reason)
    }
}
