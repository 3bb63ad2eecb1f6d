//! 结果与告警发布
//!
//! 将处理结局与旁路告警发布到 Kafka 的出站 topic。发布抽象为 trait，
//! 调度器不感知传输细节，测试中可注入内存实现捕获事件。

use async_trait::async_trait;
use tracing::debug;

use orderflow_shared::error::OrderFlowError;
use orderflow_shared::events::{FraudAlertEvent, LowStockAlertEvent, OrderResultEvent};
use orderflow_shared::kafka::{KafkaProducer, topics};
use orderflow_shared::retry::{RetryPolicy, retry_with_policy};

/// 处理结局发布器
///
/// 结果事件与告警事件分别发往 order.results 与 order.alerts，
/// 均以订单 id 作为消息 key 保证分区内有序。
#[async_trait]
pub trait OutcomePublisher: Send + Sync {
    /// 发布处理结果（processed / failed / pending-approval）
    async fn publish_result(&self, event: &OrderResultEvent) -> Result<(), OrderFlowError>;

    /// 发布低库存告警
    async fn publish_low_stock(&self, event: &LowStockAlertEvent) -> Result<(), OrderFlowError>;

    /// 发布欺诈告警
    async fn publish_fraud_alert(&self, event: &FraudAlertEvent) -> Result<(), OrderFlowError>;
}

/// 基于 Kafka 的发布器实现
///
/// 发送失败按固定退避重试；重试耗尽后错误向上返回，
/// 由调度器决定丢弃并记录。
pub struct KafkaOutcomePublisher {
    producer: KafkaProducer,
    retry: RetryPolicy,
}

impl KafkaOutcomePublisher {
    pub fn new(producer: KafkaProducer, retry: RetryPolicy) -> Self {
        Self { producer, retry }
    }

    async fn send_with_retry<T: serde::Serialize + Sync>(
        &self,
        topic: &str,
        key: &str,
        event: &T,
        operation: &str,
    ) -> Result<(), OrderFlowError> {
        retry_with_policy(&self.retry, operation, OrderFlowError::is_retryable, || {
            self.producer.send_json(topic, key, event)
        })
        .await?;

        debug!(topic, key, operation, "事件已发布");
        Ok(())
    }
}

#[async_trait]
impl OutcomePublisher for KafkaOutcomePublisher {
    async fn publish_result(&self, event: &OrderResultEvent) -> Result<(), OrderFlowError> {
        self.send_with_retry(topics::ORDER_RESULTS, event.order_id(), event, "publish_result")
            .await
    }

    async fn publish_low_stock(&self, event: &LowStockAlertEvent) -> Result<(), OrderFlowError> {
        self.send_with_retry(
            topics::ORDER_ALERTS,
            &event.order_id,
            event,
            "publish_low_stock",
        )
        .await
    }

    async fn publish_fraud_alert(&self, event: &FraudAlertEvent) -> Result<(), OrderFlowError> {
        self.send_with_retry(
            topics::ORDER_ALERTS,
            &event.order_id,
            event,
            "publish_fraud_alert",
        )
        .await
    }
}
