//! Kafka 消费者与消息分发
//!
//! 将 order.events 上的消息解码为订单创建通知并交给调度器。
//! 跳过条件与业务结局都在调度器内部收敛，消费循环只记录日志，
//! 单条坏消息不会中断消费。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use orderflow_shared::config::AppConfig;
use orderflow_shared::events::OrderCreatedEvent;
use orderflow_shared::kafka::{ConsumerMessage, KafkaConsumer, topics};

use crate::error::ProcessingError;
use crate::processor::OrderProcessor;

/// 订单事件消费者
///
/// 组合 KafkaConsumer（消息拉取）与 OrderProcessor（业务处理），
/// 形成完整的消费管道。
pub struct OrderEventConsumer {
    consumer: KafkaConsumer,
    processor: Arc<OrderProcessor>,
}

impl OrderEventConsumer {
    pub fn new(config: &AppConfig, processor: Arc<OrderProcessor>) -> Result<Self, ProcessingError> {
        let consumer = KafkaConsumer::new(&config.kafka, None)?;
        Ok(Self {
            consumer,
            processor,
        })
    }

    /// 启动消费循环，直到收到 shutdown 信号
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), ProcessingError> {
        self.consumer.subscribe(&[topics::ORDER_EVENTS])?;

        info!(topic = topics::ORDER_EVENTS, "订单事件消费者已启动");

        let processor = self.processor;

        self.consumer
            .start(shutdown, |msg| {
                let processor = processor.clone();
                async move {
                    handle_message(&processor, &msg).await;
                    Ok(())
                }
            })
            .await;

        info!("订单事件消费者已停止");
        Ok(())
    }
}

/// 处理单条 Kafka 消息
///
/// 拆分为独立函数便于在测试中直接调用而无需构造完整的消费者。
/// 所有错误在此收敛为日志：跳过条件按预期丢弃，基础设施错误记录
/// 后交由 Kafka 重投递，消费循环永不中断。
pub async fn handle_message(processor: &OrderProcessor, msg: &ConsumerMessage) {
    let event: OrderCreatedEvent = match msg.deserialize_payload() {
        Ok(event) => event,
        Err(e) => {
            warn!(
                topic = %msg.topic,
                partition = msg.partition,
                offset = msg.offset,
                error = %e,
                "订单通知反序列化失败，丢弃消息"
            );
            return;
        }
    };

    match processor.process(&event).await {
        Ok(()) => {}
        Err(e) if e.is_skip() => {
            info!(order_id = %event.order_id, reason = %e, "跳过订单通知");
        }
        Err(e) => {
            error!(
                order_id = %event.order_id,
                error = %e,
                "订单处理出错，等待重投递"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_shared::events::OrderItemPayload;
    use orderflow_shared::domain::ProductCategory;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn make_test_message(event: &OrderCreatedEvent) -> ConsumerMessage {
        let payload = serde_json::to_vec(event).expect("序列化测试事件失败");
        ConsumerMessage {
            topic: topics::ORDER_EVENTS.to_string(),
            partition: 0,
            offset: 1,
            key: Some(event.order_id.clone()),
            payload,
            timestamp: None,
            headers: HashMap::new(),
        }
    }

    #[test]
    fn test_order_created_event_roundtrip_through_message() {
        let event = OrderCreatedEvent::new(
            "ord-0001",
            "customer-001",
            dec!(179.80),
            vec![OrderItemPayload {
                product_id: "BOOK-CC-001".to_string(),
                category: ProductCategory::Physical,
                quantity: 2,
                price_snapshot: dec!(89.90),
                metadata: serde_json::json!({"warehouseLocation": "SP"}),
            }],
        );

        let msg = make_test_message(&event);
        let decoded: OrderCreatedEvent = msg.deserialize_payload().expect("反序列化失败");

        assert_eq!(decoded.order_id, "ord-0001");
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(decoded.items[0].category, ProductCategory::Physical);
    }

    #[test]
    fn test_malformed_payload_fails_deserialize() {
        let msg = ConsumerMessage {
            topic: topics::ORDER_EVENTS.to_string(),
            partition: 0,
            offset: 2,
            key: None,
            payload: b"{not valid json".to_vec(),
            timestamp: None,
            headers: HashMap::new(),
        };

        let result: Result<OrderCreatedEvent, _> = msg.deserialize_payload();
        assert!(result.is_err());
    }
}
