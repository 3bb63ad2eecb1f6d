//! 订单事件模型
//!
//! 定义订单处理管道的全部线上事件：入站的订单创建通知、出站的处理结果
//! 事件以及两类旁路告警（低库存、欺诈嫌疑）。所有事件以 camelCase JSON
//! 序列化，发布时以订单 id 作为消息 key——同一订单的事件落在同一分区，
//! 由分区内有序保证同一订单的通知按提交顺序被消费。

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{FailureReason, ProductCategory};

// ---------------------------------------------------------------------------
// OrderCreatedEvent — 入站订单创建通知
// ---------------------------------------------------------------------------

/// 订单项负载
///
/// 价格快照与 metadata 随事件携带，处理引擎不回表读取订单项。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: String,
    pub category: ProductCategory,
    pub quantity: u32,
    pub price_snapshot: Decimal,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// 订单创建通知
///
/// 由入口服务在订单落库后发布，是处理引擎的唯一触发源。
/// total_amount 为提交时的总价，引擎在处理中重算折扣后的最终金额。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreatedEvent {
    pub event_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemPayload>,
}

impl OrderCreatedEvent {
    /// 构建新通知，自动生成 event_id
    pub fn new(
        order_id: impl Into<String>,
        customer_id: impl Into<String>,
        total_amount: Decimal,
        items: Vec<OrderItemPayload>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            order_id: order_id.into(),
            customer_id: customer_id.into(),
            total_amount,
            created_at: Utc::now(),
            items,
        }
    }
}

// ---------------------------------------------------------------------------
// OrderResultEvent — 出站处理结果
// ---------------------------------------------------------------------------

/// 结果事件类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultEventType {
    OrderProcessed,
    OrderFailed,
    OrderPendingApproval,
}

impl std::fmt::Display for ResultEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OrderProcessed => "ORDER_PROCESSED",
            Self::OrderFailed => "ORDER_FAILED",
            Self::OrderPendingApproval => "ORDER_PENDING_APPROVAL",
        };
        write!(f, "{s}")
    }
}

/// 结果负载，与 event_type 标签一一对应
///
/// untagged 序列化：三个变体的时间戳字段名互不相同
/// （processedAt / failedAt / pendingAt），反序列化时足以区分。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultPayload {
    #[serde(rename_all = "camelCase")]
    Failed {
        order_id: String,
        reason: FailureReason,
        failed_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    PendingApproval {
        order_id: String,
        reason: FailureReason,
        pending_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    Processed {
        order_id: String,
        processed_at: DateTime<Utc>,
    },
}

/// 订单处理结果事件
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResultEvent {
    pub event_id: String,
    pub event_type: ResultEventType,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: ResultPayload,
}

impl OrderResultEvent {
    /// 订单处理成功
    pub fn processed(order_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: ResultEventType::OrderProcessed,
            timestamp: now,
            payload: ResultPayload::Processed {
                order_id: order_id.into(),
                processed_at: now,
            },
        }
    }

    /// 订单处理失败
    pub fn failed(order_id: impl Into<String>, reason: FailureReason) -> Self {
        let now = Utc::now();
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: ResultEventType::OrderFailed,
            timestamp: now,
            payload: ResultPayload::Failed {
                order_id: order_id.into(),
                reason,
                failed_at: now,
            },
        }
    }

    /// 订单待人工审批
    pub fn pending_approval(order_id: impl Into<String>, reason: FailureReason) -> Self {
        let now = Utc::now();
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: ResultEventType::OrderPendingApproval,
            timestamp: now,
            payload: ResultPayload::PendingApproval {
                order_id: order_id.into(),
                reason,
                pending_at: now,
            },
        }
    }

    /// 事件关联的订单 id，用作 Kafka 消息 key
    pub fn order_id(&self) -> &str {
        match &self.payload {
            ResultPayload::Processed { order_id, .. }
            | ResultPayload::Failed { order_id, .. }
            | ResultPayload::PendingApproval { order_id, .. } => order_id,
        }
    }
}

// ---------------------------------------------------------------------------
// 告警事件
// ---------------------------------------------------------------------------

/// 告警事件类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertEventType {
    LowStockAlert,
    FraudAlert,
}

/// 低库存告警
///
/// 实体商品扣减模拟后剩余库存低于安全水位时发布，每个触发商品一条。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlertEvent {
    pub event_id: String,
    pub event_type: AlertEventType,
    pub timestamp: DateTime<Utc>,
    pub order_id: String,
    pub product_id: String,
    pub remaining_stock: u32,
}

impl LowStockAlertEvent {
    pub fn new(
        order_id: impl Into<String>,
        product_id: impl Into<String>,
        remaining_stock: u32,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: AlertEventType::LowStockAlert,
            timestamp: Utc::now(),
            order_id: order_id.into(),
            product_id: product_id.into(),
            remaining_stock,
        }
    }
}

/// 欺诈告警
///
/// 全局预检判定 FRAUD_ALERT 且订单已落入 FAILED 后补发。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAlertEvent {
    pub event_id: String,
    pub event_type: AlertEventType,
    pub timestamp: DateTime<Utc>,
    pub order_id: String,
}

impl FraudAlertEvent {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type: AlertEventType::FraudAlert,
            timestamp: Utc::now(),
            order_id: order_id.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_created_event_serialization() {
        let event = OrderCreatedEvent::new(
            "ord-001",
            "customer-001",
            dec!(1200),
            vec![OrderItemPayload {
                product_id: "LAPTOP-PRO-2024".to_string(),
                category: ProductCategory::Physical,
                quantity: 4,
                price_snapshot: dec!(300.00),
                metadata: serde_json::json!({"warehouseLocation": "SP"}),
            }],
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("eventId"));
        assert!(json.contains("orderId"));
        assert!(json.contains("totalAmount"));
        assert!(json.contains("\"PHYSICAL\""));

        let parsed: OrderCreatedEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.order_id, "ord-001");
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].quantity, 4);
        assert_eq!(parsed.items[0].price_snapshot, dec!(300.00));
    }

    #[test]
    fn test_order_created_event_metadata_defaults_to_null() {
        // 入站事件可能不带 metadata 字段，缺省为 JSON null
        let json = r#"{
            "eventId": "evt-1",
            "orderId": "ord-001",
            "customerId": "customer-001",
            "totalAmount": "100",
            "createdAt": "2025-01-15T10:30:00Z",
            "items": [{
                "productId": "EBOOK-JAVA-001",
                "category": "DIGITAL",
                "quantity": 1,
                "priceSnapshot": "39.90"
            }]
        }"#;

        let parsed: OrderCreatedEvent = serde_json::from_str(json).unwrap();
        assert!(parsed.items[0].metadata.is_null());
    }

    #[test]
    fn test_result_event_processed() {
        let event = OrderResultEvent::processed("ord-001");
        assert_eq!(event.event_type, ResultEventType::OrderProcessed);
        assert_eq!(event.order_id(), "ord-001");

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"ORDER_PROCESSED\""));
        assert!(json.contains("processedAt"));
    }

    #[test]
    fn test_result_event_failed_carries_reason() {
        let event = OrderResultEvent::failed("ord-002", FailureReason::OutOfStock);
        assert_eq!(event.event_type, ResultEventType::OrderFailed);
        assert_eq!(event.order_id(), "ord-002");

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"ORDER_FAILED\""));
        assert!(json.contains("\"OUT_OF_STOCK\""));
        assert!(json.contains("failedAt"));

        let parsed: OrderResultEvent = serde_json::from_str(&json).unwrap();
        match parsed.payload {
            ResultPayload::Failed { reason, .. } => {
                assert_eq!(reason, FailureReason::OutOfStock);
            }
            other => panic!("期望 Failed 负载，实际为 {other:?}"),
        }
    }

    #[test]
    fn test_result_event_pending_approval() {
        let event =
            OrderResultEvent::pending_approval("ord-003", FailureReason::PendingManualApproval);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"ORDER_PENDING_APPROVAL\""));
        assert!(json.contains("pendingAt"));
        assert!(json.contains("\"PENDING_MANUAL_APPROVAL\""));

        let parsed: OrderResultEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.order_id(), "ord-003");
        assert!(matches!(
            parsed.payload,
            ResultPayload::PendingApproval { .. }
        ));
    }

    #[test]
    fn test_low_stock_alert_serialization() {
        let alert = LowStockAlertEvent::new("ord-001", "LAPTOP-PRO-2024", 2);

        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"LOW_STOCK_ALERT\""));
        assert!(json.contains("remainingStock"));

        let parsed: LowStockAlertEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.remaining_stock, 2);
        assert_eq!(parsed.product_id, "LAPTOP-PRO-2024");
    }

    #[test]
    fn test_fraud_alert_serialization() {
        let alert = FraudAlertEvent::new("ord-007");

        let json = serde_json::to_string(&alert).unwrap();
        assert!(json.contains("\"FRAUD_ALERT\""));

        let parsed: FraudAlertEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.order_id, "ord-007");
        assert_eq!(parsed.event_type, AlertEventType::FraudAlert);
    }
}
