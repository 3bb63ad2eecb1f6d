//! 预售商品处理器
//!
//! 预售商品必须有未到的发售日期，且购买数量不超过声明的预售名额。
//! metadata 可携带可选的预售折扣：小于 1 的值按行总价比例计算，
//! 否则按绝对金额，负数折扣截断为 0。

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use orderflow_shared::domain::{FailureReason, ProductCategory};

use crate::context::ProcessingContext;
use crate::error::ProcessingError;
use crate::handlers::{CategoryHandler, ItemContext, metadata_str};

pub struct PreOrderHandler;

#[async_trait]
impl CategoryHandler for PreOrderHandler {
    fn category(&self) -> ProductCategory {
        ProductCategory::PreOrder
    }

    async fn handle(
        &self,
        item: ItemContext<'_>,
        ctx: &mut ProcessingContext,
    ) -> Result<(), ProcessingError> {
        let Some(release_date) = item.product.release_date else {
            return Err(FailureReason::InvalidReleaseDate.into());
        };
        // 发售日必须严格在未来，当天视为已发售
        if release_date <= Utc::now().date_naive() {
            return Err(FailureReason::ReleaseDatePassed.into());
        }

        if let Some(slots) = item.product.pre_order_slots
            && item.item.quantity > slots
        {
            return Err(FailureReason::PreOrderSoldOut.into());
        }

        let discount = resolve_discount(
            &item.item.metadata,
            item.item.price_snapshot,
            item.item.quantity,
        );
        if discount > Decimal::ZERO {
            info!(
                order_id = item.order_id,
                product_id = %item.item.product_id,
                %discount,
                "已应用预售折扣"
            );
            ctx.apply_discount(discount);
        }
        Ok(())
    }
}

/// 从 metadata 解析预售折扣
///
/// 小于 1 的值视为行总价的比例，否则视为绝对金额；
/// 解析失败或未携带折扣时返回 0，负数结果截断为 0。
fn resolve_discount(metadata: &serde_json::Value, price: Decimal, quantity: u32) -> Decimal {
    let Some(raw) = metadata_str(metadata, "preOrderDiscount") else {
        return Decimal::ZERO;
    };

    let Ok(mut discount) = raw.parse::<Decimal>() else {
        warn!(value = %raw, "预售折扣格式无效，忽略");
        return Decimal::ZERO;
    };

    if discount < Decimal::ONE {
        discount = price * Decimal::from(quantity) * discount;
    }
    discount.max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use orderflow_shared::domain::ProductRecord;
    use orderflow_shared::events::OrderItemPayload;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn product(release_date: Option<NaiveDate>, slots: Option<u32>) -> ProductRecord {
        ProductRecord {
            product_id: "GAME-2025-001".to_string(),
            name: "Epic Game 2025".to_string(),
            category: ProductCategory::PreOrder,
            price: dec!(249.90),
            stock: Some(1000),
            active: true,
            release_date,
            pre_order_slots: slots,
            licenses: None,
        }
    }

    fn future_date() -> NaiveDate {
        (Utc::now() + Duration::days(30)).date_naive()
    }

    async fn run(
        release_date: Option<NaiveDate>,
        slots: Option<u32>,
        quantity: u32,
        metadata: serde_json::Value,
        ctx: &mut ProcessingContext,
    ) -> Result<(), ProcessingError> {
        let product = product(release_date, slots);
        let item = OrderItemPayload {
            product_id: "GAME-2025-001".to_string(),
            category: ProductCategory::PreOrder,
            quantity,
            price_snapshot: dec!(100),
            metadata,
        };
        PreOrderHandler
            .handle(
                ItemContext {
                    order_id: "ord-0001",
                    customer_id: "customer-001",
                    item: &item,
                    product: &product,
                },
                ctx,
            )
            .await
    }

    #[tokio::test]
    async fn test_future_release_passes() {
        let mut ctx = ProcessingContext::new(dec!(200));
        assert!(
            run(Some(future_date()), Some(1000), 2, serde_json::Value::Null, &mut ctx)
                .await
                .is_ok()
        );
        assert_eq!(ctx.total_amount(), dec!(200));
    }

    #[tokio::test]
    async fn test_missing_release_date() {
        let mut ctx = ProcessingContext::new(dec!(200));
        let err = run(None, Some(1000), 1, serde_json::Value::Null, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Rule(FailureReason::InvalidReleaseDate)
        ));
    }

    #[tokio::test]
    async fn test_today_counts_as_passed() {
        let mut ctx = ProcessingContext::new(dec!(200));
        let today = Utc::now().date_naive();
        let err = run(Some(today), Some(1000), 1, serde_json::Value::Null, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Rule(FailureReason::ReleaseDatePassed)
        ));
    }

    #[tokio::test]
    async fn test_quantity_exceeds_slots() {
        let mut ctx = ProcessingContext::new(dec!(200));
        let err = run(Some(future_date()), Some(3), 4, serde_json::Value::Null, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Rule(FailureReason::PreOrderSoldOut)
        ));
    }

    #[tokio::test]
    async fn test_fractional_discount_applied_to_line_total() {
        let mut ctx = ProcessingContext::new(dec!(200));
        // 0.1 * (100 * 2) = 20
        let meta = json!({"preOrderDiscount": "0.1"});
        assert!(
            run(Some(future_date()), Some(1000), 2, meta, &mut ctx)
                .await
                .is_ok()
        );
        assert_eq!(ctx.total_amount(), dec!(180));
    }

    #[tokio::test]
    async fn test_absolute_discount() {
        let mut ctx = ProcessingContext::new(dec!(200));
        // metadata 中的数字值同样可解析
        let meta = json!({"preOrderDiscount": 25});
        assert!(
            run(Some(future_date()), Some(1000), 1, meta, &mut ctx)
                .await
                .is_ok()
        );
        assert_eq!(ctx.total_amount(), dec!(175));
    }

    #[tokio::test]
    async fn test_negative_discount_clamped() {
        let mut ctx = ProcessingContext::new(dec!(200));
        let meta = json!({"preOrderDiscount": "-5"});
        assert!(
            run(Some(future_date()), Some(1000), 1, meta, &mut ctx)
                .await
                .is_ok()
        );
        assert_eq!(ctx.total_amount(), dec!(200));
    }

    #[tokio::test]
    async fn test_invalid_discount_ignored() {
        let mut ctx = ProcessingContext::new(dec!(200));
        let meta = json!({"preOrderDiscount": "ten percent"});
        assert!(
            run(Some(future_date()), Some(1000), 1, meta, &mut ctx)
                .await
                .is_ok()
        );
        assert_eq!(ctx.total_amount(), dec!(200));
    }
}
