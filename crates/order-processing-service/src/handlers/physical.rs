//! 实体商品处理器
//!
//! 校验库存并模拟预留：库存从不真正扣减，但扣减后的剩余量低于
//! 安全水位时向上下文追加低库存记录。配送时效由仓库位置的稳定
//! 哈希推出 5-10 天的确定性估算。

use async_trait::async_trait;
use tracing::info;

use orderflow_shared::domain::{FailureReason, ProductCategory};

use crate::context::ProcessingContext;
use crate::error::ProcessingError;
use crate::handlers::{CategoryHandler, ItemContext, metadata_str};
use crate::hash::stable_hash;

/// 剩余库存低于该值时触发低库存告警
const LOW_STOCK_WATERMARK: u32 = 5;

pub struct PhysicalHandler;

#[async_trait]
impl CategoryHandler for PhysicalHandler {
    fn category(&self) -> ProductCategory {
        ProductCategory::Physical
    }

    async fn handle(
        &self,
        item: ItemContext<'_>,
        ctx: &mut ProcessingContext,
    ) -> Result<(), ProcessingError> {
        let available = item.product.stock.unwrap_or(0);
        if available < item.item.quantity {
            return Err(FailureReason::OutOfStock.into());
        }

        let remaining = available - item.item.quantity;
        if remaining < LOW_STOCK_WATERMARK {
            ctx.note_low_stock(&item.item.product_id, remaining);
        }

        // 预留与时效计算均为模拟，不修改全局库存
        let delivery_days = estimate_delivery_days(&item.item.metadata);
        info!(
            order_id = item.order_id,
            product_id = %item.item.product_id,
            quantity = item.item.quantity,
            delivery_days,
            "已预留实体商品"
        );
        Ok(())
    }
}

/// 由仓库位置推出 5-10 天的确定性配送估算
fn estimate_delivery_days(metadata: &serde_json::Value) -> u32 {
    let location =
        metadata_str(metadata, "warehouseLocation").unwrap_or_else(|| "DEFAULT".to_string());
    5 + stable_hash(&location) % 6
}
