//! 数字商品处理器
//!
//! 数字商品按客户只允许持有一份：数量大于 1 视为重复购买。
//! 许可证额度声明时需覆盖购买数量。发放许可证与交付邮件均为
//! 占位模拟，只生成标识并记录日志。

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use orderflow_shared::domain::{FailureReason, ProductCategory};

use crate::context::ProcessingContext;
use crate::error::ProcessingError;
use crate::handlers::{CategoryHandler, ItemContext};

pub struct DigitalHandler;

#[async_trait]
impl CategoryHandler for DigitalHandler {
    fn category(&self) -> ProductCategory {
        ProductCategory::Digital
    }

    async fn handle(
        &self,
        item: ItemContext<'_>,
        _ctx: &mut ProcessingContext,
    ) -> Result<(), ProcessingError> {
        if item.item.quantity > 1 {
            return Err(FailureReason::AlreadyOwned.into());
        }

        if let Some(licenses) = item.product.licenses
            && licenses < item.item.quantity
        {
            return Err(FailureReason::LicenseUnavailable.into());
        }

        let license = Uuid::new_v4().to_string();
        info!(
            order_id = item.order_id,
            product_id = %item.item.product_id,
            license = %license,
            "已生成许可证"
        );
        info!(
            order_id = item.order_id,
            product_id = %item.item.product_id,
            "已发送数字交付邮件"
        );
        Ok(())
    }
}
