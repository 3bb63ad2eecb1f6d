//! 企业采购处理器
//!
//! 企业采购项必须携带语法合法的税号（掩码形式 DD.DDD.DDD/DDDD-DD
//! 或 14 位纯数字），行总价受信用额度约束。大批量采购享受 15% 的
//! 批量折扣；行总价超过审批阈值时订单转入人工审批而非直接失败。

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use orderflow_shared::domain::{FailureReason, ProductCategory};

use crate::context::ProcessingContext;
use crate::error::ProcessingError;
use crate::handlers::{CategoryHandler, ItemContext, metadata_str};

/// 企业信用额度，行总价超过即拒绝
pub const CREDIT_LIMIT: Decimal = dec!(100000);
/// 人工审批阈值，行总价超过即转入待审批
pub const APPROVAL_THRESHOLD: Decimal = dec!(50000);
/// 批量折扣系数，折扣额 = 行总价 - 行总价 * 0.85
const VOLUME_DISCOUNT_RATE: Decimal = dec!(0.85);
/// 触发批量折扣的最小数量
const VOLUME_DISCOUNT_QUANTITY: u32 = 100;

static CNPJ_MASKED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}$").expect("CNPJ 掩码正则非法")
});
static CNPJ_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{14}$").expect("CNPJ 数字正则非法"));

pub struct CorporateHandler;

#[async_trait]
impl CategoryHandler for CorporateHandler {
    fn category(&self) -> ProductCategory {
        ProductCategory::Corporate
    }

    async fn handle(
        &self,
        item: ItemContext<'_>,
        ctx: &mut ProcessingContext,
    ) -> Result<(), ProcessingError> {
        let cnpj = metadata_str(&item.item.metadata, "cnpj").unwrap_or_default();
        if cnpj.trim().is_empty() || !is_valid_cnpj(&cnpj) {
            return Err(FailureReason::InvalidCorporateData.into());
        }

        let line_total = item.item.price_snapshot * Decimal::from(item.item.quantity);
        if line_total > CREDIT_LIMIT {
            return Err(FailureReason::CreditLimitExceeded.into());
        }

        if item.item.quantity > VOLUME_DISCOUNT_QUANTITY {
            let discount = line_total - line_total * VOLUME_DISCOUNT_RATE;
            ctx.apply_discount(discount);
            info!(
                order_id = item.order_id,
                product_id = %item.item.product_id,
                %discount,
                "已应用批量折扣"
            );
        }

        // 折扣先于审批阈值判断，阈值比较使用折扣前的行总价
        if line_total > APPROVAL_THRESHOLD {
            ctx.require_approval(FailureReason::PendingManualApproval);
        }

        let payment_terms =
            metadata_str(&item.item.metadata, "paymentTerms").unwrap_or_else(|| "NET_30".to_string());
        debug!(
            order_id = item.order_id,
            product_id = %item.item.product_id,
            payment_terms = %payment_terms,
            "企业采购项校验通过"
        );
        Ok(())
    }
}

/// 税号语法校验：掩码形式或 14 位纯数字
fn is_valid_cnpj(cnpj: &str) -> bool {
    CNPJ_MASKED.is_match(cnpj) || CNPJ_DIGITS.is_match(cnpj)
}
