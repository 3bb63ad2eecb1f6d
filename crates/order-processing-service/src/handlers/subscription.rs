//! 订阅商品处理器
//!
//! 订阅规则同时作用于两个范围：
//! - 单内约束：同一订单不重复选择、最多 5 个订阅、企业版与基础版互斥
//! - 跨单约束：客户名下已处理或待审批的订单中不得已含同一订阅
//!
//! 跨单校验需要查询订单存储，是五个处理器中唯一的异步依赖。

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use orderflow_shared::domain::{FailureReason, OrderStatus, OrderStore, ProductCategory};

use crate::context::ProcessingContext;
use crate::error::ProcessingError;
use crate::handlers::{CategoryHandler, ItemContext};

/// 单笔订单允许的最大订阅数
const MAX_SUBSCRIPTIONS_PER_ORDER: usize = 5;
/// 互斥的订阅层级对
const ENTERPRISE_TIER: &str = "SUB-ENTERPRISE-001";
const BASIC_TIER: &str = "SUB-BASIC-001";

pub struct SubscriptionHandler {
    store: Arc<dyn OrderStore>,
}

impl SubscriptionHandler {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// 客户名下是否已有活跃订单包含该订阅商品
    ///
    /// 只统计 PROCESSED 与 PENDING_APPROVAL 状态的订单；
    /// 失败或仍在 Pending 的订单不构成重复。
    async fn has_active_subscription(
        &self,
        customer_id: &str,
        product_id: &str,
    ) -> Result<bool, ProcessingError> {
        if customer_id.trim().is_empty() {
            return Ok(false);
        }

        let orders = self.store.find_by_customer(customer_id).await?;
        let duplicated = orders
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    OrderStatus::Processed | OrderStatus::PendingApproval
                )
            })
            .flat_map(|o| o.items.iter())
            .any(|item| item.product_id == product_id);

        Ok(duplicated)
    }
}

#[async_trait]
impl CategoryHandler for SubscriptionHandler {
    fn category(&self) -> ProductCategory {
        ProductCategory::Subscription
    }

    async fn handle(
        &self,
        item: ItemContext<'_>,
        ctx: &mut ProcessingContext,
    ) -> Result<(), ProcessingError> {
        let product_id = item.item.product_id.as_str();

        if ctx.has_selected_subscription(product_id) {
            return Err(FailureReason::DuplicateActiveSubscription.into());
        }
        if ctx.selected_subscription_count() >= MAX_SUBSCRIPTIONS_PER_ORDER {
            return Err(FailureReason::SubscriptionLimitExceeded.into());
        }
        if is_incompatible_pair(ctx, product_id) {
            return Err(FailureReason::IncompatibleSubscriptions.into());
        }
        if self
            .has_active_subscription(item.customer_id, product_id)
            .await?
        {
            return Err(FailureReason::DuplicateActiveSubscription.into());
        }

        ctx.select_subscription(product_id);
        schedule_first_billing(item.order_id, product_id);
        Ok(())
    }
}

/// 企业版与基础版在同一订单内互斥，方向无关
fn is_incompatible_pair(ctx: &ProcessingContext, product_id: &str) -> bool {
    (ctx.has_selected_subscription(ENTERPRISE_TIER) && product_id == BASIC_TIER)
        || (ctx.has_selected_subscription(BASIC_TIER) && product_id == ENTERPRISE_TIER)
}

/// 首期扣费排期的占位实现
fn schedule_first_billing(order_id: &str, product_id: &str) {
    debug!(order_id, product_id, "已排期订阅首次扣费");
    info!(order_id, product_id, "订阅已登记");
}
