//! 订单处理调度器
//!
//! 每条订单创建通知的处理入口。流程：按订单 id 加锁 -> 加载订单并
//! 执行幂等守卫 -> 全局预检 -> 逐项分发品类处理器 -> 结局判定 ->
//! 持久化新状态 -> 发布结果与告警。
//!
//! 幂等守卫配合每订单互斥锁构成原子的状态迁移：同一订单的并发
//! 重复投递会在锁上串行化，后到者读到非 Pending 状态后直接跳过，
//! 不会产生重复的结果事件或告警。

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use orderflow_shared::domain::{
    FailureReason, Order, OrderStatus, OrderStore, ProductCatalog, ProductCategory,
};
use orderflow_shared::error::OrderFlowError;
use orderflow_shared::events::{
    FraudAlertEvent, LowStockAlertEvent, OrderCreatedEvent, OrderResultEvent,
};
use orderflow_shared::retry::{RetryPolicy, retry_with_policy};

use crate::context::ProcessingContext;
use crate::error::ProcessingError;
use crate::handlers::{HandlerRegistry, ItemContext};
use crate::precheck::run_global_checks;
use crate::publisher::OutcomePublisher;

/// 订单处理调度器
pub struct OrderProcessor {
    store: Arc<dyn OrderStore>,
    catalog: Arc<dyn ProductCatalog>,
    handlers: HandlerRegistry,
    publisher: Arc<dyn OutcomePublisher>,
    retry: RetryPolicy,
    // 每订单互斥锁，关闭重复投递下"读状态-写状态"的竞态窗口
    order_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl OrderProcessor {
    pub fn new(
        store: Arc<dyn OrderStore>,
        catalog: Arc<dyn ProductCatalog>,
        publisher: Arc<dyn OutcomePublisher>,
        retry: RetryPolicy,
    ) -> Self {
        let handlers = HandlerRegistry::new(store.clone());
        Self {
            store,
            catalog,
            handlers,
            publisher,
            retry,
            order_locks: DashMap::new(),
        }
    }

    /// 处理一条订单创建通知
    ///
    /// 跳过条件（订单不存在、重复投递）以错误返回由调用方记录日志后
    /// 丢弃；基础设施错误向上传播，订单保持 Pending 等待重投递。
    pub async fn process(&self, event: &OrderCreatedEvent) -> Result<(), ProcessingError> {
        info!(order_id = %event.order_id, customer_id = %event.customer_id, "开始处理订单");

        let lock = self
            .order_locks
            .entry(event.order_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = lock.lock().await;

        let result = self.process_locked(event).await;

        drop(guard);
        // 无其他等待者时回收锁条目，避免锁表随订单数无界增长
        self.order_locks
            .remove_if(&event.order_id, |_, l| Arc::strong_count(l) <= 2);

        result
    }

    async fn process_locked(&self, event: &OrderCreatedEvent) -> Result<(), ProcessingError> {
        let mut order = retry_with_policy(
            &self.retry,
            "load_order",
            OrderFlowError::is_retryable,
            || self.store.find_by_id(&event.order_id),
        )
        .await?
        .ok_or_else(|| ProcessingError::OrderNotFound {
            order_id: event.order_id.clone(),
        })?;

        // 幂等守卫：已离开 Pending 的订单不再处理
        if order.status.is_settled() {
            return Err(ProcessingError::AlreadySettled {
                order_id: order.order_id.clone(),
                status: order.status,
            });
        }

        match self.evaluate(event).await {
            Ok(ctx) if ctx.requires_approval() => self.finish_pending_approval(&mut order, &ctx).await,
            Ok(ctx) => self.finish_processed(&mut order, &ctx).await,
            Err(ProcessingError::Rule(reason)) if reason.is_non_terminal() => {
                // 非终态条件直接上抛的路径：转入待审批，不携带重算总价
                self.transition_and_save(&mut order, OrderStatus::PendingApproval)
                    .await?;
                self.publish_result(OrderResultEvent::pending_approval(
                    &order.order_id,
                    reason,
                ))
                .await;
                Ok(())
            }
            Err(ProcessingError::Rule(reason)) => self.finish_failed(&mut order, reason).await,
            // 基础设施错误：订单保持 Pending，留给重投递
            Err(other) => Err(other),
        }
    }

    /// 全局预检与逐项品类评估
    ///
    /// 任一业务规则失败立即短路，已累计的低库存记录随上下文一并丢弃。
    async fn evaluate(&self, event: &OrderCreatedEvent) -> Result<ProcessingContext, ProcessingError> {
        run_global_checks(&event.order_id, event.total_amount)?;

        let mut ctx = ProcessingContext::new(event.total_amount);
        let mut has_physical = false;
        let mut has_pre_order = false;

        for item in &event.items {
            let product = self.catalog.find_by_id(&item.product_id).ok_or_else(|| {
                warn!(
                    order_id = %event.order_id,
                    product_id = %item.product_id,
                    "商品不在目录中"
                );
                ProcessingError::Rule(FailureReason::WarehouseUnavailable)
            })?;

            let handler = self.handlers.get(item.category).ok_or_else(|| {
                OrderFlowError::Internal(format!("品类 {} 未注册处理器", item.category))
            })?;

            handler
                .handle(
                    ItemContext {
                        order_id: &event.order_id,
                        customer_id: &event.customer_id,
                        item,
                        product: &product,
                    },
                    &mut ctx,
                )
                .await?;

            has_physical |= item.category == ProductCategory::Physical;
            has_pre_order |= item.category == ProductCategory::PreOrder;
        }

        if has_physical && has_pre_order {
            info!(order_id = %event.order_id, "订单同时含实体与预售商品，将分开发货");
        }

        Ok(ctx)
    }

    async fn finish_processed(
        &self,
        order: &mut Order,
        ctx: &ProcessingContext,
    ) -> Result<(), ProcessingError> {
        order.total_amount = Some(ctx.total_amount());
        self.transition_and_save(order, OrderStatus::Processed)
            .await?;

        self.publish_result(OrderResultEvent::processed(&order.order_id))
            .await;
        self.publish_low_stock_alerts(&order.order_id, ctx).await;

        info!(
            order_id = %order.order_id,
            total_amount = %ctx.total_amount(),
            "订单处理成功"
        );
        Ok(())
    }

    async fn finish_pending_approval(
        &self,
        order: &mut Order,
        ctx: &ProcessingContext,
    ) -> Result<(), ProcessingError> {
        let reason = ctx
            .pending_reason()
            .unwrap_or(FailureReason::PendingManualApproval);

        order.total_amount = Some(ctx.total_amount());
        self.transition_and_save(order, OrderStatus::PendingApproval)
            .await?;

        self.publish_result(OrderResultEvent::pending_approval(&order.order_id, reason))
            .await;
        self.publish_low_stock_alerts(&order.order_id, ctx).await;

        info!(order_id = %order.order_id, reason = %reason, "订单转入人工审批");
        Ok(())
    }

    async fn finish_failed(
        &self,
        order: &mut Order,
        reason: FailureReason,
    ) -> Result<(), ProcessingError> {
        self.transition_and_save(order, OrderStatus::Failed).await?;

        self.publish_result(OrderResultEvent::failed(&order.order_id, reason))
            .await;

        // 欺诈判定在订单落入 FAILED 后补发旁路告警
        if reason == FailureReason::FraudAlert {
            let alert = FraudAlertEvent::new(&order.order_id);
            if let Err(e) = self.publisher.publish_fraud_alert(&alert).await {
                error!(order_id = %order.order_id, error = %e, "欺诈告警发布失败，已丢弃");
            }
        }

        error!(order_id = %order.order_id, reason = %reason, "订单处理失败");
        Ok(())
    }

    /// 迁移状态并带重试保存
    ///
    /// 保存重试耗尽时错误向上传播：存储中的订单仍为 Pending，
    /// 后续重投递会重新进入处理。
    async fn transition_and_save(
        &self,
        order: &mut Order,
        status: OrderStatus,
    ) -> Result<(), ProcessingError> {
        order.update_status(status);
        retry_with_policy(
            &self.retry,
            "save_order",
            OrderFlowError::is_retryable,
            || self.store.save(order),
        )
        .await?;
        Ok(())
    }

    /// 发布结果事件，重试耗尽后丢弃而非阻塞
    async fn publish_result(&self, event: OrderResultEvent) {
        if let Err(e) = self.publisher.publish_result(&event).await {
            error!(
                order_id = event.order_id(),
                event_type = %event.event_type,
                error = %e,
                "结果事件发布失败，已丢弃"
            );
        }
    }

    /// 逐条发布累计的低库存告警
    async fn publish_low_stock_alerts(&self, order_id: &str, ctx: &ProcessingContext) {
        for note in ctx.low_stock_notes() {
            let alert = LowStockAlertEvent::new(order_id, &note.product_id, note.remaining_stock);
            if let Err(e) = self.publisher.publish_low_stock(&alert).await {
                error!(
                    order_id,
                    product_id = %note.product_id,
                    error = %e,
                    "低库存告警发布失败，已丢弃"
                );
            }
        }
    }
}
