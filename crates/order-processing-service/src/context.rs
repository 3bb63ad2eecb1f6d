//! 处理上下文
//!
//! 单次处理尝试的临时累加器：从订单提交总价出发累计折扣，
//! 记录审批标记与低库存告警。每次处理尝试独立构造，从不持久化。

use std::collections::HashSet;

use rust_decimal::Decimal;

use orderflow_shared::domain::FailureReason;

/// 低库存记录
///
/// 实体商品扣减模拟后剩余库存低于安全水位时追加，
/// 处理成功后由告警发布器逐条发出。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockNote {
    pub product_id: String,
    pub remaining_stock: u32,
}

/// 处理上下文
///
/// 由调度器构造后以可变引用依次传给各品类处理器。
/// 审批标记只认首次设置，后续调用不覆盖原因。
#[derive(Debug)]
pub struct ProcessingContext {
    total_amount: Decimal,
    requires_approval: bool,
    pending_reason: Option<FailureReason>,
    low_stock: Vec<LowStockNote>,
    selected_subscriptions: HashSet<String>,
}

impl ProcessingContext {
    /// 以订单提交时的总价初始化
    pub fn new(total_amount: Decimal) -> Self {
        Self {
            total_amount,
            requires_approval: false,
            pending_reason: None,
            low_stock: Vec::new(),
            selected_subscriptions: HashSet::new(),
        }
    }

    /// 当前累计总价（提交总价减去已应用折扣）
    pub fn total_amount(&self) -> Decimal {
        self.total_amount
    }

    /// 应用折扣，非正数直接忽略
    pub fn apply_discount(&mut self, discount: Decimal) {
        if discount <= Decimal::ZERO {
            return;
        }
        self.total_amount -= discount;
    }

    /// 标记订单需要人工审批，首次设置的原因生效
    pub fn require_approval(&mut self, reason: FailureReason) {
        if self.requires_approval {
            return;
        }
        self.requires_approval = true;
        self.pending_reason = Some(reason);
    }

    pub fn requires_approval(&self) -> bool {
        self.requires_approval
    }

    /// 审批原因，未标记审批时为 None
    pub fn pending_reason(&self) -> Option<FailureReason> {
        self.pending_reason
    }

    /// 追加一条低库存记录
    pub fn note_low_stock(&mut self, product_id: impl Into<String>, remaining_stock: u32) {
        self.low_stock.push(LowStockNote {
            product_id: product_id.into(),
            remaining_stock,
        });
    }

    pub fn low_stock_notes(&self) -> &[LowStockNote] {
        &self.low_stock
    }

    /// 本订单内是否已选择过该订阅商品
    pub fn has_selected_subscription(&self, product_id: &str) -> bool {
        self.selected_subscriptions.contains(product_id)
    }

    /// 本订单内已选择的订阅商品数量
    pub fn selected_subscription_count(&self) -> usize {
        self.selected_subscriptions.len()
    }

    /// 将订阅商品标记为已选择
    pub fn select_subscription(&mut self, product_id: impl Into<String>) {
        self.selected_subscriptions.insert(product_id.into());
    }
}
