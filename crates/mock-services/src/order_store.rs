//! 内存订单存储
//!
//! `OrderStore` 的内存实现，底层使用 [`MemoryStore`]。
//! 用于本地开发和集成测试，不提供持久化。

use async_trait::async_trait;

use orderflow_shared::domain::{Order, OrderStore};
use orderflow_shared::error::OrderFlowError;

use crate::memory_store::MemoryStore;

/// 内存订单存储
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    orders: MemoryStore<Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: MemoryStore::new(),
        }
    }

    /// 当前存储的订单总数（测试断言用）
    pub fn count(&self) -> usize {
        self.orders.count()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, OrderFlowError> {
        Ok(self.orders.get(order_id))
    }

    async fn save(&self, order: &Order) -> Result<(), OrderFlowError> {
        self.orders.insert(&order.order_id, order.clone());
        Ok(())
    }

    async fn find_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderFlowError> {
        let mut orders = self.orders.list_by(|o| o.customer_id == customer_id);
        // 创建时间降序，与真实存储的查询契约一致
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
