//! 品类规则处理器
//!
//! 五个品类各自对应一套独立的校验与定价规则，通过统一的
//! [`CategoryHandler`] trait 分发。处理器只读订单项与商品记录，
//! 所有跨品项状态都写入共享的 [`ProcessingContext`]。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use orderflow_shared::domain::{OrderStore, ProductCategory, ProductRecord};
use orderflow_shared::events::OrderItemPayload;

use crate::context::ProcessingContext;
use crate::error::ProcessingError;

mod corporate;
mod digital;
mod physical;
mod pre_order;
mod subscription;

pub use corporate::CorporateHandler;
pub use digital::DigitalHandler;
pub use physical::PhysicalHandler;
pub use pre_order::PreOrderHandler;
pub use subscription::SubscriptionHandler;

/// 单个订单项的处理输入
///
/// 商品记录已由调度器按 product_id 解析完成，处理器不再回查目录。
pub struct ItemContext<'a> {
    pub order_id: &'a str,
    pub customer_id: &'a str,
    pub item: &'a OrderItemPayload,
    pub product: &'a ProductRecord,
}

/// 品类规则处理器
///
/// 每个实现消费一个订单项并将结果写入共享上下文。业务规则失败以
/// `ProcessingError::Rule` 返回并使整单短路；只有订阅处理器需要
/// 访问存储，因此接口保持异步。
#[async_trait]
pub trait CategoryHandler: Send + Sync {
    /// 本处理器负责的品类
    fn category(&self) -> ProductCategory;

    /// 校验订单项并更新处理上下文
    async fn handle(
        &self,
        item: ItemContext<'_>,
        ctx: &mut ProcessingContext,
    ) -> Result<(), ProcessingError>;
}

/// 处理器注册表
///
/// 品类是封闭集合，启动时注册全部五个处理器后只读。
pub struct HandlerRegistry {
    handlers: HashMap<ProductCategory, Box<dyn CategoryHandler>>,
}

impl HandlerRegistry {
    /// 注册全部品类处理器
    ///
    /// 只有订阅处理器需要存储依赖（跨订单重复校验）。
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        let handlers: Vec<Box<dyn CategoryHandler>> = vec![
            Box::new(PhysicalHandler),
            Box::new(SubscriptionHandler::new(store)),
            Box::new(DigitalHandler),
            Box::new(PreOrderHandler),
            Box::new(CorporateHandler),
        ];

        Self {
            handlers: handlers.into_iter().map(|h| (h.category(), h)).collect(),
        }
    }

    /// 按品类取处理器
    ///
    /// 品类枚举封闭且构造时全量注册，正常情况下总能命中。
    pub fn get(&self, category: ProductCategory) -> Option<&dyn CategoryHandler> {
        self.handlers.get(&category).map(|h| h.as_ref())
    }
}

/// 从订单项 metadata 中宽松读取字符串字段
///
/// metadata 为不可信的自由格式 JSON：非对象、字段缺失都按"无值"处理，
/// 数字等非字符串值按其 JSON 文本返回。
pub(crate) fn metadata_str(metadata: &Value, key: &str) -> Option<String> {
    let value = metadata.as_object()?.get(key)?;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderflow_mock_services::InMemoryOrderStore;
    use serde_json::json;

    #[test]
    fn test_registry_covers_all_categories() {
        let registry = HandlerRegistry::new(Arc::new(InMemoryOrderStore::new()));

        for category in [
            ProductCategory::Physical,
            ProductCategory::Subscription,
            ProductCategory::Digital,
            ProductCategory::PreOrder,
            ProductCategory::Corporate,
        ] {
            let handler = registry.get(category).unwrap();
            assert_eq!(handler.category(), category);
        }
    }

    #[test]
    fn test_metadata_str_lenient() {
        let meta = json!({"warehouseLocation": "SP", "slots": 3});
        assert_eq!(
            metadata_str(&meta, "warehouseLocation"),
            Some("SP".to_string())
        );
        // 数字按 JSON 文本返回
        assert_eq!(metadata_str(&meta, "slots"), Some("3".to_string()));
        assert_eq!(metadata_str(&meta, "missing"), None);

        // 非对象与 null 都视为无值
        assert_eq!(metadata_str(&Value::Null, "any"), None);
        assert_eq!(metadata_str(&json!("raw string"), "any"), None);
        assert_eq!(metadata_str(&json!({"k": null}), "k"), None);
    }
}
