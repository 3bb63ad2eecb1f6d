//! 静态商品目录
//!
//! `ProductCatalog` 的内存实现：启动时以固定数据集初始化，
//! 覆盖全部五个品类，供本地开发与集成测试使用。

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use orderflow_shared::domain::{ProductCatalog, ProductCategory, ProductRecord};

/// 静态商品目录
///
/// 只读查找表，构造后不再变化。
#[derive(Debug, Clone)]
pub struct StaticProductCatalog {
    products: HashMap<String, ProductRecord>,
}

impl Default for StaticProductCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// 构造商品记录的简便函数，未涉及的可选字段由调用处显式给出
#[allow(clippy::too_many_arguments)]
fn product(
    product_id: &str,
    name: &str,
    category: ProductCategory,
    price: Decimal,
    stock: Option<u32>,
    release_date: Option<NaiveDate>,
    pre_order_slots: Option<u32>,
    licenses: Option<u32>,
) -> ProductRecord {
    ProductRecord {
        product_id: product_id.to_string(),
        name: name.to_string(),
        category,
        price,
        stock,
        active: true,
        release_date,
        pre_order_slots,
        licenses,
    }
}

impl StaticProductCatalog {
    /// 创建并以固定数据集初始化目录
    pub fn new() -> Self {
        use ProductCategory::*;

        let seed = [
            // 实体商品
            product("BOOK-CC-001", "Clean Code", Physical, dec!(89.90), Some(150), None, None, None),
            product("LAPTOP-PRO-2024", "Laptop Pro", Physical, dec!(5499.00), Some(8), None, None, None),
            product("LAPTOP-MBP-M3-001", "MacBook Pro M3", Physical, dec!(12999.00), Some(25), None, None, None),
            // 订阅
            product("SUB-PREMIUM-001", "Premium Monthly", Subscription, dec!(49.90), None, None, None, None),
            product("SUB-BASIC-001", "Basic Monthly", Subscription, dec!(19.90), None, None, None, None),
            product("SUB-ENTERPRISE-001", "Enterprise Plan", Subscription, dec!(299.00), None, None, None, None),
            product("SUB-ADOBE-CC-001", "Adobe Creative Cloud", Subscription, dec!(159.00), None, None, None, None),
            // 数字商品
            product("EBOOK-JAVA-001", "Effective Java", Digital, dec!(39.90), None, None, None, Some(1000)),
            product("EBOOK-DDD-001", "Domain-Driven Design", Digital, dec!(59.90), None, None, None, Some(500)),
            product("EBOOK-SWIFT-001", "Swift Programming", Digital, dec!(49.90), None, None, None, Some(800)),
            product("COURSE-KAFKA-001", "Kafka Mastery", Digital, dec!(299.00), None, None, None, Some(500)),
            // 预售
            product("GAME-2025-001", "Epic Game 2025", PreOrder, dec!(249.90), Some(1000), NaiveDate::from_ymd_opt(2025, 6, 1), Some(1000), None),
            product("PRE-PS6-001", "PlayStation 6", PreOrder, dec!(4999.00), Some(500), NaiveDate::from_ymd_opt(2025, 11, 15), Some(500), None),
            product("PRE-IPHONE16-001", "iPhone 16 Pro", PreOrder, dec!(7999.00), Some(2000), NaiveDate::from_ymd_opt(2025, 9, 20), Some(2000), None),
            // 企业采购
            product("CORP-LICENSE-ENT", "Enterprise License", Corporate, dec!(15000.00), None, None, None, None),
            product("CORP-CHAIR-ERG-001", "Ergonomic Chair Bulk", Corporate, dec!(899.00), Some(500), None, None, None),
        ];

        let products = seed
            .into_iter()
            .map(|p| (p.product_id.clone(), p))
            .collect();

        Self { products }
    }
}

impl ProductCatalog for StaticProductCatalog {
    fn find_by_id(&self, product_id: &str) -> Option<ProductRecord> {
        self.products.get(product_id).cloned()
    }
}
