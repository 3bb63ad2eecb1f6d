//! 模拟服务
//!
//! 为本地开发与测试提供内存版的订单存储与商品目录实现，
//! 替代真实的数据库与目录服务。

pub mod catalog;
pub mod memory_store;
pub mod order_store;

pub use catalog::StaticProductCatalog;
pub use memory_store::MemoryStore;
pub use order_store::InMemoryOrderStore;
