//! 共享库
//!
//! 包含订单处理各服务共用的配置、错误处理、领域模型、事件信封、
//! Kafka 封装、重试策略与日志初始化等基础设施代码。

pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod kafka;
pub mod observability;
pub mod retry;
