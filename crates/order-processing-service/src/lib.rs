//! 订单处理服务
//!
//! 消费 Kafka 中的订单创建通知，对每个订单项执行品类规则校验，
//! 计算折扣后的最终应收金额，并将订单判定为处理成功、失败或
//! 待人工审批三种结局之一，随后发布结果事件与旁路告警。

pub mod consumer;
pub mod context;
pub mod error;
pub mod handlers;
pub mod hash;
pub mod precheck;
pub mod processor;
pub mod publisher;
