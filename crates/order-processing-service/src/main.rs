//! 订单处理服务入口
//!
//! 装配顺序：配置 -> 日志 -> 存储与目录（内存实现） -> Kafka
//! 生产者与发布器 -> 调度器 -> 消费者。收到 Ctrl+C 后通过 watch
//! channel 广播关闭信号，消费循环处理完当前消息后自然退出。

use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use orderflow_mock_services::{InMemoryOrderStore, StaticProductCatalog};
use orderflow_shared::config::AppConfig;
use orderflow_shared::kafka::KafkaProducer;
use orderflow_shared::observability;

use order_processing_service::consumer::OrderEventConsumer;
use order_processing_service::processor::OrderProcessor;
use order_processing_service::publisher::KafkaOutcomePublisher;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load("order-processing").unwrap_or_else(|e| {
        eprintln!("配置加载失败，使用默认配置: {e}");
        AppConfig::default()
    });

    observability::init_logging(&config.observability)?;

    info!(
        service = %config.service_name,
        environment = %config.environment,
        "订单处理服务启动中"
    );

    // 存储与目录使用内存实现，真实部署时替换为持久化实现
    let store = Arc::new(InMemoryOrderStore::new());
    let catalog = Arc::new(StaticProductCatalog::new());

    let producer = KafkaProducer::new(&config.kafka)?;
    let retry = config.retry.to_policy();
    let publisher = Arc::new(KafkaOutcomePublisher::new(producer, retry.clone()));

    let processor = Arc::new(OrderProcessor::new(store, catalog, publisher, retry));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let consumer = OrderEventConsumer::new(&config, processor)?;
    let consumer_task = tokio::spawn(async move { consumer.run(shutdown_rx).await });

    signal::ctrl_c().await?;
    info!("收到 Ctrl+C，开始优雅关闭");
    shutdown_tx.send(true)?;

    if let Err(e) = consumer_task.await? {
        warn!(error = %e, "消费者退出时出错");
    }

    info!("订单处理服务已退出");
    Ok(())
}
