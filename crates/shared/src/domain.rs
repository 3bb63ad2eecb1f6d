//! 订单领域模型与协作方抽象
//!
//! 定义订单、订单项、商品记录等核心数据结构，以及处理引擎依赖的
//! 两个外部协作方 trait：订单存储（`OrderStore`）与商品目录
//! （`ProductCatalog`）。存储与目录的持久化实现不在本系统范围内，
//! 引擎只依赖这里声明的最小接口。

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::OrderFlowError;

// ---------------------------------------------------------------------------
// OrderStatus — 订单状态机
// ---------------------------------------------------------------------------

/// 订单状态
///
/// 入口服务以 Pending 创建订单；处理引擎在一次处理尝试中恰好迁移一次：
/// Processed / Failed 为终态，PendingApproval 为等待人工审批的非终态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Processed,
    Failed,
    PendingApproval,
}

impl OrderStatus {
    /// 是否已离开初始待处理状态
    ///
    /// 幂等守卫依据：非 Pending 的订单不允许再次处理。
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
            Self::PendingApproval => "PENDING_APPROVAL",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// ProductCategory — 商品品类
// ---------------------------------------------------------------------------

/// 商品品类
///
/// 封闭集合：每个品类对应一套独立的校验/定价规则，
/// 处理引擎按品类标签将订单项分发到对应的规则处理器。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCategory {
    Physical,
    Subscription,
    Digital,
    PreOrder,
    Corporate,
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Physical => "PHYSICAL",
            Self::Subscription => "SUBSCRIPTION",
            Self::Digital => "DIGITAL",
            Self::PreOrder => "PRE_ORDER",
            Self::Corporate => "CORPORATE",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// FailureReason — 业务规则失败原因
// ---------------------------------------------------------------------------

/// 业务规则失败原因
///
/// 处理引擎的结论性判定，与基础设施错误严格分离：这些原因永远不会被
/// 重试，每个原因 1:1 映射到一个 FAILED 结果——唯一例外是
/// PendingManualApproval，它是非终态条件，订单转入人工审批而非失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    // 全局预检
    PaymentFailed,
    FraudAlert,
    // 商品解析
    WarehouseUnavailable,
    // 实体商品
    OutOfStock,
    // 订阅
    DuplicateActiveSubscription,
    SubscriptionLimitExceeded,
    IncompatibleSubscriptions,
    // 数字商品
    AlreadyOwned,
    LicenseUnavailable,
    // 预售
    InvalidReleaseDate,
    ReleaseDatePassed,
    PreOrderSoldOut,
    // 企业采购
    InvalidCorporateData,
    CreditLimitExceeded,
    // 非终态：需要人工审批
    PendingManualApproval,
}

impl FailureReason {
    /// 是否为非终态条件
    ///
    /// 人工审批不是失败，订单转入 PendingApproval 等待处理。
    pub fn is_non_terminal(&self) -> bool {
        matches!(self, Self::PendingManualApproval)
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 与 serde 的 SCREAMING_SNAKE_CASE 序列化保持一致，
        // 便于在日志与结果事件中统一引用
        let s = match self {
            Self::PaymentFailed => "PAYMENT_FAILED",
            Self::FraudAlert => "FRAUD_ALERT",
            Self::WarehouseUnavailable => "WAREHOUSE_UNAVAILABLE",
            Self::OutOfStock => "OUT_OF_STOCK",
            Self::DuplicateActiveSubscription => "DUPLICATE_ACTIVE_SUBSCRIPTION",
            Self::SubscriptionLimitExceeded => "SUBSCRIPTION_LIMIT_EXCEEDED",
            Self::IncompatibleSubscriptions => "INCOMPATIBLE_SUBSCRIPTIONS",
            Self::AlreadyOwned => "ALREADY_OWNED",
            Self::LicenseUnavailable => "LICENSE_UNAVAILABLE",
            Self::InvalidReleaseDate => "INVALID_RELEASE_DATE",
            Self::ReleaseDatePassed => "RELEASE_DATE_PASSED",
            Self::PreOrderSoldOut => "PRE_ORDER_SOLD_OUT",
            Self::InvalidCorporateData => "INVALID_CORPORATE_DATA",
            Self::CreditLimitExceeded => "CREDIT_LIMIT_EXCEEDED",
            Self::PendingManualApproval => "PENDING_MANUAL_APPROVAL",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Order / OrderItem — 订单实体
// ---------------------------------------------------------------------------

/// 订单项
///
/// 价格快照在下单时捕获、不可变；metadata 为品类相关的 JSON 数据
/// （如实体商品的仓库位置、企业采购的税号），由对应处理器宽松解析。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub item_id: String,
    pub product_id: String,
    pub category: ProductCategory,
    pub quantity: u32,
    pub price_snapshot: Decimal,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl OrderItem {
    /// 构建订单项，自动生成 item_id
    pub fn new(
        product_id: impl Into<String>,
        category: ProductCategory,
        quantity: u32,
        price_snapshot: Decimal,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            item_id: Uuid::new_v4().to_string(),
            product_id: product_id.into(),
            category,
            quantity,
            price_snapshot,
            metadata,
        }
    }
}

/// 订单实体
///
/// order_id 由外部分配且全局唯一；total_amount 在首次计算前为 None，
/// 处理引擎在成功处理时写入折扣后的最终应收金额。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: String,
    pub customer_id: String,
    pub status: OrderStatus,
    pub total_amount: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// 以 Pending 状态创建新订单
    pub fn create(customer_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            order_id: Uuid::new_v4().to_string(),
            customer_id: customer_id.into(),
            status: OrderStatus::Pending,
            total_amount: None,
            created_at: now,
            updated_at: now,
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, item: OrderItem) {
        self.items.push(item);
    }

    /// 迁移订单状态并刷新更新时间
    pub fn update_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// ProductRecord — 商品目录记录
// ---------------------------------------------------------------------------

/// 商品目录记录（对处理引擎只读）
///
/// 可选字段按品类填充：实体商品有 stock，预售商品有 release_date 与
/// pre_order_slots，数字商品有 licenses。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub product_id: String,
    pub name: String,
    pub category: ProductCategory,
    pub price: Decimal,
    pub stock: Option<u32>,
    pub active: bool,
    pub release_date: Option<NaiveDate>,
    pub pre_order_slots: Option<u32>,
    pub licenses: Option<u32>,
}

// ---------------------------------------------------------------------------
// 协作方 trait
// ---------------------------------------------------------------------------

/// 订单存储抽象
///
/// 处理引擎只需要按 id 点查、保存、以及按客户维度列举三个操作。
/// 实现方负责持久化细节；瞬时故障以 `OrderFlowError::Store` 返回，
/// 由调用方按重试策略处理。
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// 按订单 id 查找
    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, OrderFlowError>;

    /// 保存订单（覆盖写）
    async fn save(&self, order: &Order) -> Result<(), OrderFlowError>;

    /// 按客户 id 列举订单，创建时间降序
    async fn find_by_customer(&self, customer_id: &str) -> Result<Vec<Order>, OrderFlowError>;
}

/// 商品目录抽象
///
/// 启动时注入的只读查找表，无进程级可变状态，因此接口保持同步。
pub trait ProductCatalog: Send + Sync {
    /// 按商品 id 查找商品记录
    fn find_by_id(&self, product_id: &str) -> Option<ProductRecord>;
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
