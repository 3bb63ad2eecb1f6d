//! 全局预检
//!
//! 在任何订单项被评估之前执行的订单级检查：支付授权与欺诈嫌疑。
//! 两者都是真实网关的确定性替身——对订单 id 做稳定哈希取模，
//! 同一订单无论重放多少次都得到相同判定，保证测试可复现。

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use orderflow_shared::domain::FailureReason;

use crate::hash::stable_hash;

/// 高价值订单阈值，超过仅记录日志，不改变行为
pub const HIGH_VALUE_THRESHOLD: Decimal = dec!(10000);
/// 欺诈检查阈值，总价不超过该值的订单从不触发欺诈判定
pub const FRAUD_CHECK_THRESHOLD: Decimal = dec!(20000);

/// 执行全局预检
///
/// 检查顺序与失败语义：
/// 1. 总价非正，或订单 id 哈希模 31 为 0 -> PAYMENT_FAILED
/// 2. 总价超过欺诈阈值且订单 id 哈希模 20 为 0 -> FRAUD_ALERT
pub fn run_global_checks(order_id: &str, total_amount: Decimal) -> Result<(), FailureReason> {
    if total_amount > HIGH_VALUE_THRESHOLD {
        info!(order_id, %total_amount, "高价值订单，执行附加校验");
    }

    ensure_payment_authorized(order_id, total_amount)?;

    if is_fraud_suspected(order_id, total_amount) {
        return Err(FailureReason::FraudAlert);
    }

    Ok(())
}

/// 支付授权的确定性替身
fn ensure_payment_authorized(order_id: &str, total_amount: Decimal) -> Result<(), FailureReason> {
    if total_amount <= Decimal::ZERO {
        return Err(FailureReason::PaymentFailed);
    }
    if stable_hash(order_id) % 31 == 0 {
        return Err(FailureReason::PaymentFailed);
    }
    debug!(order_id, "支付授权通过");
    Ok(())
}

/// 欺诈嫌疑的确定性替身
fn is_fraud_suspected(order_id: &str, total_amount: Decimal) -> bool {
    if total_amount <= FRAUD_CHECK_THRESHOLD {
        return false;
    }
    stable_hash(order_id) % 20 == 0
}
