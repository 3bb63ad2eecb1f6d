//! 确定性字符串哈希
//!
//! 支付授权与欺诈嫌疑的模拟判定需要对同一输入产生跨平台、跨版本
//! 完全一致的结果，因此不使用标准库的 Hasher（其输出不保证稳定），
//! 而是显式定义 31 进制多项式哈希：
//!
//! ```text
//! h(s) = s[0]*31^(n-1) + s[1]*31^(n-2) + ... + s[n-1]
//! ```
//!
//! 累加在 32 位有符号整数上回绕进行，输入按 UTF-16 码元遍历，
//! 最终取绝对值。该定义与既有上游系统对同一订单 id 的判定位级一致。

/// 计算字符串的确定性哈希值
pub fn stable_hash(s: &str) -> u32 {
    let mut h: i32 = 0;
    for unit in s.encode_utf16() {
        h = h.wrapping_mul(31).wrapping_add(unit as i32);
    }
    h.unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        assert_eq!(stable_hash(""), 0);
        assert_eq!(stable_hash("a"), 97);
        // 97 * 31 + 98
        assert_eq!(stable_hash("ab"), 3105);
        assert_eq!(stable_hash("ord-0001"), 1_180_574_573);
    }

    #[test]
    fn test_deterministic() {
        let a = stable_hash("ord-12345");
        let b = stable_hash("ord-12345");
        assert_eq!(a, b);
        assert_ne!(stable_hash("ord-12345"), stable_hash("ord-12346"));
    }

    #[test]
    fn test_wrapping_does_not_panic() {
        // 长输入导致 i32 多次回绕，取绝对值后仍为合法 u32
        let long = "x".repeat(10_000);
        let _ = stable_hash(&long);
    }

    #[test]
    fn test_non_ascii_uses_utf16_units() {
        // '中' 的 UTF-16 码元为 0x4E2D
        assert_eq!(stable_hash("中"), 0x4E2D);
    }
}
