//! 内存存储
//!
//! 使用 DashMap 实现的高并发内存键值存储，适用于测试和开发环境。

use std::sync::Arc;

use dashmap::DashMap;

/// 通用内存存储
///
/// 基于 DashMap 实现，支持高并发读写。Clone 共享底层数据，
/// 便于在消费任务与测试断言之间共用同一份存储。
#[derive(Debug)]
pub struct MemoryStore<T> {
    data: Arc<DashMap<String, T>>,
}

impl<T: Clone> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
        }
    }

    /// 插入或更新数据，key 已存在时覆盖
    pub fn insert(&self, id: &str, value: T) {
        self.data.insert(id.to_string(), value);
    }

    /// 获取数据的克隆，不持有锁
    pub fn get(&self, id: &str) -> Option<T> {
        self.data.get(id).map(|v| v.clone())
    }

    /// 按条件筛选数据
    pub fn list_by<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.data
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.data.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    pub fn clear(&self) {
        self.data.clear();
    }
}

impl<T: Clone> Clone for MemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get_overwrite() {
        let store: MemoryStore<i32> = MemoryStore::new();

        store.insert("a", 1);
        assert_eq!(store.get("a"), Some(1));

        store.insert("a", 2);
        assert_eq!(store.get("a"), Some(2));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_list_by() {
        let store: MemoryStore<i32> = MemoryStore::new();
        store.insert("a", 10);
        store.insert("b", 20);
        store.insert("c", 30);

        let filtered = store.list_by(|v| *v > 15);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_clone_shares_data() {
        let store: MemoryStore<i32> = MemoryStore::new();
        let shared = store.clone();

        store.insert("a", 1);
        assert!(shared.contains("a"));

        shared.clear();
        assert_eq!(store.count(), 0);
    }
}
