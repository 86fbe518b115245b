//! 键值存储适配层
//!
//! 浏览器中分为两类：
//! - durable: 跨会话保留（localStorage），保存登录令牌与用户资料
//! - scratch: 仅当前标签页会话（sessionStorage），保存导航状态、缓存镜像、完成标记
//!
//! Web Storage 是同步 API，这里的 trait 也保持同步。

use std::cell::RefCell;
use std::collections::BTreeMap;

// =========================================================
// 抽象接口
// =========================================================

pub trait StorageAdapter {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn delete(&self, key: &str);
    /// 当前存储中的全部 key
    fn keys(&self) -> Vec<String>;
}

/// 删除所有以 `prefix` 开头的 key，返回删除数量
pub fn delete_prefixed(storage: &dyn StorageAdapter, prefix: &str) -> usize {
    let doomed: Vec<String> = storage
        .keys()
        .into_iter()
        .filter(|k| k.starts_with(prefix))
        .collect();
    for key in &doomed {
        storage.delete(key);
    }
    doomed.len()
}

// =========================================================
// 内存实现 (原生环境与测试)
// =========================================================

#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

impl StorageAdapter for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn delete(&self, key: &str) {
        self.map.borrow_mut().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.map.borrow().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_prefixed() {
        let storage = MemoryStorage::new();
        storage.set("cache:course_1", "{}");
        storage.set("cache:course_2", "{}");
        storage.set("token", "abc");

        assert_eq!(delete_prefixed(&storage, "cache:"), 2);
        assert_eq!(storage.keys(), vec!["token".to_string()]);
    }
}
