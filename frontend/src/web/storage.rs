//! Web Storage 封装模块
//!
//! 使用 `web_sys::Storage` 实现核心库的 `StorageAdapter`，替代 `gloo-storage`。
//! localStorage 保存登录态，sessionStorage 保存导航分区与缓存镜像。

use coursehub::StorageAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Local,
    Session,
}

/// 浏览器存储
///
/// 写入失败（隐私模式、配额已满）只记录日志，与内存中的状态无关。
#[derive(Debug, Clone, Copy)]
pub struct WebStorage {
    kind: StorageKind,
}

impl WebStorage {
    pub fn local() -> Self {
        Self { kind: StorageKind::Local }
    }

    pub fn session() -> Self {
        Self { kind: StorageKind::Session }
    }

    fn storage(&self) -> Option<web_sys::Storage> {
        let window = web_sys::window()?;
        match self.kind {
            StorageKind::Local => window.local_storage().ok()?,
            StorageKind::Session => window.session_storage().ok()?,
        }
    }
}

impl StorageAdapter for WebStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) {
        let written = self
            .storage()
            .and_then(|s| s.set_item(key, value).ok())
            .is_some();
        if !written {
            log::warn!("[Storage] {:?} write failed: {}", self.kind, key);
        }
    }

    fn delete(&self, key: &str) {
        if let Some(s) = self.storage() {
            let _ = s.remove_item(key);
        }
    }

    fn keys(&self) -> Vec<String> {
        let Some(s) = self.storage() else {
            return Vec::new();
        };
        let len = s.length().unwrap_or(0);
        (0..len).filter_map(|i| s.key(i).ok().flatten()).collect()
    }
}
