//! 请求缓存与并发去重
//!
//! 每个 key 同一时间最多只有一个在途请求：
//! 1. 条目新鲜（`now - stored_at < ttl`）直接返回，不调用 fetch
//! 2. 已有在途请求时，所有调用方共享同一个结果
//! 3. 否则发起 fetch；成功写入缓存，失败直接返回且不缓存
//!
//! 匹配镜像前缀的条目同时写入会话存储，内存未命中时从会话存储恢复。

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{ApiError, ApiResult};
use crate::storage::{StorageAdapter, delete_prefixed};
use coursehub_shared::Timestamp;


/// 会话存储中镜像条目的 key 前缀
pub const MIRROR_KEY_PREFIX: &str = "cache:";

type SharedFetch = Shared<LocalBoxFuture<'static, ApiResult<Value>>>;

// =========================================================
// 缓存条目
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: Value,
    pub stored_at: Timestamp,
    pub ttl_ms: u64,
}

impl CacheEntry {
    /// 按写入时记录的 TTL 判断
    pub fn is_fresh(&self, now: Timestamp) -> bool {
        self.is_fresh_within(now, Duration::from_millis(self.ttl_ms))
    }

    /// 按调用方给出的 TTL 判断
    pub fn is_fresh_within(&self, now: Timestamp, ttl: Duration) -> bool {
        now - self.stored_at < ttl
    }
}

struct Pending {
    ticket: u64,
    future: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    pending: HashMap<String, Pending>,
    next_ticket: u64,
}

#[derive(Clone)]
struct Mirror {
    storage: Rc<dyn StorageAdapter>,
    prefixes: Vec<String>,
}

impl Mirror {
    fn covers(&self, key: &str) -> bool {
        self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    fn storage_key(key: &str) -> String {
        format!("{}{}", MIRROR_KEY_PREFIX, key)
    }

    fn load(&self, key: &str, now: Timestamp, ttl: Duration) -> Option<CacheEntry> {
        if !self.covers(key) {
            return None;
        }
        let storage_key = Self::storage_key(key);
        let raw = self.storage.get(&storage_key)?;
        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if entry.stored_at <= now && entry.is_fresh_within(now, ttl) => Some(entry),
            // 过期、写入时间晚于当前时间或损坏的镜像直接丢弃
            _ => {
                self.storage.delete(&storage_key);
                None
            }
        }
    }

    fn store(&self, key: &str, entry: &CacheEntry) {
        if !self.covers(key) {
            return;
        }
        match serde_json::to_string(entry) {
            Ok(raw) => self.storage.set(&Self::storage_key(key), &raw),
            Err(e) => warn!("cache mirror write failed for {}: {}", key, e),
        }
    }

    fn remove(&self, key: &str) {
        self.storage.delete(&Self::storage_key(key));
    }
}

// =========================================================
// RequestCache
// =========================================================

/// 请求缓存
///
/// 单线程共享：克隆得到的是同一份状态。
#[derive(Clone)]
pub struct RequestCache {
    state: Rc<RefCell<CacheState>>,
    clock: Rc<dyn Clock>,
    default_ttl: Duration,
    mirror: Option<Mirror>,
}

impl RequestCache {
    pub fn new(clock: Rc<dyn Clock>, default_ttl: Duration) -> Self {
        Self {
            state: Rc::new(RefCell::new(CacheState::default())),
            clock,
            default_ttl,
            mirror: None,
        }
    }

    /// 将匹配前缀的条目镜像到会话存储
    pub fn with_mirror(mut self, storage: Rc<dyn StorageAdapter>, prefixes: Vec<String>) -> Self {
        self.mirror = Some(Mirror { storage, prefixes });
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn get<F, Fut>(&self, key: &str, fetch: F) -> ApiResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Value>> + 'static,
    {
        self.get_with_ttl(key, self.default_ttl, fetch).await
    }

    /// 新鲜度按本次调用的 `ttl` 判断，而不是条目写入时的 TTL
    pub async fn get_with_ttl<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> ApiResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Value>> + 'static,
    {
        let now = self.clock.now();

        // 1. 内存命中 / 镜像恢复 / 合并到在途请求
        let existing = {
            let mut state = self.state.borrow_mut();

            if let Some(entry) = state.entries.get(key) {
                if entry.is_fresh_within(now, ttl) {
                    debug!("cache hit: {}", key);
                    return Ok(entry.value.clone());
                }
            }

            if let Some(entry) = self.mirror.as_ref().and_then(|m| m.load(key, now, ttl)) {
                debug!("cache rehydrated from session storage: {}", key);
                let value = entry.value.clone();
                state.entries.insert(key.to_string(), entry);
                return Ok(value);
            }

            state.pending.get(key).map(|p| p.future.clone())
        };

        if let Some(future) = existing {
            debug!("cache coalesced: {}", key);
            return future.await;
        }

        // 2. 发起新请求（先释放借用，fetch 构造过程中可能访问缓存）
        debug!("cache miss: {}", key);
        let fut = fetch();
        let future = {
            let mut state = self.state.borrow_mut();
            let ticket = state.next_ticket;
            state.next_ticket += 1;

            let future = settle_after(
                fut,
                Rc::downgrade(&self.state),
                self.clock.clone(),
                self.mirror.clone(),
                key.to_string(),
                ticket,
                ttl,
            )
            .boxed_local()
            .shared();

            state.pending.insert(
                key.to_string(),
                Pending {
                    ticket,
                    future: future.clone(),
                },
            );
            future
        };

        future.await
    }

    /// 带类型的 `get`，值以 JSON 形式缓存
    pub async fn get_as<T, F, Fut>(&self, key: &str, fetch: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>> + 'static,
    {
        self.get_as_with_ttl(key, self.default_ttl, fetch).await
    }

    pub async fn get_as_with_ttl<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>> + 'static,
    {
        let value = self
            .get_with_ttl(key, ttl, || {
                let fut = fetch();
                async move {
                    let typed = fut.await?;
                    serde_json::to_value(typed).map_err(ApiError::from)
                }
            })
            .await?;
        serde_json::from_value(value)
            .map_err(|e| ApiError::from(e).in_op_with("cache.get_as", key.to_string()))
    }

    /// 当前新鲜的缓存值（不触发请求）
    pub fn peek(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        self.state
            .borrow()
            .entries
            .get(key)
            .filter(|e| e.is_fresh(now))
            .map(|e| e.value.clone())
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.state.borrow().pending.contains_key(key)
    }

    /// 移除条目和在途标记；在途请求完成后不会再写入
    pub fn clear(&self, key: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.entries.remove(key);
            state.pending.remove(key);
        }
        if let Some(mirror) = &self.mirror {
            mirror.remove(key);
        }
        debug!("cache cleared: {}", key);
    }

    /// 按前缀批量失效
    pub fn clear_prefix(&self, prefix: &str) {
        {
            let mut state = self.state.borrow_mut();
            state.entries.retain(|k, _| !k.starts_with(prefix));
            state.pending.retain(|k, _| !k.starts_with(prefix));
        }
        if let Some(mirror) = &self.mirror {
            delete_prefixed(mirror.storage.as_ref(), &Mirror::storage_key(prefix));
        }
        debug!("cache cleared prefix: {}", prefix);
    }

    pub fn clear_all(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.entries.clear();
            state.pending.clear();
        }
        if let Some(mirror) = &self.mirror {
            delete_prefixed(mirror.storage.as_ref(), MIRROR_KEY_PREFIX);
        }
        debug!("cache cleared all");
    }
}

/// 等待 fetch 完成后结算
///
/// 只持有状态的弱引用，在途 future 存放在状态内部，不能形成 Rc 环。
/// 只有 ticket 仍然匹配时才写入，被 clear 或新请求取代的结果只返回给等待者。
async fn settle_after<Fut>(
    fut: Fut,
    state: Weak<RefCell<CacheState>>,
    clock: Rc<dyn Clock>,
    mirror: Option<Mirror>,
    key: String,
    ticket: u64,
    ttl: Duration,
) -> ApiResult<Value>
where
    Fut: Future<Output = ApiResult<Value>>,
{
    let result = fut.await;

    let Some(shared) = state.upgrade() else {
        return result;
    };
    let mut state = shared.borrow_mut();
    let current = state.pending.get(&key).map(|p| p.ticket) == Some(ticket);
    if !current {
        debug!("cache discarded stale result: {}", key);
        return result;
    }
    state.pending.remove(&key);

    match &result {
        Ok(value) => {
            let entry = CacheEntry {
                value: value.clone(),
                stored_at: clock.now(),
                ttl_ms: ttl.as_millis() as u64,
            };
            if let Some(mirror) = &mirror {
                mirror.store(&key, &entry);
            }
            state.entries.insert(key, entry);
        }
        Err(e) => warn!("cache fetch failed for {}: {}", key, e),
    }
    result
}

// =========================================================
// 缓存 Key
// =========================================================

/// 所有缓存 key 的唯一构造处
pub mod keys {
    pub const COURSES_ALL: &str = "courses_all";
    pub const ADMIN_OVERVIEW: &str = "admin_overview";

    pub fn course(id: &str) -> String {
        format!("course_{}", id)
    }

    pub fn lessons(course_id: &str) -> String {
        format!("lessons_{}", course_id)
    }

    pub fn lesson_progress(course_id: &str, user_id: &str) -> String {
        format!("lesson_progress_{}_{}", course_id, user_id)
    }

    pub fn enrollment(course_id: &str, user_id: &str) -> String {
        format!("enrollment_{}_{}", course_id, user_id)
    }

    pub fn my_courses(user_id: &str) -> String {
        format!("my_courses_{}", user_id)
    }

    pub fn instructor_courses(instructor_id: &str) -> String {
        format!("instructor_courses_{}", instructor_id)
    }

    pub fn progress_stats(user_id: &str) -> String {
        format!("progress_stats_{}", user_id)
    }

    pub fn quiz(course_id: &str) -> String {
        format!("quiz_{}", course_id)
    }

    /// 测验解锁检查，TTL 单独设置
    pub fn quiz_gate(course_id: &str, user_id: &str) -> String {
        format!("quiz_gate_{}_{}", course_id, user_id)
    }

    pub fn notifications(user_id: &str) -> String {
        format!("notifications_{}", user_id)
    }
}
