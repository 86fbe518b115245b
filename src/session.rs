//! 登录态管理
//!
//! 管理令牌与用户资料，与路由系统解耦。
//! 界面层通过订阅 `SessionEvent` 响应登录、注销与过期。

use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{ApiError, ApiResult};
use crate::navigation::ACTIVE_SECTION_KEY;
use crate::storage::StorageAdapter;
use coursehub_shared::{Session, User, Viewer};

#[cfg(test)]
mod tests;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// 登录态变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    /// 后端返回 401，令牌失效
    Expired,
}

type Listener = Rc<dyn Fn(SessionEvent)>;

pub struct SessionStore {
    durable: Rc<dyn StorageAdapter>,
    scratch: Rc<dyn StorageAdapter>,
    current: RefCell<Option<Session>>,
    listeners: RefCell<Vec<Listener>>,
}

impl SessionStore {
    /// 从持久存储恢复登录态
    ///
    /// 令牌与用户资料必须同时存在且能解析，否则两者一并清除。
    pub fn restore(durable: Rc<dyn StorageAdapter>, scratch: Rc<dyn StorageAdapter>) -> Self {
        let current = match (durable.get(TOKEN_KEY), durable.get(USER_KEY)) {
            (Some(token), Some(raw_user)) if !token.is_empty() => {
                match serde_json::from_str::<User>(&raw_user) {
                    Ok(user) => Some(Session { token, user }),
                    Err(e) => {
                        warn!("stored user is unreadable, clearing session: {}", e);
                        None
                    }
                }
            }
            (None, None) => None,
            _ => {
                warn!("partial session in storage, clearing it");
                None
            }
        };

        if current.is_none() {
            durable.delete(TOKEN_KEY);
            durable.delete(USER_KEY);
        }

        Self {
            durable,
            scratch,
            current: RefCell::new(current),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.token.clone())
    }

    pub fn user(&self) -> Option<User> {
        self.current.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn viewer(&self) -> Viewer {
        Viewer::from_session(self.current.borrow().as_ref())
    }

    /// 当前用户，未登录时返回 Unauthorized
    pub fn require_user(&self) -> ApiResult<User> {
        self.user()
            .ok_or_else(|| ApiError::unauthorized("Please log in to continue"))
    }

    /// 登录/注册成功后写入
    pub fn establish(&self, session: Session) -> ApiResult<()> {
        let raw_user = serde_json::to_string(&session.user)?;
        self.durable.set(TOKEN_KEY, &session.token);
        self.durable.set(USER_KEY, &raw_user);
        info!("signed in as {} ({})", session.user.email, session.user.role.as_str());
        *self.current.borrow_mut() = Some(session);
        self.emit(SessionEvent::SignedIn);
        Ok(())
    }

    /// 刷新资料后改写用户信息，令牌不变
    pub fn update_user(&self, user: User) -> ApiResult<()> {
        let raw_user = serde_json::to_string(&user)?;
        let mut current = self.current.borrow_mut();
        match current.as_mut() {
            Some(session) => {
                self.durable.set(USER_KEY, &raw_user);
                session.user = user;
                Ok(())
            }
            None => Err(ApiError::unauthorized("No active session").in_op("session.update_user")),
        }
    }

    /// 注销：只清除令牌、用户资料与当前分区，不调用后端
    pub fn logout(&self) {
        self.clear();
        info!("signed out");
        self.emit(SessionEvent::SignedOut);
    }

    /// 令牌过期（401）：与注销效果相同
    pub fn expire(&self) {
        if self.current.borrow().is_none() {
            return;
        }
        self.clear();
        warn!("session expired");
        self.emit(SessionEvent::Expired);
    }

    pub fn subscribe(&self, listener: impl Fn(SessionEvent) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    fn clear(&self) {
        self.durable.delete(TOKEN_KEY);
        self.durable.delete(USER_KEY);
        self.scratch.delete(ACTIVE_SECTION_KEY);
        *self.current.borrow_mut() = None;
    }

    fn emit(&self, event: SessionEvent) {
        // 先复制，监听器内部可能再次访问 SessionStore
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }
}
