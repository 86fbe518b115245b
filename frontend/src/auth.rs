//! 认证模块
//!
//! 持有核心库的 `AppContext`，并把登录态同步为 Leptos 信号。
//! 路由服务通过注入的 `AuthContext` 读取登录态，与页面组件解耦。

use std::rc::Rc;

use coursehub::config::{ENV_API_URL, ENV_STORAGE_BUCKET, ENV_STORAGE_KEY, ENV_STORAGE_URL};
use coursehub_shared::{Session, Viewer};
use coursehub::{AppContext, ClientConfig, EnvAdapter, SessionEvent, SystemClock};
use leptos::prelude::*;

use crate::web::{BrowserHttp, WebStorage};

pub type CourseHub = AppContext<BrowserHttp>;

/// 构建期注入的环境变量
struct BuildEnv;

impl EnvAdapter for BuildEnv {
    fn var(&self, name: &str) -> Option<String> {
        let value = match name {
            ENV_API_URL => option_env!("COURSEHUB_API_URL"),
            ENV_STORAGE_URL => option_env!("COURSEHUB_STORAGE_URL"),
            ENV_STORAGE_KEY => option_env!("COURSEHUB_STORAGE_KEY"),
            ENV_STORAGE_BUCKET => option_env!("COURSEHUB_STORAGE_BUCKET"),
            _ => None,
        };
        value.map(str::to_string)
    }
}

fn load_config() -> ClientConfig {
    ClientConfig::from_env(&BuildEnv).unwrap_or_else(|e| {
        log::error!("invalid build configuration, using defaults: {}", e);
        ClientConfig::default()
    })
}

/// 认证上下文
///
/// 包含读信号，通过 Context 在组件间共享。
#[derive(Clone, Copy)]
pub struct AuthContext {
    app: StoredValue<Rc<CourseHub>, LocalStorage>,
    /// 当前登录态（只读）
    pub session: ReadSignal<Option<Session>>,
    set_session: WriteSignal<Option<Session>>,
    /// 最近一次登录态事件，路由服务据此重定向
    pub last_event: ReadSignal<Option<SessionEvent>>,
}

impl AuthContext {
    /// 创建新的认证上下文，从 localStorage 恢复登录态
    pub fn new() -> Self {
        let app = Rc::new(AppContext::new(
            load_config(),
            Rc::new(BrowserHttp),
            Rc::new(WebStorage::local()),
            Rc::new(WebStorage::session()),
            Rc::new(SystemClock),
        ));

        let (session, set_session) = signal(app.session.current());
        let (last_event, set_last_event) = signal(None::<SessionEvent>);

        let store = app.session.clone();
        app.session.subscribe(move |event| {
            set_session.set(store.current());
            set_last_event.set(Some(event));
        });

        Self {
            app: StoredValue::new_local(app),
            session,
            set_session,
            last_event,
        }
    }

    pub fn app(&self) -> Rc<CourseHub> {
        self.app.get_value()
    }

    pub fn viewer_signal(&self) -> Signal<Viewer> {
        let session = self.session;
        Signal::derive(move || Viewer::from_session(session.get().as_ref()))
    }

    /// 资料刷新不产生登录态事件，需要手动同步
    pub fn sync(&self) {
        self.set_session.set(self.app().session.current());
    }

    pub fn logout(&self) {
        self.app().logout();
    }
}

/// 从 Context 获取认证上下文
pub fn use_auth() -> AuthContext {
    use_context::<AuthContext>().expect("AuthContext should be provided")
}

/// 启动时刷新用户资料
pub fn init_auth(ctx: &AuthContext) {
    if ctx.session.get_untracked().is_none() {
        return;
    }
    let ctx = *ctx;
    leptos::task::spawn_local(async move {
        match ctx.app().refresh_profile().await {
            Ok(_) => ctx.sync(),
            Err(e) => log::warn!("profile refresh failed: {}", e),
        }
    });
}
