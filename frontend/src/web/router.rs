//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，实现高内聚：
//! 所有对 window.history 的操作都集中在此模块。
//! 路由解析与守卫由核心库的 `NavigationController` 完成，这里只负责
//! "监听 -> 交给核心判定 -> 写 History -> 更新信号"。

use coursehub::SessionEvent;
use coursehub::navigation::{AppRoute, Resolved, Section};
use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use crate::auth::AuthContext;

/// 获取当前浏览器路径（含查询串）
fn current_path() -> String {
    web_sys::window()
        .map(|w| {
            let location = w.location();
            let path = location.pathname().unwrap_or_else(|_| "/".to_string());
            let search = location.search().unwrap_or_default();
            format!("{}{}", path, search)
        })
        .unwrap_or_else(|| "/".to_string())
}

/// 推送 History 状态（内部工具函数）
fn push_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 替换 History 状态（内部工具函数，用于重定向）
fn replace_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 路由器服务
///
/// 封装所有路由操作，通过 Signal 驱动界面更新。
#[derive(Clone, Copy)]
pub struct RouterService {
    current: ReadSignal<Resolved>,
    set_current: WriteSignal<Resolved>,
    /// 地址栏中的完整路径，页面从中读取查询参数
    location: ReadSignal<String>,
    set_location: WriteSignal<String>,
    auth: AuthContext,
}

impl RouterService {
    fn new(auth: AuthContext) -> Self {
        let path = current_path();
        let resolved = auth.app().navigate(&path);
        let shown = if resolved.was_redirected() {
            let target = resolved.route.to_path();
            replace_history_state(&target);
            target
        } else {
            path
        };

        let (current, set_current) = signal(resolved);
        let (location, set_location) = signal(shown);
        Self {
            current,
            set_current,
            location,
            set_location,
            auth,
        }
    }

    /// 只有路由本身变化时才通知
    pub fn current_route(&self) -> Memo<AppRoute> {
        let current = self.current;
        Memo::new(move |_| current.get().route)
    }

    pub fn section(&self) -> Signal<Section> {
        let current = self.current;
        Signal::derive(move || current.get().section)
    }

    pub fn location(&self) -> ReadSignal<String> {
        self.location
    }

    /// **核心方法：导航与守卫**
    pub fn navigate(&self, path: &str) {
        self.go(path, true);
    }

    /// 替换当前地址，不产生新的历史记录
    pub fn replace(&self, path: &str) {
        self.go(path, false);
    }

    fn go(&self, path: &str, use_push: bool) {
        let resolved = self.auth.app().navigate(path);
        let shown = if resolved.was_redirected() {
            resolved.route.to_path()
        } else {
            path.to_string()
        };

        if use_push {
            push_history_state(&shown);
        } else {
            replace_history_state(&shown);
        }
        self.set_location.set(shown);
        self.set_current.set(resolved);
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let router = *self;
        let closure = Closure::<dyn Fn()>::new(move || {
            // popstate 时也执行守卫逻辑
            router.go(&current_path(), false);
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }

    /// 登录态变化时重新评估当前地址；令牌过期时跳转登录页
    fn setup_auth_redirect(&self) {
        let router = *self;
        let last_event = self.auth.last_event;

        Effect::new(move |_| match last_event.get() {
            Some(SessionEvent::Expired) => {
                log::warn!("[Router] Session expired, redirecting to login.");
                router.go(&AppRoute::auth_failure_redirect().to_path(), true);
            }
            Some(_) => {
                let path = router.location.get_untracked();
                router.go(&path, false);
            }
            None => {}
        });
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router(auth: AuthContext) -> RouterService {
    let router = RouterService::new(auth);

    router.init_popstate_listener();
    router.setup_auth_redirect();

    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
///
/// 提供路由上下文，应在 App 根部使用。
#[component]
pub fn Router(
    /// 认证上下文
    auth: AuthContext,
    /// 子组件
    children: Children,
) -> impl IntoView {
    provide_router(auth);

    children()
}

/// 路由出口组件
///
/// 根据当前路由状态渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let route = use_router().current_route();

    move || matcher(route.get())
}

#[component]
pub fn Link(
    /// 目标路径
    #[prop(into)]
    to: String,
    #[prop(optional, into)] class: String,
    /// 子内容
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let target = to.clone();
    let on_click = move |ev: web_sys::MouseEvent| {
        ev.prevent_default();
        router.navigate(&target);
    };

    view! {
        <a href=to class=class on:click=on_click>
            {children()}
        </a>
    }
}
