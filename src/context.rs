//! 应用上下文
//!
//! 显式构造并注入各个服务，替代全局单例。测试中可以随时重建或重置。

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::api::ApiClient;
use crate::cache::RequestCache;
use crate::clock::Clock;
use crate::config::ClientConfig;
use crate::navigation::{NavigationController, Resolved};
use crate::request::HttpClient;
use crate::session::SessionStore;
use crate::storage::StorageAdapter;
use coursehub_shared::Viewer;

pub struct AppContext<C: HttpClient> {
    pub config: Rc<ClientConfig>,
    pub clock: Rc<dyn Clock>,
    pub http: Rc<C>,
    /// 跨会话存储（令牌、用户资料）
    pub durable: Rc<dyn StorageAdapter>,
    /// 标签页会话存储（导航分区、缓存镜像、完成标记）
    pub scratch: Rc<dyn StorageAdapter>,
    pub session: Rc<SessionStore>,
    pub api: ApiClient<C>,
    pub cache: RequestCache,
    pub navigation: NavigationController,
    /// 正在提交完成状态的课时
    pub(crate) completing: RefCell<HashSet<String>>,
}

impl<C: HttpClient> AppContext<C> {
    pub fn new(
        config: ClientConfig,
        http: Rc<C>,
        durable: Rc<dyn StorageAdapter>,
        scratch: Rc<dyn StorageAdapter>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        let config = Rc::new(config);
        let session = Rc::new(SessionStore::restore(durable.clone(), scratch.clone()));
        let api = ApiClient::new(http.clone(), session.clone(), config.clone());
        let cache = RequestCache::new(clock.clone(), config.cache_ttl)
            .with_mirror(scratch.clone(), config.mirrored_prefixes.clone());
        let navigation = NavigationController::new(scratch.clone());

        Self {
            config,
            clock,
            http,
            durable,
            scratch,
            session,
            api,
            cache,
            navigation,
            completing: RefCell::new(HashSet::new()),
        }
    }

    pub fn viewer(&self) -> Viewer {
        self.session.viewer()
    }

    /// 以当前登录身份导航
    pub fn navigate(&self, path: &str) -> Resolved {
        self.navigation.navigate(path, self.viewer())
    }

    /// 丢弃所有缓存与在途标记，登录态保留
    pub fn reset(&self) {
        self.cache.clear_all();
        self.completing.borrow_mut().clear();
    }
}
