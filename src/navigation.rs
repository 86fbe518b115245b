//! 按角色控制的导航
//!
//! - `route`: 路由表与守卫规则
//! - `section`: 路径到导航分区的映射、各角色可见的入口
//! - `NavigationController`: 执行守卫并记录当前分区

use log::{debug, info};
use std::rc::Rc;

use crate::storage::StorageAdapter;
use coursehub_shared::Viewer;

pub mod route;
pub mod section;

#[cfg(test)]
mod tests;

pub use route::{Access, AppRoute, GuardDecision, guard};
pub use section::{NavAction, Section, section_for, visible_actions};

/// 会话存储中记录当前分区的 key
pub const ACTIVE_SECTION_KEY: &str = "active_section";

/// 一次导航的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// 最终渲染的路由
    pub route: AppRoute,
    pub section: Section,
    /// 被守卫重定向时，原本请求的路由
    pub redirected_from: Option<AppRoute>,
}

impl Resolved {
    pub fn was_redirected(&self) -> bool {
        self.redirected_from.is_some()
    }
}

pub struct NavigationController {
    scratch: Rc<dyn StorageAdapter>,
}

impl NavigationController {
    pub fn new(scratch: Rc<dyn StorageAdapter>) -> Self {
        Self { scratch }
    }

    /// **核心方法：导航与守卫**
    ///
    /// 流程：解析 -> 守卫 -> (重定向) -> 计算分区并记录
    pub fn navigate(&self, path: &str, viewer: Viewer) -> Resolved {
        let requested = AppRoute::from_path(path);

        let (route, redirected_from) = match guard(&requested, viewer) {
            GuardDecision::Allow => (requested, None),
            GuardDecision::Redirect(target) => {
                info!("[Router] {:?} denied for {}, redirecting to {}", viewer, requested, target);
                (target, Some(requested))
            }
        };

        // 分区取自请求的原始路径，重定向后取目标路径
        let section = match &redirected_from {
            None => self.resolve(path),
            Some(_) => self.resolve(&route.to_path()),
        };

        Resolved {
            route,
            section,
            redirected_from,
        }
    }

    /// 计算路径对应的分区并写入会话存储
    pub fn resolve(&self, path: &str) -> Section {
        let section = section_for(path);
        self.scratch.set(ACTIVE_SECTION_KEY, section.as_str());
        debug!("active section: {} ({})", section, path);
        section
    }

    /// 上一次记录的分区
    ///
    /// 仅用于首次解析之前的显示，不会覆盖 `section_for` 的结果。
    pub fn last_section(&self) -> Option<Section> {
        self.scratch.get(ACTIVE_SECTION_KEY)?.parse().ok()
    }

    pub fn forget(&self) {
        self.scratch.delete(ACTIVE_SECTION_KEY);
    }
}
