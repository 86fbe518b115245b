//! 通知铃铛：列表、未读数、标记已读

use log::warn;

use crate::cache::keys;
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::request::HttpClient;
use coursehub_shared::Notification;
use coursehub_shared::protocol::{ListNotificationsRequest, MarkNotificationReadRequest};

/// 界面持有的通知列表，已读标记先在本地更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFeed {
    pub items: Vec<Notification>,
}

impl NotificationFeed {
    pub fn new(items: Vec<Notification>) -> Self {
        Self { items }
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    fn set_read(&mut self, id: &str, read: bool) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(item) if item.read != read => {
                item.read = read;
                true
            }
            _ => false,
        }
    }
}

impl<C: HttpClient + 'static> AppContext<C> {
    /// 未登录时返回空列表，不发请求
    pub async fn notifications(&self) -> ApiResult<NotificationFeed> {
        let Some(user) = self.session.user() else {
            return Ok(NotificationFeed::default());
        };
        let api = self.api.clone();
        self.cache
            .get_as(&keys::notifications(&user.id), move || async move {
                api.send(&ListNotificationsRequest).await.map(|r| r.notifications)
            })
            .await
            .map(NotificationFeed::new)
            .map_err(|e| e.in_op("notifications.list"))
    }

    /// 定时轮询：跳过缓存重新拉取
    pub async fn poll_notifications(&self) -> ApiResult<NotificationFeed> {
        if let Some(user) = self.session.user() {
            self.cache.clear(&keys::notifications(&user.id));
        }
        self.notifications().await
    }

    /// 先在本地标记已读，请求失败时恢复
    pub async fn mark_notification_read(&self, feed: &mut NotificationFeed, id: &str) -> ApiResult<()> {
        if !feed.set_read(id, true) {
            return Ok(());
        }

        let result = self
            .api
            .send(&MarkNotificationReadRequest { id: id.to_string() })
            .await;
        match result {
            Ok(_) => {
                if let Some(user) = self.session.user() {
                    self.cache.clear(&keys::notifications(&user.id));
                }
                Ok(())
            }
            Err(e) => {
                warn!("mark notification {} read failed: {}", id, e);
                feed.set_read(id, false);
                Err(e.in_op_with("notifications.mark_read", id.to_string()))
            }
        }
    }
}
