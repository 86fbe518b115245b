//! 管理后台

use serde::{Deserialize, Serialize};

use crate::cache::keys;
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::request::HttpClient;
use coursehub_shared::protocol::{AdminCoursesRequest, AdminDashboardRequest, AdminUsersRequest};
use coursehub_shared::{AdminStats, AdminUser, Course, Role};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdminOverview {
    pub stats: AdminStats,
    pub users: Vec<AdminUser>,
    pub courses: Vec<Course>,
}

impl AdminOverview {
    pub fn users_with_role(&self, role: Role) -> usize {
        self.users.iter().filter(|u| u.role == Some(role)).count()
    }
}

impl<C: HttpClient + 'static> AppContext<C> {
    /// 统计、用户与课程三个请求并发发出，任一失败则整体失败
    pub async fn admin_overview(&self) -> ApiResult<AdminOverview> {
        let api = self.api.clone();
        self.cache
            .get_as(keys::ADMIN_OVERVIEW, move || async move {
                let (stats, users, courses) = futures::join!(
                    api.send(&AdminDashboardRequest),
                    api.send(&AdminUsersRequest),
                    api.send(&AdminCoursesRequest)
                );
                Ok(AdminOverview {
                    stats: stats?.stats,
                    users: users?.users,
                    courses: courses?.courses,
                })
            })
            .await
            .map_err(|e| e.in_op("admin.overview"))
    }

    pub async fn admin_courses(&self) -> ApiResult<Vec<Course>> {
        self.api
            .send(&AdminCoursesRequest)
            .await
            .map(|r| r.courses)
            .map_err(|e| e.in_op("admin.courses"))
    }

    /// 删除成功后返回去掉该课程的列表
    pub async fn admin_delete_course(&self, courses: &[Course], id: &str) -> ApiResult<Vec<Course>> {
        self.delete_course(id)
            .await
            .map_err(|e| e.in_op("admin.delete_course"))?;
        Ok(courses.iter().filter(|c| c.id != id).cloned().collect())
    }
}
