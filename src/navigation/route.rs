//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其访问规则。

use coursehub_shared::{Role, Viewer};
use std::fmt::Display;

use super::section::strip_query;

/// 应用路由枚举
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AppRoute {
    #[default]
    Home,
    Courses,
    CourseDetail { id: String },
    PaymentSuccess,
    Login,
    Signup,
    AdminLogin,
    MyCourses,
    MyStats,
    CourseProgress { course_id: String },
    Certificates,
    Instructor,
    CreateCourse,
    CreateQuiz { course_id: String },
    Admin,
    AdminCourses,
    AdminCreateCourse,
    /// 页面未找到
    NotFound,
}

/// 路由访问规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// 只允许未登录访问（登录、注册入口）
    GuestOnly,
    Authenticated,
    Role(Role),
}

/// 守卫结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(AppRoute),
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举（忽略查询串、片段与末尾的 `/`）
    pub fn from_path(path: &str) -> Self {
        let path = strip_query(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Self::Home,
            ["courses"] => Self::Courses,
            ["course", id] => Self::CourseDetail { id: id.to_string() },
            ["payment-success"] => Self::PaymentSuccess,
            ["login"] => Self::Login,
            ["signup"] => Self::Signup,
            ["admin-login"] => Self::AdminLogin,
            ["my-courses"] => Self::MyCourses,
            ["my-stats"] => Self::MyStats,
            ["progress", course_id] => Self::CourseProgress {
                course_id: course_id.to_string(),
            },
            ["certificates"] => Self::Certificates,
            ["instructor"] => Self::Instructor,
            ["create-course"] => Self::CreateCourse,
            ["create-quiz", course_id] => Self::CreateQuiz {
                course_id: course_id.to_string(),
            },
            ["admin"] => Self::Admin,
            ["admin", "courses"] => Self::AdminCourses,
            ["admin", "create-course"] => Self::AdminCreateCourse,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> String {
        match self {
            Self::Home => "/".into(),
            Self::Courses => "/courses".into(),
            Self::CourseDetail { id } => format!("/course/{}", id),
            Self::PaymentSuccess => "/payment-success".into(),
            Self::Login => "/login".into(),
            Self::Signup => "/signup".into(),
            Self::AdminLogin => "/admin-login".into(),
            Self::MyCourses => "/my-courses".into(),
            Self::MyStats => "/my-stats".into(),
            Self::CourseProgress { course_id } => format!("/progress/{}", course_id),
            Self::Certificates => "/certificates".into(),
            Self::Instructor => "/instructor".into(),
            Self::CreateCourse => "/create-course".into(),
            Self::CreateQuiz { course_id } => format!("/create-quiz/{}", course_id),
            Self::Admin => "/admin".into(),
            Self::AdminCourses => "/admin/courses".into(),
            Self::AdminCreateCourse => "/admin/create-course".into(),
            Self::NotFound => "/404".into(),
        }
    }

    /// **核心守卫规则：该路由允许谁访问**
    pub fn access(&self) -> Access {
        match self {
            Self::Home
            | Self::Courses
            | Self::CourseDetail { .. }
            | Self::PaymentSuccess
            | Self::NotFound => Access::Public,
            Self::Login | Self::Signup | Self::AdminLogin => Access::GuestOnly,
            Self::MyCourses | Self::MyStats | Self::CourseProgress { .. } | Self::Certificates => {
                Access::Authenticated
            }
            Self::Instructor | Self::CreateCourse | Self::CreateQuiz { .. } => {
                Access::Role(Role::Instructor)
            }
            Self::Admin | Self::AdminCourses | Self::AdminCreateCourse => Access::Role(Role::Admin),
        }
    }

    /// 获取认证失败时的重定向目标
    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    /// 角色不符或已登录访问登录页时的重定向目标
    pub fn fallback_redirect() -> Self {
        Self::Home
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

/// 每次导航都要重新评估
pub fn guard(route: &AppRoute, viewer: Viewer) -> GuardDecision {
    match (route.access(), viewer.role()) {
        (Access::Public, _) => GuardDecision::Allow,
        (Access::GuestOnly, None) => GuardDecision::Allow,
        (Access::GuestOnly, Some(_)) => GuardDecision::Redirect(AppRoute::fallback_redirect()),
        (Access::Authenticated | Access::Role(_), None) => {
            GuardDecision::Redirect(AppRoute::auth_failure_redirect())
        }
        (Access::Authenticated, Some(_)) => GuardDecision::Allow,
        (Access::Role(required), Some(role)) if required == role => GuardDecision::Allow,
        (Access::Role(_), Some(_)) => GuardDecision::Redirect(AppRoute::fallback_redirect()),
    }
}
