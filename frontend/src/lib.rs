//! CourseHub 前端应用
//!
//! 采用 Context-Driven 的高内聚低耦合架构：
//! - `coursehub`（核心库）: 缓存、登录态、路由守卫与各页面的数据流程
//! - `web::router`: 路由服务，把核心的导航结果同步到 History 与信号
//! - `auth`: 认证上下文，持有核心库的 `AppContext`
//! - `components`: UI 组件层，只负责展示与事件转发

mod auth;
mod components {
    pub mod admin;
    pub mod catalog;
    pub mod common;
    pub mod instructor;
    pub mod learning;
    pub mod login;
    pub mod navbar;
}

use crate::auth::{AuthContext, init_auth};
use crate::components::admin::{AdminCoursesPage, AdminPage};
use crate::components::catalog::{CourseDetailPage, CoursesPage, HomePage, PaymentSuccessPage};
use crate::components::common::NotFound;
use crate::components::instructor::{CourseEditorPage, CreateQuizPage, InstructorPage};
use crate::components::learning::{CertificatesPage, CourseProgressPage, MyCoursesPage, MyStatsPage};
use crate::components::login::{AdminLoginPage, LoginPage, SignupPage};
use crate::components::navbar::Navbar;

use coursehub::AppRoute;
use leptos::prelude::*;

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，
// 以减小 WASM 二进制体积。
pub(crate) mod web {
    pub mod download;
    mod http;
    pub mod router;
    mod storage;
    pub mod timer;

    pub use http::BrowserHttp;
    pub use storage::WebStorage;
    pub use timer::Interval;
}

use web::router::{Router, RouterOutlet};

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Home => view! { <HomePage /> }.into_any(),
        AppRoute::Courses => view! { <CoursesPage /> }.into_any(),
        AppRoute::CourseDetail { id } => view! { <CourseDetailPage id=id /> }.into_any(),
        AppRoute::PaymentSuccess => view! { <PaymentSuccessPage /> }.into_any(),
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Signup => view! { <SignupPage /> }.into_any(),
        AppRoute::AdminLogin => view! { <AdminLoginPage /> }.into_any(),
        AppRoute::MyCourses => view! { <MyCoursesPage /> }.into_any(),
        AppRoute::MyStats => view! { <MyStatsPage /> }.into_any(),
        AppRoute::CourseProgress { course_id } => {
            view! { <CourseProgressPage course_id=course_id /> }.into_any()
        }
        AppRoute::Certificates => view! { <CertificatesPage /> }.into_any(),
        AppRoute::Instructor => view! { <InstructorPage /> }.into_any(),
        AppRoute::CreateCourse | AppRoute::AdminCreateCourse => {
            view! { <CourseEditorPage /> }.into_any()
        }
        AppRoute::CreateQuiz { course_id } => {
            view! { <CreateQuizPage course_id=course_id /> }.into_any()
        }
        AppRoute::Admin => view! { <AdminPage /> }.into_any(),
        AppRoute::AdminCourses => view! { <AdminCoursesPage /> }.into_any(),
        AppRoute::NotFound => view! { <NotFound /> }.into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 创建认证上下文（同时恢复登录态）
    let auth_ctx = AuthContext::new();
    provide_context(auth_ctx);

    // 2. 已登录时在后台刷新用户资料
    init_auth(&auth_ctx);

    view! {
        // 3. 路由器组件：注入认证上下文实现守卫
        <Router auth=auth_ctx>
            <Navbar />
            <main class="min-h-screen bg-base-200">
                <RouterOutlet matcher=route_matcher />
            </main>
        </Router>
    }
}
