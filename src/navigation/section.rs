//! 导航分区
//!
//! 分区是路径的纯函数，只用于高亮当前导航项。

use coursehub_shared::Viewer;
use std::fmt::Display;
use std::str::FromStr;

/// 导航栏中的分区（闭集）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    #[default]
    Home,
    BrowseCourses,
    MyCourses,
    MyProgress,
    InstructorDashboard,
    CreateCourse,
    AdminDashboard,
    AdminManageCourses,
    Certificates,
}

/// 路径前缀 -> 分区
///
/// 按路径段边界匹配，取最长前缀。`/` 不在表中，未匹配时即为 Home。
const SECTION_PREFIXES: &[(&str, Section)] = &[
    ("/courses", Section::BrowseCourses),
    ("/course", Section::BrowseCourses),
    ("/my-courses", Section::MyCourses),
    ("/my-stats", Section::MyProgress),
    ("/progress", Section::MyProgress),
    ("/certificates", Section::Certificates),
    ("/instructor", Section::InstructorDashboard),
    ("/create-quiz", Section::InstructorDashboard),
    ("/create-course", Section::CreateCourse),
    ("/admin", Section::AdminDashboard),
    ("/admin/courses", Section::AdminManageCourses),
    ("/admin/create-course", Section::AdminManageCourses),
];

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Home => "home",
            Section::BrowseCourses => "browse-courses",
            Section::MyCourses => "my-courses",
            Section::MyProgress => "my-progress",
            Section::InstructorDashboard => "instructor-dashboard",
            Section::CreateCourse => "create-course",
            Section::AdminDashboard => "admin-dashboard",
            Section::AdminManageCourses => "admin-manage-courses",
            Section::Certificates => "certificates",
        }
    }

    pub const ALL: [Section; 9] = [
        Section::Home,
        Section::BrowseCourses,
        Section::MyCourses,
        Section::MyProgress,
        Section::InstructorDashboard,
        Section::CreateCourse,
        Section::AdminDashboard,
        Section::AdminManageCourses,
        Section::Certificates,
    ];
}

impl Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or(())
    }
}

/// 去掉查询串与片段
pub fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// `path` 是否以 `prefix` 开头且在路径段边界处结束
fn matches_segment(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// 路径对应的分区，对任意输入都有定义
pub fn section_for(path: &str) -> Section {
    let path = strip_query(path);
    SECTION_PREFIXES
        .iter()
        .filter(|(prefix, _)| matches_segment(path, prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, section)| *section)
        .unwrap_or_default()
}

// =========================================================
// 导航动作
// =========================================================

/// 导航栏上可见的入口
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavAction {
    BrowseCourses,
    MyCourses,
    MyProgress,
    Certificates,
    InstructorDashboard,
    CreateCourse,
    AdminDashboard,
    AdminManageCourses,
}

impl NavAction {
    pub fn path(&self) -> &'static str {
        match self {
            NavAction::BrowseCourses => "/courses",
            NavAction::MyCourses => "/my-courses",
            NavAction::MyProgress => "/my-stats",
            NavAction::Certificates => "/certificates",
            NavAction::InstructorDashboard => "/instructor",
            NavAction::CreateCourse => "/create-course",
            NavAction::AdminDashboard => "/admin",
            NavAction::AdminManageCourses => "/admin/courses",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NavAction::BrowseCourses => "Browse Courses",
            NavAction::MyCourses => "My Courses",
            NavAction::MyProgress => "My Progress",
            NavAction::Certificates => "Certificates",
            NavAction::InstructorDashboard => "Dashboard",
            NavAction::CreateCourse => "Create Course",
            NavAction::AdminDashboard => "Admin Dashboard",
            NavAction::AdminManageCourses => "Manage Courses",
        }
    }

    pub fn section(&self) -> Section {
        section_for(self.path())
    }
}

/// 按访问者角色给出导航入口
///
/// 登录/注册入口不受角色控制，不在此列。
pub fn visible_actions(viewer: Viewer) -> &'static [NavAction] {
    match viewer {
        Viewer::Anonymous => &[NavAction::BrowseCourses],
        Viewer::Student => &[
            NavAction::BrowseCourses,
            NavAction::MyCourses,
            NavAction::MyProgress,
            NavAction::Certificates,
        ],
        Viewer::Instructor => &[
            NavAction::BrowseCourses,
            NavAction::InstructorDashboard,
            NavAction::CreateCourse,
        ],
        Viewer::Admin => &[NavAction::AdminDashboard, NavAction::AdminManageCourses],
    }
}
