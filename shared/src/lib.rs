//! CourseHub 共享类型
//!
//! 前端与客户端核心共用的领域模型、传输对象以及接口协议定义。
//! 本 crate 不做任何 I/O。

use serde::{Deserialize, Serialize};

pub mod date;
pub mod models;
pub mod protocol;
pub mod serde_helper;

pub use date::Timestamp;
pub use models::*;
pub use protocol::{ApiRequest, HttpMethod};

use serde_helper::de_id;

// =========================================================
// 常量定义 (Constants)
// =========================================================

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_TYPE_JSON: &str = "application/json";

// =========================================================
// 身份模型 (Identity)
// =========================================================

/// 后端签发的用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

/// 当前访问者
///
/// 所有按角色区分的逻辑都对它做穷尽匹配，未登录也是一个明确的分支。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Viewer {
    Anonymous,
    Student,
    Instructor,
    Admin,
}

impl Viewer {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(session) => Self::from(session.user.role),
            None => Viewer::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Viewer::Anonymous)
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Student => Some(Role::Student),
            Viewer::Instructor => Some(Role::Instructor),
            Viewer::Admin => Some(Role::Admin),
        }
    }
}

impl From<Role> for Viewer {
    fn from(role: Role) -> Self {
        match role {
            Role::Student => Viewer::Student,
            Role::Instructor => Viewer::Instructor,
            Role::Admin => Viewer::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// 导航栏问候语使用的名字（取第一个单词）
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

/// 登录态：令牌 + 用户资料
///
/// 同时也是 `/auth/login` 与 `/auth/signup` 的响应体。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn viewer(&self) -> Viewer {
        Viewer::from(self.user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_accepts_numeric_id() {
        let user: User =
            serde_json::from_str(r#"{"id":42,"name":"Ada Lovelace","email":"a@x.io","role":"instructor"}"#)
                .unwrap();
        assert_eq!(user.id, "42");
        assert_eq!(user.role, Role::Instructor);
        assert_eq!(user.first_name(), "Ada");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let parsed = serde_json::from_str::<User>(r#"{"id":"1","role":"superuser"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_viewer_from_session() {
        assert_eq!(Viewer::from_session(None), Viewer::Anonymous);
        let session = Session {
            token: "t".into(),
            user: User {
                id: "1".into(),
                name: "A".into(),
                email: "a@x.io".into(),
                role: Role::Admin,
            },
        };
        assert_eq!(Viewer::from_session(Some(&session)), Viewer::Admin);
        assert_eq!(session.viewer().role(), Some(Role::Admin));
        assert!(!Viewer::Anonymous.is_authenticated());
    }
}
