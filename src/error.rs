use std::fmt;

use serde::{Deserialize, Serialize};

// =========================================================
// 错误状态枚举
// =========================================================

/// 错误状态枚举
/// 包含错误对应的语义（状态码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiErrorStatus {
    /// 传输层失败（无法连接、请求被中断），没有 HTTP 状态码
    Network,
    /// 401: 令牌缺失或过期
    Unauthorized,
    /// 403: 角色不允许
    Forbidden,
    /// 404: 资源未找到
    NotFound,
    /// 400: 表单校验失败或后端拒绝输入
    InvalidInput,
    /// 409: 资源冲突 (如重复选课)
    Conflict,
    /// 响应体无法解析
    Serialization,
    /// 5xx 以及其他未归类的状态码
    Server,
}

impl ApiErrorStatus {
    /// 由 HTTP 状态码推断错误语义
    pub fn from_status_code(code: u16) -> Self {
        match code {
            400 | 422 => ApiErrorStatus::InvalidInput,
            401 => ApiErrorStatus::Unauthorized,
            403 => ApiErrorStatus::Forbidden,
            404 => ApiErrorStatus::NotFound,
            409 => ApiErrorStatus::Conflict,
            _ => ApiErrorStatus::Server,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiErrorStatus::Network => "NETWORK_ERROR",
            ApiErrorStatus::Unauthorized => "UNAUTHORIZED",
            ApiErrorStatus::Forbidden => "FORBIDDEN",
            ApiErrorStatus::NotFound => "RESOURCE_NOT_FOUND",
            ApiErrorStatus::InvalidInput => "INVALID_INPUT",
            ApiErrorStatus::Conflict => "RESOURCE_CONFLICT",
            ApiErrorStatus::Serialization => "JSON_PARSE_ERROR",
            ApiErrorStatus::Server => "SERVER_ERROR",
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
/// 记录错误发生时的操作和相关细节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSpan {
    /// 操作名称，如 "api.send", "cache.get"
    pub operation: String,
    /// 额外的细节信息，如缓存 key、课程 id 等
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 客户端错误
///
/// - status: 错误类型/语义
/// - message: 面向用户的消息（后端返回的消息原样保留）
/// - spans: 结构化的调用追踪栈
///
/// 实现了 `Clone`：合并后的并发请求共享同一个失败结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: ApiErrorStatus,
    pub message: String,
    spans: Vec<ErrorSpan>,
}

impl ApiError {
    pub fn new(status: ApiErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Network, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::InvalidInput, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Conflict, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Serialization, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::Server, message)
    }

    /// 根据 HTTP 状态码构造
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorStatus::from_status_code(code), message)
    }

    // --- Context builders (Builder Pattern) ---

    /// 添加操作追踪（无额外细节）
    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    /// 添加操作追踪（带额外细节）
    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    // --- Accessors ---

    pub fn error_code(&self) -> &'static str {
        self.status.error_code()
    }

    /// 界面上直接展示的消息
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == ApiErrorStatus::Unauthorized
    }

    pub fn is_not_found(&self) -> bool {
        self.status == ApiErrorStatus::NotFound
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

// =========================================================
// From 实现
// =========================================================

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(ApiErrorStatus::from_status_code(401), ApiErrorStatus::Unauthorized);
        assert_eq!(ApiErrorStatus::from_status_code(403), ApiErrorStatus::Forbidden);
        assert_eq!(ApiErrorStatus::from_status_code(404), ApiErrorStatus::NotFound);
        assert_eq!(ApiErrorStatus::from_status_code(409), ApiErrorStatus::Conflict);
        assert_eq!(ApiErrorStatus::from_status_code(422), ApiErrorStatus::InvalidInput);
        assert_eq!(ApiErrorStatus::from_status_code(503), ApiErrorStatus::Server);
    }

    #[test]
    fn test_display_renders_trace() {
        let err = ApiError::not_found("Course not found")
            .in_op_with("api.send", "/courses/9")
            .in_op("catalog.course_detail");
        assert_eq!(
            err.to_string(),
            "[RESOURCE_NOT_FOUND] Course not found | trace: api.send(/courses/9) -> catalog.course_detail"
        );
        assert_eq!(err.message(), "Course not found");
        assert_eq!(err.spans().len(), 2);
    }

    #[test]
    fn test_serde_error_conversion() {
        let err: ApiError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert_eq!(err.status, ApiErrorStatus::Serialization);
    }
}
