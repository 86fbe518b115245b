use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};
use coursehub_shared::HttpMethod;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 请求体
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
    /// JSON 等文本内容
    Text(String),
    /// 文件上传等二进制内容
    Binary(Vec<u8>),
}

impl HttpBody {
    pub fn len(&self) -> usize {
        match self {
            HttpBody::Text(s) => s.len(),
            HttpBody::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            HttpBody::Text(s) => Some(s),
            HttpBody::Binary(_) => None,
        }
    }
}

/// 通用 HTTP 请求结构
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<HttpBody>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(HttpBody::Text(body.to_string()));
        self
    }

    pub fn with_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.body = Some(HttpBody::Binary(bytes));
        self
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 空响应体按 `null` 解析（204 / 只返回状态码的接口）
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        let body = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| ApiError::serialization(e.to_string()))
    }
}

/// HTTP 客户端特性 (Trait)
/// 使用 async_trait 以支持异步调用，(?Send) 是因为浏览器环境下 fetch 相关类型不是 Send 的
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    /// 只有传输层失败才返回 Err；任何 HTTP 状态码都是 Ok
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse>;
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;

    /// 记录的请求
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub url: String,
        pub method: HttpMethod,
        pub headers: HashMap<String, String>,
        pub body: Option<HttpBody>,
    }

    impl RecordedRequest {
        pub fn json_body(&self) -> Option<serde_json::Value> {
            self.body
                .as_ref()
                .and_then(HttpBody::as_text)
                .and_then(|s| serde_json::from_str(s).ok())
        }
    }

    pub struct MockHttpClient {
        // ("METHOD url", 响应)
        responses: RefCell<HashMap<String, ApiResult<HttpResponse>>>,
        pub requests: RefCell<Vec<RecordedRequest>>,
    }

    impl MockHttpClient {
        pub fn new() -> Self {
            Self {
                responses: RefCell::new(HashMap::new()),
                requests: RefCell::new(Vec::new()),
            }
        }

        fn key(method: HttpMethod, url: &str) -> String {
            format!("{} {}", method.as_str(), url)
        }

        pub fn mock_response(
            &self,
            method: HttpMethod,
            url: &str,
            status: u16,
            body: serde_json::Value,
        ) {
            self.responses.borrow_mut().insert(
                Self::key(method, url),
                Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
            );
        }

        pub fn mock_raw(&self, method: HttpMethod, url: &str, status: u16, body: &str) {
            self.responses.borrow_mut().insert(
                Self::key(method, url),
                Ok(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
            );
        }

        pub fn mock_network_failure(&self, method: HttpMethod, url: &str) {
            self.responses.borrow_mut().insert(
                Self::key(method, url),
                Err(ApiError::network("connection refused")),
            );
        }

        /// 某个 URL 被请求的次数
        pub fn count(&self, method: HttpMethod, url: &str) -> usize {
            self.requests
                .borrow()
                .iter()
                .filter(|r| r.method == method && r.url == url)
                .count()
        }

        pub fn last(&self) -> Option<RecordedRequest> {
            self.requests.borrow().last().cloned()
        }

        /// 最近一次发往该 URL 的请求
        pub fn last_to(&self, method: HttpMethod, url: &str) -> Option<RecordedRequest> {
            self.requests
                .borrow()
                .iter()
                .rev()
                .find(|r| r.method == method && r.url == url)
                .cloned()
        }
    }

    #[async_trait::async_trait(?Send)]
    impl HttpClient for MockHttpClient {
        async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
            self.requests.borrow_mut().push(RecordedRequest {
                url: req.url.clone(),
                method: req.method,
                headers: req.headers.clone(),
                body: req.body.clone(),
            });

            let responses = self.responses.borrow();
            match responses.get(&Self::key(req.method, &req.url)) {
                Some(resp) => resp.clone(),
                None => Ok(HttpResponse {
                    status: 404,
                    body: "Not Found".to_string(),
                }),
            }
        }
    }
}
