use log::{debug, error};
use std::rc::Rc;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::request::{HttpClient, HttpRequest};
use crate::session::SessionStore;
use coursehub_shared::{ApiRequest, CONTENT_TYPE_JSON, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE};

// =========================================================
// 后端 REST 客户端
// =========================================================

/// 后端 API 客户端
///
/// 这里接受任何实现了 HttpClient 的客户端，从而解耦了具体的 HTTP 实现。
/// 每个请求：拼接 `<base>/api<path>` -> 附带令牌 -> 发送 -> 映射错误。
/// 401 会使当前登录态失效。
pub struct ApiClient<C: HttpClient> {
    http: Rc<C>,
    session: Rc<SessionStore>,
    config: Rc<ClientConfig>,
}

impl<C: HttpClient> Clone for ApiClient<C> {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            session: self.session.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: HttpClient> ApiClient<C> {
    pub fn new(http: Rc<C>, session: Rc<SessionStore>, config: Rc<ClientConfig>) -> Self {
        Self {
            http,
            session,
            config,
        }
    }

    pub async fn send<R: ApiRequest>(&self, req: &R) -> ApiResult<R::Response> {
        let path = req.path();
        let url = self.config.endpoint(&path);
        let mut http_req = HttpRequest::new(&url, R::METHOD);

        if R::METHOD.has_body() {
            let body = serde_json::to_value(req)
                .map_err(|e| ApiError::from(e).in_op_with("api.encode", path.clone()))?;
            http_req = http_req
                .with_header(HEADER_CONTENT_TYPE, CONTENT_TYPE_JSON)
                .with_body(body);
        }

        if R::ATTACH_TOKEN {
            if let Some(token) = self.session.token() {
                http_req = http_req.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", token));
            }
        }

        debug!("{} {}", R::METHOD.as_str(), url);
        let resp = self.http.send(http_req).await.map_err(|e| {
            let e = e.in_op_with("api.send", path.clone());
            error!("API Error: {}", e);
            e
        })?;

        if !resp.is_success() {
            let message = backend_message(&resp.body)
                .unwrap_or_else(|| format!("Request failed with status {}", resp.status));
            let err = ApiError::from_status(resp.status, message).in_op_with("api.send", path);
            error!("API Error: {}", err);

            // 只有携带令牌的请求才说明令牌失效；登录失败同样是 401
            if err.is_unauthorized() && R::ATTACH_TOKEN {
                self.session.expire();
            }
            return Err(err);
        }

        resp.json::<R::Response>().map_err(|e| {
            let e = e.in_op_with("api.decode", path);
            error!("API Error: {}", e);
            e
        })
    }
}

/// 从错误响应体中取出后端消息（`error` 优先，其次 `message`）
pub fn backend_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|field| value.get(*field).and_then(|v| v.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorStatus;
    use crate::request::mock::MockHttpClient;
    use crate::session::{SessionEvent, TOKEN_KEY};
    use crate::storage::{MemoryStorage, StorageAdapter};
    use coursehub_shared::protocol::{GetCourseRequest, LoginRequest, MarkNotificationReadRequest};
    use coursehub_shared::{HttpMethod, Role, Session, User};
    use serde_json::json;
    use std::cell::RefCell;

    const BASE: &str = "http://localhost:5000/api";

    fn setup() -> (Rc<MockHttpClient>, Rc<SessionStore>, Rc<MemoryStorage>, ApiClient<MockHttpClient>) {
        let http = Rc::new(MockHttpClient::new());
        let durable = Rc::new(MemoryStorage::new());
        let session = Rc::new(SessionStore::restore(
            durable.clone(),
            Rc::new(MemoryStorage::new()),
        ));
        let api = ApiClient::new(http.clone(), session.clone(), Rc::new(ClientConfig::default()));
        (http, session, durable, api)
    }

    fn signed_in(session: &SessionStore) {
        session
            .establish(Session {
                token: "tok".into(),
                user: User {
                    id: "u1".into(),
                    name: "Stu Dent".into(),
                    email: "s@x.io".into(),
                    role: Role::Student,
                },
            })
            .unwrap();
    }

    #[test]
    fn test_backend_message_extraction() {
        assert_eq!(backend_message(r#"{"error":"Invalid credentials"}"#).as_deref(), Some("Invalid credentials"));
        assert_eq!(backend_message(r#"{"message":"Nope"}"#).as_deref(), Some("Nope"));
        assert_eq!(backend_message("Internal Server Error"), None);
    }

    #[tokio::test]
    async fn test_attaches_bearer_token() {
        let (http, session, _, api) = setup();
        signed_in(&session);
        http.mock_response(HttpMethod::Get, &format!("{}/courses/c1", BASE), 200, json!({"course": {"id": "c1", "title": "Rust"}}));

        let resp = api.send(&GetCourseRequest { id: "c1".into() }).await.unwrap();
        assert_eq!(resp.course.title, "Rust");

        let sent = http.last().unwrap();
        assert_eq!(sent.headers.get(HEADER_AUTHORIZATION).map(String::as_str), Some("Bearer tok"));
        assert!(sent.body.is_none());
    }

    #[tokio::test]
    async fn test_login_sends_json_without_token() {
        let (http, session, _, api) = setup();
        signed_in(&session);
        http.mock_response(
            HttpMethod::Post,
            &format!("{}/auth/login", BASE),
            200,
            json!({"token": "t2", "user": {"id": 2, "name": "B", "email": "b@x.io", "role": "admin"}}),
        );

        let login = LoginRequest {
            email: "b@x.io".into(),
            password: "pw".into(),
        };
        let resp = api.send(&login).await.unwrap();
        assert_eq!(resp.user.id, "2");

        let sent = http.last().unwrap();
        assert!(!sent.headers.contains_key(HEADER_AUTHORIZATION));
        assert_eq!(sent.headers.get(HEADER_CONTENT_TYPE).map(String::as_str), Some(CONTENT_TYPE_JSON));
        assert_eq!(sent.json_body(), Some(json!({"email": "b@x.io", "password": "pw"})));
    }

    #[tokio::test]
    async fn test_unauthorized_expires_session() {
        let (http, session, durable, api) = setup();
        signed_in(&session);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        session.subscribe(move |e| sink.borrow_mut().push(e));

        http.mock_response(HttpMethod::Get, &format!("{}/courses/c1", BASE), 401, json!({"error": "Token expired"}));
        let err = api.send(&GetCourseRequest { id: "c1".into() }).await.unwrap_err();

        assert_eq!(err.status, ApiErrorStatus::Unauthorized);
        assert_eq!(err.message(), "Token expired");
        assert!(session.current().is_none());
        assert!(durable.get(TOKEN_KEY).is_none());
        assert_eq!(*events.borrow(), vec![SessionEvent::Expired]);
    }

    #[tokio::test]
    async fn test_failed_login_keeps_existing_state() {
        let (http, session, _, api) = setup();
        http.mock_response(HttpMethod::Post, &format!("{}/auth/login", BASE), 401, json!({"error": "Invalid credentials"}));

        let login = LoginRequest {
            email: "a@x.io".into(),
            password: "bad".into(),
        };
        let err = api.send(&login).await.unwrap_err();
        assert_eq!(err.message(), "Invalid credentials");
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_status_and_network_errors() {
        let (http, _, _, api) = setup();

        // 未配置的 URL 返回 404 纯文本
        let err = api.send(&GetCourseRequest { id: "missing".into() }).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.message(), "Request failed with status 404");

        http.mock_network_failure(HttpMethod::Get, &format!("{}/courses/down", BASE));
        let err = api.send(&GetCourseRequest { id: "down".into() }).await.unwrap_err();
        assert_eq!(err.status, ApiErrorStatus::Network);
    }

    #[tokio::test]
    async fn test_empty_ack_body_is_accepted() {
        let (http, _, _, api) = setup();
        http.mock_raw(HttpMethod::Put, &format!("{}/notifications/n1/read", BASE), 200, "");

        api.send(&MarkNotificationReadRequest { id: "n1".into() }).await.unwrap();
        assert_eq!(http.last().unwrap().json_body(), Some(json!({})));
    }
}
