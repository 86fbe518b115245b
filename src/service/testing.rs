//! 流程测试用的装配

use serde_json::json;
use std::rc::Rc;

use crate::clock::ManualClock;
use crate::config::ClientConfig;
use crate::context::AppContext;
use crate::request::mock::MockHttpClient;
use crate::storage::MemoryStorage;
use coursehub_shared::{HttpMethod, Role, Session, Timestamp, User};

pub const BASE: &str = "http://localhost:5000/api";

pub fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

pub struct Harness {
    pub http: Rc<MockHttpClient>,
    pub durable: Rc<MemoryStorage>,
    pub scratch: Rc<MemoryStorage>,
    pub clock: Rc<ManualClock>,
    pub ctx: AppContext<MockHttpClient>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Self {
        let http = Rc::new(MockHttpClient::new());
        let durable = Rc::new(MemoryStorage::new());
        let scratch = Rc::new(MemoryStorage::new());
        let clock = Rc::new(ManualClock::new(Timestamp::new(1_700_000_000_000)));
        let ctx = AppContext::new(
            config,
            http.clone(),
            durable.clone(),
            scratch.clone(),
            clock.clone(),
        );
        Self {
            http,
            durable,
            scratch,
            clock,
            ctx,
        }
    }

    /// 直接写入登录态（不经过登录接口）
    pub fn sign_in(&self, role: Role) -> User {
        let user = User {
            id: "u1".into(),
            name: "Test User".into(),
            email: "test@example.com".into(),
            role,
        };
        self.ctx
            .session
            .establish(Session {
                token: "token-u1".into(),
                user: user.clone(),
            })
            .unwrap();
        user
    }

    pub fn mock(&self, method: HttpMethod, path: &str, status: u16, body: serde_json::Value) {
        self.http.mock_response(method, &url(path), status, body);
    }

    pub fn mock_ok(&self, method: HttpMethod, path: &str, body: serde_json::Value) {
        self.mock(method, path, 200, body);
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.http.count(method, &url(path))
    }

    /// 最近一次发往该路径的 JSON 请求体
    pub fn sent_body(&self, method: HttpMethod, path: &str) -> Option<serde_json::Value> {
        self.http.last_to(method, &url(path)).and_then(|r| r.json_body())
    }
}

pub fn course_json(id: &str, title: &str, price: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("About {}", title),
        "price": price,
        "category": "Programming",
        "status": "published",
        "instructor_id": "i1",
        "created_at": "2024-01-01T00:00:00Z"
    })
}
