//! CourseHub 客户端核心
//!
//! 与平台无关的客户端逻辑：请求缓存、登录态、按角色的导航守卫，以及各个页面的数据流程。
//! 浏览器相关的实现（fetch、Web Storage、定时器）由前端 crate 通过适配器 trait 注入。

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod navigation;
pub mod request;
pub mod service;
pub mod session;
pub mod storage;


pub use api::ApiClient;
pub use cache::RequestCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ClientConfig, EnvAdapter};
pub use context::AppContext;
pub use error::{ApiError, ApiErrorStatus, ApiResult};
pub use navigation::{AppRoute, NavigationController, Section};
pub use request::{HttpBody, HttpClient, HttpRequest, HttpResponse};
pub use session::{SessionEvent, SessionStore};
pub use storage::{MemoryStorage, StorageAdapter};

pub use coursehub_shared as shared;
