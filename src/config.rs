use std::time::Duration;

use crate::error::{ApiError, ApiResult};

// =========================================================
// 默认值 (Defaults)
// =========================================================

/// 这些是默认值，如果构建环境中没有定义对应变量，则使用这些值
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const API_PREFIX: &str = "/api";
pub const DEFAULT_STORAGE_BUCKET: &str = "videos";

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);
pub const DEFAULT_QUIZ_GATE_TTL: Duration = Duration::from_secs(10);
pub const DEFAULT_REFETCH_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_NOTIFICATION_POLL: Duration = Duration::from_secs(5 * 60);

/// 上传视频大小上限 100 MB
pub const MAX_VIDEO_BYTES: u64 = 100 * 1024 * 1024;

pub const ENV_API_URL: &str = "COURSEHUB_API_URL";
pub const ENV_STORAGE_URL: &str = "COURSEHUB_STORAGE_URL";
pub const ENV_STORAGE_KEY: &str = "COURSEHUB_STORAGE_KEY";
pub const ENV_STORAGE_BUCKET: &str = "COURSEHUB_STORAGE_BUCKET";

/// 环境变量读取适配器
/// 浏览器端由构建期的 `option_env!` 提供
pub trait EnvAdapter {
    fn var(&self, name: &str) -> Option<String>;
}

/// 对象存储（视频上传）配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub url: String,
    pub key: String,
    pub bucket: String,
}

/// 客户端配置
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub cache_ttl: Duration,
    pub quiz_gate_ttl: Duration,
    pub refetch_delay: Duration,
    pub notification_poll: Duration,
    /// 会话存储中镜像的缓存 key 前缀
    pub mirrored_prefixes: Vec<String>,
    /// 未配置时视频上传不可用
    pub storage: Option<StorageConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cache_ttl: DEFAULT_CACHE_TTL,
            quiz_gate_ttl: DEFAULT_QUIZ_GATE_TTL,
            refetch_delay: DEFAULT_REFETCH_DELAY,
            notification_poll: DEFAULT_NOTIFICATION_POLL,
            mirrored_prefixes: vec!["course_".to_string(), "lesson_progress_".to_string()],
            storage: None,
        }
    }
}

impl ClientConfig {
    /// 从环境读取，缺失项使用默认值
    pub fn from_env(env: &dyn EnvAdapter) -> ApiResult<Self> {
        let mut config = Self::default();

        if let Some(url) = non_empty(env.var(ENV_API_URL)) {
            config.api_url = validate_url(ENV_API_URL, &url)?;
        }

        // URL 与 KEY 必须同时存在
        config.storage = match (
            non_empty(env.var(ENV_STORAGE_URL)),
            non_empty(env.var(ENV_STORAGE_KEY)),
        ) {
            (Some(url), Some(key)) => Some(StorageConfig {
                url: validate_url(ENV_STORAGE_URL, &url)?,
                key,
                bucket: non_empty(env.var(ENV_STORAGE_BUCKET))
                    .unwrap_or_else(|| DEFAULT_STORAGE_BUCKET.to_string()),
            }),
            (None, None) => None,
            _ => {
                return Err(ApiError::invalid_input(format!(
                    "{} and {} must be set together",
                    ENV_STORAGE_URL, ENV_STORAGE_KEY
                ))
                .in_op("config.from_env"));
            }
        };

        Ok(config)
    }

    /// `<api_url>/api<path>`
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.api_url, API_PREFIX, path)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn validate_url(name: &str, url: &str) -> ApiResult<String> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(ApiError::invalid_input(format!("{} is not an http(s) URL: {}", name, url))
            .in_op("config.from_env"))
    }
}
