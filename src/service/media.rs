//! 课时视频的上传与删除
//!
//! 视频直接上传到外部对象存储（Supabase Storage 的 REST 接口），
//! 课时只保存返回的公开地址。

use log::{info, warn};
use std::rc::Rc;

use crate::api::backend_message;
use crate::config::{MAX_VIDEO_BYTES, StorageConfig};
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::request::{HttpClient, HttpRequest};
use coursehub_shared::{HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, HttpMethod, Timestamp};

/// 存储桶内的视频目录
pub const VIDEO_FOLDER: &str = "course-videos";

const DEFAULT_EXTENSION: &str = "mp4";

#[derive(Debug, Clone, PartialEq)]
pub struct VideoFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedVideo {
    /// 存储桶内路径，删除时使用
    pub path: String,
    pub public_url: String,
}

pub fn validate_video(mime_type: &str, size: u64) -> ApiResult<()> {
    if !mime_type.starts_with("video/") {
        return Err(ApiError::invalid_input("Please select a valid video file"));
    }
    if size > MAX_VIDEO_BYTES {
        return Err(ApiError::invalid_input("Video file must be less than 100MB"));
    }
    Ok(())
}

/// `course-videos/<毫秒时间戳>-<随机串>.<扩展名>`
pub fn object_path(file_name: &str, now: Timestamp) -> String {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!(
        "{}/{}-{}.{}",
        VIDEO_FOLDER,
        now.as_millis(),
        uuid::Uuid::new_v4().simple(),
        extension
    )
}

/// 从公开地址还原存储路径（取最后一段文件名）
pub fn path_from_public_url(url: &str) -> Option<String> {
    let file = url.split(['?', '#']).next()?.rsplit('/').next()?;
    if file.is_empty() {
        return None;
    }
    Some(format!("{}/{}", VIDEO_FOLDER, file))
}

// =========================================================
// 存储抽象
// =========================================================

#[async_trait::async_trait(?Send)]
pub trait VideoStorage {
    async fn upload(&self, path: &str, file: &VideoFile) -> ApiResult<()>;
    fn public_url(&self, path: &str) -> String;
    async fn delete(&self, path: &str) -> ApiResult<()>;
}

/// Supabase Storage REST 实现
pub struct ObjectStorage<C: HttpClient> {
    http: Rc<C>,
    config: StorageConfig,
}

impl<C: HttpClient> ObjectStorage<C> {
    pub fn new(http: Rc<C>, config: StorageConfig) -> Self {
        Self { http, config }
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url, self.config.bucket, path
        )
    }

    fn authorized(&self, req: HttpRequest) -> HttpRequest {
        req.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", self.config.key))
            .with_header("apikey", &self.config.key)
    }

    async fn execute(&self, req: HttpRequest, op: &str, path: &str) -> ApiResult<()> {
        let resp = self
            .http
            .send(req)
            .await
            .map_err(|e| e.in_op_with(op.to_string(), path.to_string()))?;
        if resp.is_success() {
            return Ok(());
        }
        let message = backend_message(&resp.body)
            .unwrap_or_else(|| format!("Storage request failed with status {}", resp.status));
        let err = ApiError::from_status(resp.status, message).in_op_with(op.to_string(), path.to_string());
        warn!("{}", err);
        Err(err)
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient> VideoStorage for ObjectStorage<C> {
    async fn upload(&self, path: &str, file: &VideoFile) -> ApiResult<()> {
        let req = self
            .authorized(HttpRequest::new(&self.object_url(path), HttpMethod::Post))
            .with_header(HEADER_CONTENT_TYPE, &file.mime_type)
            .with_header("x-upsert", "false")
            .with_bytes(file.bytes.clone());
        self.execute(req, "media.upload", path).await
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url, self.config.bucket, path
        )
    }

    async fn delete(&self, path: &str) -> ApiResult<()> {
        let req = self.authorized(HttpRequest::new(&self.object_url(path), HttpMethod::Delete));
        self.execute(req, "media.delete", path).await
    }
}

impl<C: HttpClient> AppContext<C> {
    /// 未配置对象存储时视频上传不可用
    pub fn video_storage(&self) -> ApiResult<ObjectStorage<C>> {
        let config = self.config.storage.clone().ok_or_else(|| {
            ApiError::invalid_input("Video storage is not configured").in_op("media.storage")
        })?;
        Ok(ObjectStorage::new(self.http.clone(), config))
    }

    /// 校验后上传，返回存储路径与公开地址
    pub async fn upload_video(&self, file: &VideoFile) -> ApiResult<UploadedVideo> {
        validate_video(&file.mime_type, file.bytes.len() as u64)?;
        let storage = self.video_storage()?;
        let path = object_path(&file.name, self.clock.now());

        storage.upload(&path, file).await?;
        let public_url = storage.public_url(&path);
        info!("video uploaded: {} ({} bytes)", path, file.bytes.len());
        Ok(UploadedVideo { path, public_url })
    }

    pub async fn delete_video(&self, public_url: &str) -> ApiResult<()> {
        let path = path_from_public_url(public_url)
            .ok_or_else(|| ApiError::invalid_input("Invalid video URL"))?;
        self.video_storage()?.delete(&path).await
    }
}
