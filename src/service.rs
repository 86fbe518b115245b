//! 页面数据流程
//!
//! 每个页面都遵循同一个循环：请求（经缓存）-> 本地派生 -> 渲染 -> 用户操作 -> 变更 -> 失效 -> 重新请求。
//! 各流程都是 `AppContext` 上的方法，界面层只负责渲染与调用。

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod certificates;
pub mod enrollment;
pub mod instructor;
pub mod learning;
pub mod media;
pub mod notifications;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::{ApiError, ApiResult};

/// 表单必填项检查，返回第一个缺失字段对应的错误
pub(crate) fn require_fields(fields: &[(&str, &str)]) -> ApiResult<()> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(ApiError::invalid_input(format!("{} is required", name))),
        None => Ok(()),
    }
}
