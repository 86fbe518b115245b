//! 宽松的反序列化辅助函数
//!
//! 后端返回的部分字段类型并不稳定：ID 可能是数字也可能是字符串，
//! 价格可能是 `0`、`"0"`、`"19.99"` 或 `null`。这里统一收敛为固定的 Rust 类型。

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Int(i64),
    Float(f64),
    Text(String),
}

impl NumberOrString {
    fn into_string(self) -> String {
        match self {
            NumberOrString::Int(v) => v.to_string(),
            NumberOrString::Float(v) => v.to_string(),
            NumberOrString::Text(v) => v,
        }
    }

    fn into_f64(self) -> f64 {
        match self {
            NumberOrString::Int(v) => v as f64,
            NumberOrString::Float(v) => v,
            NumberOrString::Text(v) => v.trim().parse::<f64>().unwrap_or(0.0),
        }
    }
}

/// ID：数字或字符串 -> String
pub fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer).map(NumberOrString::into_string)
}

/// 可选 ID：`null` / 缺失 -> None
pub fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)
        .map(|opt| opt.map(NumberOrString::into_string))
}

/// 数值：数字、数字字符串或 `null`，无法解析时按 0 处理
pub fn de_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)
        .map(|opt| opt.map(NumberOrString::into_f64).unwrap_or(0.0))
}

/// 可选数值：`null`、缺失或无法解析的字符串 -> None
pub fn de_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer).map(|opt| {
        opt.and_then(|v| match v {
            NumberOrString::Text(t) => t.trim().parse::<f64>().ok(),
            other => Some(other.into_f64()),
        })
    })
}

/// 可选时间：接受 RFC 3339，以及不带时区的 `YYYY-MM-DDTHH:MM:SS[.f]`（按 UTC 处理）。
/// 无法解析的字符串视为 None，不让整条记录解析失败。
pub fn de_opt_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_datetime))
}

pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// 列表：`null` 视为空列表
pub fn de_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}
