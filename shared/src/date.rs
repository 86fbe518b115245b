//! 时间类型模块
//!
//! `Timestamp`: 可序列化的毫秒时间戳，用于缓存条目和持久化状态。
//! 当前时间通过 chrono 获取，在 wasm32 与原生目标上行为一致。

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};
use std::time::Duration;

/// 毫秒时间戳
///
/// 内部存储为 `i64`，表示自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }

    /// 当前时间
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    #[inline]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn as_secs(&self) -> i64 {
        self.0 / 1000
    }

    /// 转换为 UTC 时间，超出范围时返回 None
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }
}

impl From<i64> for Timestamp {
    fn from(ms: i64) -> Self {
        Self(ms)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs.as_millis() as i64)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    /// 两个时间戳之间的差值，负数截断为 0
    fn sub(self, rhs: Timestamp) -> Self::Output {
        let diff_ms = self.0.saturating_sub(rhs.0).max(0);
        Duration::from_millis(diff_ms as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_saturates_at_zero() {
        let earlier = Timestamp::new(1_000);
        let later = Timestamp::new(4_500);
        assert_eq!(later - earlier, Duration::from_millis(3_500));
        assert_eq!(earlier - later, Duration::ZERO);
    }

    #[test]
    fn test_sub_does_not_overflow_on_extremes() {
        assert_eq!(Timestamp::new(i64::MIN) - Timestamp::new(1), Duration::ZERO);
        assert_eq!(
            Timestamp::new(i64::MAX) - Timestamp::new(i64::MIN),
            Duration::from_millis(i64::MAX as u64)
        );
    }

    #[test]
    fn test_add_duration() {
        let ts = Timestamp::new(10) + Duration::from_secs(2);
        assert_eq!(ts.as_millis(), 2_010);
        assert_eq!(ts.as_secs(), 2);
    }
}
