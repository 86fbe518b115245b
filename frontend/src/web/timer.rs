//! 定时器封装模块
//!
//! 使用 `web_sys` 的原生定时器 API 替代 `gloo-timers`。

use std::time::Duration;
use wasm_bindgen::prelude::*;

fn clamp_millis(duration: Duration) -> i32 {
    duration.as_millis().min(i32::MAX as u128) as i32
}

/// 周期性定时器
///
/// 封装 `setInterval` API。当 `Interval` 被 drop 时，自动清除定时器。
pub struct Interval {
    handle: Option<i32>,
    #[allow(dead_code)]
    closure: Closure<dyn Fn()>,
}

impl Interval {
    /// 创建新的周期性定时器
    ///
    /// 无法获取 window 时定时器不会启动。
    pub fn new<F>(every: Duration, callback: F) -> Self
    where
        F: Fn() + 'static,
    {
        let closure = Closure::<dyn Fn()>::new(callback);
        let handle = web_sys::window().and_then(|window| {
            window
                .set_interval_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    clamp_millis(every),
                )
                .ok()
        });
        if handle.is_none() {
            log::warn!("[Timer] setInterval unavailable");
        }

        Self { handle, closure }
    }

    /// 取消定时器
    ///
    /// 通常不需要手动调用，因为 drop 时会自动清除。
    pub fn cancel(&self) {
        if let (Some(window), Some(handle)) = (web_sys::window(), self.handle) {
            window.clear_interval_with_handle(handle);
        }
    }
}

impl Drop for Interval {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// 一次性定时器，回调触发后释放闭包
pub fn set_timeout<F>(after: Duration, callback: F)
where
    F: FnOnce() + 'static,
{
    let closure = Closure::once_into_js(callback);
    let scheduled = web_sys::window().and_then(|window| {
        window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.unchecked_ref(),
                clamp_millis(after),
            )
            .ok()
    });
    if scheduled.is_none() {
        log::warn!("[Timer] setTimeout unavailable, delayed callback dropped");
    }
}

