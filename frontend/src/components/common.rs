//! 页面共用的加载状态与提示组件

use std::future::Future;

use coursehub::ApiResult;
use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::web::router::Link;

/// 异步数据的三种状态
#[derive(Debug, Clone, PartialEq)]
pub enum Load<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> From<ApiResult<T>> for Load<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(value) => Load::Ready(value),
            Err(e) => {
                log::error!("{}", e);
                Load::Failed(e.message().to_string())
            }
        }
    }
}

/// 在后台执行请求并把结果写入信号
pub fn spawn_load<T, F>(set: WriteSignal<Load<T>>, fut: F)
where
    T: Send + Sync + 'static,
    F: Future<Output = ApiResult<T>> + 'static,
{
    set.set(Load::Loading);
    spawn_local(async move {
        set.set(Load::from(fut.await));
    });
}

/// 错误写入提示信号，同时记录到控制台
pub fn report<T>(result: ApiResult<T>, set_error: WriteSignal<Option<String>>) -> Option<T> {
    match result {
        Ok(value) => {
            set_error.set(None);
            Some(value)
        }
        Err(e) => {
            log::error!("{}", e);
            set_error.set(Some(e.message().to_string()));
            None
        }
    }
}

/// 读取查询参数
pub fn query_param(location: &str, name: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == name).then(|| value.to_string())
    })
}

pub fn format_price(price: Option<f64>) -> String {
    match price {
        None => "Price unavailable".to_string(),
        Some(price) if price <= 0.0 => "Free".to_string(),
        Some(price) => format!("${:.2}", price),
    }
}

#[component]
pub fn Spinner() -> impl IntoView {
    view! {
        <div class="flex items-center justify-center py-16">
            <span class="loading loading-spinner loading-lg text-primary"></span>
        </div>
    }
}

#[component]
pub fn ErrorAlert(#[prop(into)] message: String) -> impl IntoView {
    view! {
        <div role="alert" class="alert alert-error text-sm py-2">
            <span>{message}</span>
        </div>
    }
}

/// 错误提示信号为 Some 时显示
#[component]
pub fn ErrorBanner(error: ReadSignal<Option<String>>) -> impl IntoView {
    move || error.get().map(|message| view! { <ErrorAlert message=message /> })
}

#[component]
pub fn NotFound(
    #[prop(optional, into)] message: Option<String>,
) -> impl IntoView {
    let message = message.unwrap_or_else(|| "Page not found".to_string());
    view! {
        <div class="flex items-center justify-center py-24">
            <div class="text-center space-y-4">
                <h1 class="text-6xl font-bold text-error">"404"</h1>
                <p class="text-xl">{message}</p>
                <Link to="/courses" class="btn btn-primary">"Browse Courses"</Link>
            </div>
        </div>
    }
}
