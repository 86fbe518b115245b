//! HTTP 请求封装模块
//!
//! 使用 `web_sys::fetch` 实现核心库的 `HttpClient`，不依赖 `gloo-net`。

use coursehub::{ApiError, ApiResult, HttpBody, HttpClient, HttpRequest, HttpResponse};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

fn js_err(context: &str, e: JsValue) -> ApiError {
    ApiError::network(format!("{}: {:?}", context, e))
}

/// 浏览器 fetch 客户端
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHttp;

impl BrowserHttp {
    fn build(req: &HttpRequest) -> Result<Request, ApiError> {
        let headers = Headers::new().map_err(|e| js_err("创建 Headers 失败", e))?;
        for (key, value) in &req.headers {
            headers
                .set(key, value)
                .map_err(|e| js_err("设置 Header 失败", e))?;
        }

        let opts = RequestInit::new();
        opts.set_method(req.method.as_str());
        opts.set_headers(&headers.into());

        match &req.body {
            Some(HttpBody::Text(text)) => opts.set_body(&JsValue::from_str(text)),
            Some(HttpBody::Binary(bytes)) => {
                let array = js_sys::Uint8Array::from(bytes.as_slice());
                opts.set_body(&array.into());
            }
            None => {}
        }

        Request::new_with_str_and_init(&req.url, &opts).map_err(|e| js_err("请求构建失败", e))
    }

    async fn read_text(response: &Response) -> ApiResult<String> {
        let promise = response.text().map_err(|e| js_err("响应解析失败", e))?;
        let text = JsFuture::from(promise)
            .await
            .map_err(|e| js_err("响应解析失败", e))?;
        Ok(text.as_string().unwrap_or_default())
    }
}

#[async_trait::async_trait(?Send)]
impl HttpClient for BrowserHttp {
    async fn send(&self, req: HttpRequest) -> ApiResult<HttpResponse> {
        let request = Self::build(&req)?;
        let window =
            web_sys::window().ok_or_else(|| ApiError::network("无法获取 window 对象"))?;

        let resp_value = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| js_err("网络错误", e))?;
        let response: Response = resp_value
            .dyn_into()
            .map_err(|e| js_err("Response 类型转换失败", e))?;

        let status = response.status();
        let body = Self::read_text(&response).await?;
        Ok(HttpResponse { status, body })
    }
}
