//! 选课、支付跳转与 "我的课程"

use log::info;

use crate::cache::keys;
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::request::HttpClient;
use coursehub_shared::protocol::{CreateCheckoutRequest, EnrollRequest, MyCourses, MyCoursesRequest};
use coursehub_shared::Course;

/// 支付返回时携带的查询参数名
pub const PAYMENT_QUERY_PARAM: &str = "payment";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollOutcome {
    /// 免费课程，已直接选课
    Enrolled,
    /// 付费课程，需要跳转到外部支付页面
    Checkout { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentReturn {
    Success,
    Cancelled,
}

impl PaymentReturn {
    /// 从 `?a=b&payment=success` 形式的查询串中读取支付结果
    pub fn from_query(query: &str) -> Option<Self> {
        query
            .trim_start_matches('?')
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(name, _)| *name == PAYMENT_QUERY_PARAM)
            .and_then(|(_, value)| match value {
                "success" => Some(PaymentReturn::Success),
                "cancelled" => Some(PaymentReturn::Cancelled),
                _ => None,
            })
    }

    /// 从路径（含查询串）中读取
    pub fn from_path(path: &str) -> Option<Self> {
        path.split_once('?')
            .and_then(|(_, query)| Self::from_query(query))
    }
}

/// 去掉路径中的支付参数，其余参数保持原顺序
pub fn strip_payment_flag(path: &str) -> String {
    let Some((base, query)) = path.split_once('?') else {
        return path.to_string();
    };
    let rest: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            !pair.is_empty() && pair.split('=').next() != Some(PAYMENT_QUERY_PARAM)
        })
        .collect();
    if rest.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, rest.join("&"))
    }
}

impl<C: HttpClient + 'static> AppContext<C> {
    /// 免费课程直接选课；付费课程创建支付会话并返回跳转地址
    pub async fn enroll(&self, course: &Course) -> ApiResult<EnrollOutcome> {
        let user = self.session.require_user()?;

        if !course.is_free() {
            let session = self
                .api
                .send(&CreateCheckoutRequest {
                    course_id: course.id.clone(),
                })
                .await
                .map_err(|e| e.in_op_with("enrollment.checkout", course.id.clone()))?;
            info!("checkout started for course {}", course.id);
            return Ok(EnrollOutcome::Checkout {
                url: session.checkout_url,
            });
        }

        self.api
            .send(&EnrollRequest {
                course_id: course.id.clone(),
            })
            .await
            .map_err(|e| e.in_op_with("enrollment.enroll", course.id.clone()))?;
        self.invalidate_enrollment(&course.id, &user.id);
        info!("enrolled {} in free course {}", user.id, course.id);
        Ok(EnrollOutcome::Enrolled)
    }

    /// 处理支付返回
    ///
    /// 返回支付结果与去掉参数后的路径；界面应使用该路径替换当前地址。
    /// 成功时选课相关缓存失效，下一次请求会得到最新状态。
    pub fn handle_payment_return(&self, course_id: &str, path: &str) -> (Option<PaymentReturn>, String) {
        let outcome = PaymentReturn::from_path(path);
        if outcome == Some(PaymentReturn::Success) {
            if let Some(user) = self.session.user() {
                self.invalidate_enrollment(course_id, &user.id);
            }
            info!("payment confirmed for course {}", course_id);
        }
        (outcome, strip_payment_flag(path))
    }

    pub async fn my_courses(&self) -> ApiResult<MyCourses> {
        let user = self.session.require_user()?;
        let api = self.api.clone();
        self.cache
            .get_as(&keys::my_courses(&user.id), move || async move {
                api.send(&MyCoursesRequest).await
            })
            .await
            .map_err(|e| e.in_op("enrollment.my_courses"))
    }

    fn invalidate_enrollment(&self, course_id: &str, user_id: &str) {
        self.cache.clear(&keys::enrollment(course_id, user_id));
        self.cache.clear(&keys::my_courses(user_id));
        self.cache.clear(&keys::progress_stats(user_id));
    }
}
