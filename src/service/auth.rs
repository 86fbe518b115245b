//! 登录、注册与资料刷新

use log::warn;

use super::require_fields;
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::request::HttpClient;
use coursehub_shared::protocol::{LoginRequest, ProfileRequest, SignupRequest};
use coursehub_shared::{Role, Session, User};

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl<C: HttpClient> AppContext<C> {
    /// 登录成功后持久化令牌与用户资料；失败时原样返回后端消息，状态不变
    pub async fn login(&self, credentials: Credentials) -> ApiResult<Session> {
        let session = self.authenticate(credentials).await?;
        self.session.establish(session.clone())?;
        Ok(session)
    }

    /// 管理员入口：非管理员即使凭据正确也不会写入登录态
    pub async fn admin_login(&self, credentials: Credentials) -> ApiResult<Session> {
        let session = self.authenticate(credentials).await?;
        if session.user.role != Role::Admin {
            warn!("non-admin {} rejected at admin login", session.user.email);
            return Err(ApiError::forbidden("Access denied. Admin privileges required.")
                .in_op("auth.admin_login"));
        }
        self.session.establish(session.clone())?;
        Ok(session)
    }

    pub async fn signup(&self, form: SignupForm) -> ApiResult<Session> {
        require_fields(&[
            ("Name", form.name.as_str()),
            ("Email", form.email.as_str()),
            ("Password", form.password.as_str()),
        ])?;

        let req = SignupRequest {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            password: form.password,
            role: form.role,
        };
        let session = self
            .api
            .send(&req)
            .await
            .map_err(|e| e.in_op("auth.signup"))?;
        self.session.establish(session.clone())?;
        Ok(session)
    }

    /// 重新拉取资料并改写已持久化的用户信息
    pub async fn refresh_profile(&self) -> ApiResult<User> {
        self.session.require_user()?;
        let resp = self
            .api
            .send(&ProfileRequest)
            .await
            .map_err(|e| e.in_op("auth.refresh_profile"))?;
        self.session.update_user(resp.user.clone())?;
        Ok(resp.user)
    }

    /// 不调用后端
    pub fn logout(&self) {
        self.session.logout();
        self.completing.borrow_mut().clear();
    }

    async fn authenticate(&self, credentials: Credentials) -> ApiResult<Session> {
        require_fields(&[
            ("Email", credentials.email.as_str()),
            ("Password", credentials.password.as_str()),
        ])?;
        let req = LoginRequest {
            email: credentials.email.trim().to_string(),
            password: credentials.password,
        };
        self.api.send(&req).await.map_err(|e| e.in_op("auth.login"))
    }
}
