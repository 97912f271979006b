//! 身份解析中间件与提取器
//!
//! [`JwtIdentity`] 只负责解析身份，从不拒绝请求；是否需要登录由 handler
//! 通过 [`AuthUser`] 提取器（401）和 [`AuthUser::require_role`]（403）决定。

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Payload, ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, trace};

use crate::api::constants;
use crate::api::jwt::get_jwt_service;
use crate::errors::MedifindError;
use crate::models::AuthUser;

/// 认证来源，仅用于日志
#[derive(Clone, Copy, Debug)]
enum AuthMethod {
    /// Authorization: Bearer（API 客户端）
    Bearer,
    /// access cookie（浏览器）
    Cookie,
}

#[derive(Clone, Default)]
pub struct JwtIdentity;

impl<S, B> Transform<S, ServiceRequest> for JwtIdentity
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtIdentityMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtIdentityMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtIdentityMiddleware<S> {
    service: Rc<S>,
}

impl<S> JwtIdentityMiddleware<S> {
    /// 从 Authorization header 提取 Bearer token
    fn extract_bearer_token(req: &ServiceRequest) -> Option<String> {
        req.headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn validate(token: &str, method: AuthMethod) -> Option<AuthUser> {
        match get_jwt_service().validate_access_token(token) {
            Ok(claims) => {
                trace!("{:?} token accepted for user {}", method, claims.sub);
                Some(AuthUser::new(claims.sub, claims.role))
            }
            Err(e) => {
                debug!("{:?} token rejected: {}", method, e);
                None
            }
        }
    }

    /// Bearer 优先，其次 access cookie
    fn resolve(req: &ServiceRequest) -> Option<AuthUser> {
        if let Some(token) = Self::extract_bearer_token(req)
            && let Some(user) = Self::validate(&token, AuthMethod::Bearer)
        {
            return Some(user);
        }

        let token = req
            .cookie(constants::ACCESS_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())?;
        Self::validate(&token, AuthMethod::Cookie)
    }
}

impl<S, B> Service<ServiceRequest> for JwtIdentityMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        if let Some(user) = Self::resolve(&req) {
            req.extensions_mut().insert(user);
        }

        Box::pin(async move { srv.call(req).await })
    }
}

/// 必须登录，否则 401
impl FromRequest for AuthUser {
    type Error = MedifindError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| MedifindError::unauthorized("Authentication required")),
        )
    }
}

/// 可选身份，用于公开但会记录调用者的接口
#[derive(Clone, Debug, Default)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl FromRequest for OptionalAuthUser {
    type Error = MedifindError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalAuthUser(req.extensions().get::<AuthUser>().cloned())))
    }
}
