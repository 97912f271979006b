//! 认证相关端点

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::constants;
use crate::api::error_code::ErrorCode;
use crate::api::helpers::{CookieBuilder, created_response, json_response, success_response};
use crate::api::types::{
    ApiResponse, AuthSuccessResponse, LoginCredentials, MessageResponse, TokenRefreshResponse,
};
use crate::errors::MedifindError;
use crate::models::AuthUser;
use crate::services::{AuthService, RegisterRequest};

/// 注册 PATIENT / PHARMACY 账号
pub async fn register(
    service: web::Data<Arc<AuthService>>,
    body: web::Json<RegisterRequest>,
) -> ActixResult<HttpResponse> {
    let account = service.register(&body).await?;
    Ok(created_response(account))
}

/// 登录，令牌写入 HttpOnly cookie
pub async fn login(
    service: web::Data<Arc<AuthService>>,
    body: web::Json<LoginCredentials>,
) -> ActixResult<HttpResponse> {
    let (user, tokens) = service.login(&body.email, &body.password).await?;

    let cookie_builder = CookieBuilder::from_config();
    let expires_in = cookie_builder.access_token_minutes() * 60;

    Ok(HttpResponse::Ok()
        .cookie(cookie_builder.build_access_cookie(tokens.access_token.clone()))
        .cookie(cookie_builder.build_refresh_cookie(tokens.refresh_token))
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "Login successful".to_string(),
            data: Some(AuthSuccessResponse {
                user,
                access_token: tokens.access_token,
                expires_in,
            }),
        }))
}

/// 刷新令牌（滑动过期）
pub async fn refresh_token(
    req: HttpRequest,
    service: web::Data<Arc<AuthService>>,
) -> ActixResult<HttpResponse> {
    let Some(cookie) = req.cookie(constants::REFRESH_COOKIE_NAME) else {
        warn!("Refresh token not found in cookie");
        return Err(MedifindError::unauthorized("Refresh token not found").into());
    };

    let tokens = service.refresh(cookie.value()).await?;

    let cookie_builder = CookieBuilder::from_config();
    let expires_in = cookie_builder.access_token_minutes() * 60;
    info!("Token refresh successful");

    Ok(HttpResponse::Ok()
        .cookie(cookie_builder.build_access_cookie(tokens.access_token.clone()))
        .cookie(cookie_builder.build_refresh_cookie(tokens.refresh_token))
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: ErrorCode::Success as i32,
            message: "Token refreshed".to_string(),
            data: Some(TokenRefreshResponse {
                access_token: tokens.access_token,
                expires_in,
            }),
        }))
}

/// 登出 - 清除 cookies
pub async fn logout() -> ActixResult<HttpResponse> {
    let cookie_builder = CookieBuilder::from_config();
    let mut response = json_response(
        actix_web::http::StatusCode::OK,
        ErrorCode::Success,
        "Logout successful",
        Some(MessageResponse {
            message: "Logout successful".to_string(),
        }),
    );
    response.add_cookie(&cookie_builder.build_expired_access_cookie())?;
    response.add_cookie(&cookie_builder.build_expired_refresh_cookie())?;
    Ok(response)
}

pub async fn me(
    user: AuthUser,
    service: web::Data<Arc<AuthService>>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.me(&user.id).await?))
}
