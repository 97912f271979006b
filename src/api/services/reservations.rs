//! 预约端点

use actix_web::{HttpResponse, Result as ActixResult, web};
use chrono::Utc;
use std::sync::Arc;

use crate::api::helpers::{created_response, success_response};
use crate::api::types::{CountResponse, ReservationListQuery};
use crate::errors::MedifindError;
use crate::models::AuthUser;
use crate::services::{CreateReservationRequest, ReservationService, RespondRequest};

/// 按调用者角色列出
pub async fn list_reservations(
    user: AuthUser,
    service: web::Data<Arc<ReservationService>>,
    query: web::Query<ReservationListQuery>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.list_for(&user, query.status).await?))
}

pub async fn create_reservation(
    user: AuthUser,
    service: web::Data<Arc<ReservationService>>,
    body: web::Json<CreateReservationRequest>,
) -> ActixResult<HttpResponse> {
    Ok(created_response(service.create(&user, &body).await?))
}

pub async fn get_reservation(
    user: AuthUser,
    service: web::Data<Arc<ReservationService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.get(&user, &path).await?))
}

/// 响应说明可省略：空请求体视为无说明，JSON 格式错误返回 400
fn parse_respond_body(body: &[u8]) -> Result<RespondRequest, MedifindError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RespondRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| MedifindError::validation(format!("Invalid request body: {}", e)))
}

pub async fn accept_reservation(
    user: AuthUser,
    service: web::Data<Arc<ReservationService>>,
    path: web::Path<String>,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    let note = parse_respond_body(&body)?.note;
    Ok(success_response(
        service.accept(&user, &path, note.as_deref()).await?,
    ))
}

pub async fn reject_reservation(
    user: AuthUser,
    service: web::Data<Arc<ReservationService>>,
    path: web::Path<String>,
    body: web::Bytes,
) -> ActixResult<HttpResponse> {
    let reason = parse_respond_body(&body)?.note;
    Ok(success_response(
        service.reject(&user, &path, reason.as_deref()).await?,
    ))
}

pub async fn cancel_reservation(
    user: AuthUser,
    service: web::Data<Arc<ReservationService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.cancel(&user, &path).await?))
}

/// 轮询触发的超时扫描，返回本次处理条数
pub async fn check_timeouts(
    _user: AuthUser,
    service: web::Data<Arc<ReservationService>>,
) -> ActixResult<HttpResponse> {
    let count = service.expire_overdue(Utc::now()).await?;
    Ok(success_response(CountResponse { count }))
}
