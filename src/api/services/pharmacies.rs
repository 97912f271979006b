//! 药房端点（公开查询 + 直拨记录）

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::helpers::{created_response, success_response};
use crate::api::middleware::OptionalAuthUser;
use crate::services::{CallService, LogCallRequest, PharmacyQuery, PharmacyService};

pub async fn list_pharmacies(
    service: web::Data<Arc<PharmacyService>>,
    query: web::Query<PharmacyQuery>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.list_public(&query).await?))
}

pub async fn get_pharmacy(
    service: web::Data<Arc<PharmacyService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.get_public(&path).await?))
}

pub async fn pharmacy_inventory(
    service: web::Data<Arc<PharmacyService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.public_inventory(&path).await?))
}

/// 记录一次直拨并返回电话号码；请求体可省略
pub async fn log_call(
    caller: OptionalAuthUser,
    service: web::Data<Arc<CallService>>,
    path: web::Path<String>,
    body: Option<web::Json<LogCallRequest>>,
) -> ActixResult<HttpResponse> {
    let medicine_id = body.and_then(|b| b.into_inner().medicine_id);
    let target = service
        .log_call(&path, medicine_id.as_deref(), caller.0.as_ref())
        .await?;
    Ok(created_response(target))
}
