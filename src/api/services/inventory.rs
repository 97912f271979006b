//! 药房库存管理端点（PHARMACY）

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::helpers::success_response;
use crate::api::types::{InventoryListQuery, MessageResponse};
use crate::models::{AuthUser, Role};
use crate::services::{
    AdjustInventoryRequest, CallService, InventoryService, UpsertInventoryRequest,
};

pub async fn list_inventory(
    user: AuthUser,
    service: web::Data<Arc<InventoryService>>,
    query: web::Query<InventoryListQuery>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Pharmacy])?;
    Ok(success_response(service.list_own(&user.id, query.status).await?))
}

pub async fn upsert_item(
    user: AuthUser,
    service: web::Data<Arc<InventoryService>>,
    body: web::Json<UpsertInventoryRequest>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Pharmacy])?;
    Ok(success_response(service.upsert(&user.id, &body).await?))
}

pub async fn adjust_item(
    user: AuthUser,
    service: web::Data<Arc<InventoryService>>,
    path: web::Path<String>,
    body: web::Json<AdjustInventoryRequest>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Pharmacy])?;
    Ok(success_response(
        service.adjust_quantity(&user.id, &path, body.delta).await?,
    ))
}

pub async fn delete_item(
    user: AuthUser,
    service: web::Data<Arc<InventoryService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Pharmacy])?;
    service.delete(&user.id, &path).await?;
    Ok(success_response(MessageResponse {
        message: "Inventory item deleted".to_string(),
    }))
}

/// 本药房的来电记录
pub async fn list_calls(
    user: AuthUser,
    service: web::Data<Arc<CallService>>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Pharmacy])?;
    Ok(success_response(service.list_calls(&user.id).await?))
}
