//! 管理员端点：用户管理与药房审核

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::helpers::{paginated_response, success_response};
use crate::api::types::{AdminPharmacyQuery, ApprovalRequest, MessageResponse};
use crate::models::{AuthUser, Role};
use crate::services::{AdminService, PharmacyService, UserQuery};

pub async fn list_users(
    user: AuthUser,
    service: web::Data<Arc<AdminService>>,
    query: web::Query<UserQuery>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    Ok(paginated_response(service.list_users(&query).await?))
}

pub async fn delete_user(
    user: AuthUser,
    service: web::Data<Arc<AdminService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    service.delete_user(&user.id, &path).await?;
    Ok(success_response(MessageResponse {
        message: format!("User {} deleted", path.as_str()),
    }))
}

pub async fn list_pharmacies(
    user: AuthUser,
    service: web::Data<Arc<PharmacyService>>,
    query: web::Query<AdminPharmacyQuery>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    Ok(success_response(service.list_all(query.approved).await?))
}

pub async fn set_approval(
    user: AuthUser,
    service: web::Data<Arc<PharmacyService>>,
    path: web::Path<String>,
    body: web::Json<ApprovalRequest>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    Ok(success_response(
        service.set_approval(&path, body.approved).await?,
    ))
}
