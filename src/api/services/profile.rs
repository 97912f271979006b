//! 个人资料端点

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::helpers::success_response;
use crate::api::types::MessageResponse;
use crate::models::{AuthUser, Role};
use crate::services::{
    ChangePasswordRequest, ProfileService, UpdatePharmacyRequest, UpdateProfileRequest,
};

pub async fn get_profile(
    user: AuthUser,
    service: web::Data<Arc<ProfileService>>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.get_profile(&user.id).await?))
}

pub async fn update_profile(
    user: AuthUser,
    service: web::Data<Arc<ProfileService>>,
    body: web::Json<UpdateProfileRequest>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(
        service.update_profile(&user.id, &body).await?,
    ))
}

pub async fn change_password(
    user: AuthUser,
    service: web::Data<Arc<ProfileService>>,
    body: web::Json<ChangePasswordRequest>,
) -> ActixResult<HttpResponse> {
    service.change_password(&user.id, &body).await?;
    Ok(success_response(MessageResponse {
        message: "Password updated".to_string(),
    }))
}

pub async fn update_pharmacy_profile(
    user: AuthUser,
    service: web::Data<Arc<ProfileService>>,
    body: web::Json<UpdatePharmacyRequest>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Pharmacy])?;
    Ok(success_response(
        service.update_pharmacy_profile(&user.id, &body).await?,
    ))
}
