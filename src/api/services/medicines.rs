//! 药品目录端点

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::helpers::{created_response, paginated_response, success_response};
use crate::api::types::MessageResponse;
use crate::models::{AuthUser, Role};
use crate::services::{MedicineQuery, MedicineService, MedicineUpdate, NewMedicine};

pub async fn list_medicines(
    service: web::Data<Arc<MedicineService>>,
    query: web::Query<MedicineQuery>,
) -> ActixResult<HttpResponse> {
    Ok(paginated_response(service.list(&query).await?))
}

pub async fn list_categories(
    service: web::Data<Arc<MedicineService>>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.categories().await?))
}

pub async fn get_medicine(
    service: web::Data<Arc<MedicineService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.get(&path).await?))
}

pub async fn create_medicine(
    user: AuthUser,
    service: web::Data<Arc<MedicineService>>,
    body: web::Json<NewMedicine>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    Ok(created_response(service.create(&body).await?))
}

pub async fn update_medicine(
    user: AuthUser,
    service: web::Data<Arc<MedicineService>>,
    path: web::Path<String>,
    body: web::Json<MedicineUpdate>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    Ok(success_response(service.update(&path, &body).await?))
}

pub async fn delete_medicine(
    user: AuthUser,
    service: web::Data<Arc<MedicineService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    service.delete(&path).await?;
    Ok(success_response(MessageResponse {
        message: format!("Medicine {} deleted", path.as_str()),
    }))
}
