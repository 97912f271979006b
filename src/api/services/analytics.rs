//! 统计端点

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::helpers::success_response;
use crate::models::{AuthUser, Role};
use crate::services::AnalyticsService;

pub async fn overview(
    user: AuthUser,
    service: web::Data<Arc<AnalyticsService>>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Admin])?;
    Ok(success_response(service.overview().await?))
}

pub async fn pharmacy_dashboard(
    user: AuthUser,
    service: web::Data<Arc<AnalyticsService>>,
) -> ActixResult<HttpResponse> {
    user.require_role(&[Role::Pharmacy])?;
    Ok(success_response(service.pharmacy_dashboard(&user.id).await?))
}
