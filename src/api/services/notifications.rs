//! 通知端点（仅操作本人的通知）

use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::helpers::success_response;
use crate::api::types::{CountResponse, MessageResponse, NotificationListQuery};
use crate::models::AuthUser;
use crate::services::NotificationService;

pub async fn list_notifications(
    user: AuthUser,
    service: web::Data<Arc<NotificationService>>,
    query: web::Query<NotificationListQuery>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(
        service
            .list(&user.id, query.unread_only, query.limit)
            .await?,
    ))
}

pub async fn unread_count(
    user: AuthUser,
    service: web::Data<Arc<NotificationService>>,
) -> ActixResult<HttpResponse> {
    let count = service.unread_count(&user.id).await?;
    Ok(success_response(CountResponse { count }))
}

pub async fn mark_read(
    user: AuthUser,
    service: web::Data<Arc<NotificationService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.mark_read(&user.id, &path).await?))
}

pub async fn mark_all_read(
    user: AuthUser,
    service: web::Data<Arc<NotificationService>>,
) -> ActixResult<HttpResponse> {
    let count = service.mark_all_read(&user.id).await?;
    Ok(success_response(CountResponse { count }))
}

pub async fn delete_notification(
    user: AuthUser,
    service: web::Data<Arc<NotificationService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    service.delete(&user.id, &path).await?;
    Ok(success_response(MessageResponse {
        message: "Notification deleted".to_string(),
    }))
}
