//! /api/v1 路由配置
//!
//! 按功能模块拆分 scope；角色检查在 handler 内完成。

use actix_web::{HttpRequest, error::InternalError, web};

use crate::api::constants::API_V1_PREFIX;
use crate::api::error_code::ErrorCode;
use crate::api::helpers::error_response;
use crate::api::middleware::auth_rate_limiter;

use super::{
    admin, analytics, auth, inventory, medicines, notifications, pharmacies, profile,
    reservations, search,
};

/// 认证路由 `/auth`
///
/// 包含：
/// - POST /auth/register - 注册
/// - POST /auth/login - 登录（带限流）
/// - POST /auth/refresh - 刷新 token（带限流）
/// - POST /auth/logout - 登出
/// - GET /auth/me - 当前用户
pub fn auth_routes() -> actix_web::Scope {
    web::scope("/auth")
        .route("/register", web::post().to(auth::register))
        .route(
            "/login",
            web::post().to(auth::login).wrap(auth_rate_limiter()),
        )
        .route(
            "/refresh",
            web::post().to(auth::refresh_token).wrap(auth_rate_limiter()),
        )
        .route("/logout", web::post().to(auth::logout))
        .route("/me", web::get().to(auth::me))
}

/// 个人资料路由 `/profile`
pub fn profile_routes() -> actix_web::Scope {
    web::scope("/profile")
        .route("", web::get().to(profile::get_profile))
        .route("", web::put().to(profile::update_profile))
        .route("/password", web::put().to(profile::change_password))
        .route("/pharmacy", web::put().to(profile::update_pharmacy_profile))
}

/// 药品目录路由 `/medicines`
///
/// 包含：
/// - GET /medicines - 分页列表
/// - GET /medicines/categories - 分类（必须在 /{id} 之前）
/// - GET /medicines/{id}
/// - POST, PUT /{id}, DELETE /{id} - 仅 ADMIN
pub fn medicines_routes() -> actix_web::Scope {
    web::scope("/medicines")
        .route("", web::get().to(medicines::list_medicines))
        .route("", web::post().to(medicines::create_medicine))
        .route("/categories", web::get().to(medicines::list_categories))
        .route("/{id}", web::get().to(medicines::get_medicine))
        .route("/{id}", web::put().to(medicines::update_medicine))
        .route("/{id}", web::delete().to(medicines::delete_medicine))
}

/// 药房路由 `/pharmacies`（公开）
pub fn pharmacies_routes() -> actix_web::Scope {
    web::scope("/pharmacies")
        .route("", web::get().to(pharmacies::list_pharmacies))
        .route("/{id}", web::get().to(pharmacies::get_pharmacy))
        .route("/{id}/inventory", web::get().to(pharmacies::pharmacy_inventory))
        .route("/{id}/calls", web::post().to(pharmacies::log_call))
}

/// 库存路由 `/inventory`（PHARMACY）
pub fn inventory_routes() -> actix_web::Scope {
    web::scope("/inventory")
        .route("", web::get().to(inventory::list_inventory))
        .route("", web::post().to(inventory::upsert_item))
        .route("/{id}", web::patch().to(inventory::adjust_item))
        .route("/{id}", web::delete().to(inventory::delete_item))
}

/// 预约路由 `/reservations`
///
/// 包含：
/// - GET /reservations - 按角色过滤
/// - POST /reservations - PATIENT 创建
/// - POST /reservations/check-timeouts - 超时扫描（必须在 /{id} 之前）
/// - GET /reservations/{id}
/// - POST /reservations/{id}/accept | reject - PHARMACY
/// - POST /reservations/{id}/cancel - PATIENT
pub fn reservations_routes() -> actix_web::Scope {
    web::scope("/reservations")
        .route("", web::get().to(reservations::list_reservations))
        .route("", web::post().to(reservations::create_reservation))
        .route("/check-timeouts", web::post().to(reservations::check_timeouts))
        .route("/{id}", web::get().to(reservations::get_reservation))
        .route("/{id}/accept", web::post().to(reservations::accept_reservation))
        .route("/{id}/reject", web::post().to(reservations::reject_reservation))
        .route("/{id}/cancel", web::post().to(reservations::cancel_reservation))
}

/// 通知路由 `/notifications`
pub fn notifications_routes() -> actix_web::Scope {
    web::scope("/notifications")
        .route("", web::get().to(notifications::list_notifications))
        .route("/unread-count", web::get().to(notifications::unread_count))
        .route("/read-all", web::post().to(notifications::mark_all_read))
        .route("/{id}/read", web::post().to(notifications::mark_read))
        .route("/{id}", web::delete().to(notifications::delete_notification))
}

/// 统计路由 `/analytics`
pub fn analytics_routes() -> actix_web::Scope {
    web::scope("/analytics")
        .route("/overview", web::get().to(analytics::overview))
        .route("/pharmacy", web::get().to(analytics::pharmacy_dashboard))
}

/// 管理路由 `/admin`（ADMIN）
pub fn admin_routes() -> actix_web::Scope {
    web::scope("/admin")
        .route("/users", web::get().to(admin::list_users))
        .route("/users/{id}", web::delete().to(admin::delete_user))
        .route("/pharmacies", web::get().to(admin::list_pharmacies))
        .route(
            "/pharmacies/{id}/approval",
            web::post().to(admin::set_approval),
        )
}

/// 请求体 / 查询串解析失败时返回统一外壳
fn bad_request(message: String, _req: &HttpRequest) -> actix_web::Error {
    let response = error_response(
        actix_web::http::StatusCode::BAD_REQUEST,
        ErrorCode::BadRequest,
        &message,
    );
    InternalError::from_response(message, response).into()
}

/// `/api/v1` 总路由
pub fn api_v1_routes() -> actix_web::Scope {
    web::scope(API_V1_PREFIX)
        .app_data(
            web::JsonConfig::default()
                .limit(64 * 1024)
                .error_handler(|err, req| bad_request(err.to_string(), req)),
        )
        .app_data(
            web::QueryConfig::default().error_handler(|err, req| bad_request(err.to_string(), req)),
        )
        .app_data(
            web::PathConfig::default().error_handler(|err, req| bad_request(err.to_string(), req)),
        )
        .service(auth_routes())
        .service(profile_routes())
        .service(medicines_routes())
        .route("/search", web::get().to(search::search_availability))
        .service(pharmacies_routes())
        .service(inventory_routes())
        .route("/calls", web::get().to(inventory::list_calls))
        .service(reservations_routes())
        .service(notifications_routes())
        .service(analytics_routes())
        .service(admin_routes())
}
