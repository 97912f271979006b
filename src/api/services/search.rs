use actix_web::{HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

use crate::api::helpers::success_response;
use crate::services::{SearchQuery, SearchService};

/// 公开的药品可用性检索
pub async fn search_availability(
    service: web::Data<Arc<SearchService>>,
    query: web::Query<SearchQuery>,
) -> ActixResult<HttpResponse> {
    Ok(success_response(service.search(&query).await?))
}
