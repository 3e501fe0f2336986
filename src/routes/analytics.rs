use crate::error::ApiError;
use crate::models::requests::{BreakdownBy, TimeGrouping};
use crate::models::{BreakdownQuery, PopularItemsQuery, SalesQuery};
use crate::routes::AppState;
use actix_web::{http::header::ContentType, web, HttpResponse};
use validator::Validate;

const DEFAULT_POPULAR_LIMIT: usize = 10;

/// Configure analytics routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/analytics/dashboard", web::get().to(dashboard))
        .route("/analytics/sales", web::get().to(sales))
        .route("/analytics/popular-items", web::get().to(popular_items))
        .route("/analytics/order-breakdown", web::get().to(order_breakdown));
}

/// Cached payloads are complete response envelopes
fn cached_json(payload: Vec<u8>) -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::json()).body(payload)
}

/// GET /api/v1/analytics/dashboard
async fn dashboard(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(cached_json(state.analytics.dashboard().await?))
}

/// GET /api/v1/analytics/sales?groupBy=day|week|month|hour
async fn sales(state: web::Data<AppState>, query: web::Query<SalesQuery>) -> Result<HttpResponse, ApiError> {
    let group_by = query.group_by.unwrap_or(TimeGrouping::Day);
    Ok(cached_json(state.analytics.sales(group_by.into()).await?))
}

/// GET /api/v1/analytics/popular-items?limit=10
async fn popular_items(
    state: web::Data<AppState>,
    query: web::Query<PopularItemsQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;
    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT);
    Ok(cached_json(state.analytics.popular_items(limit).await?))
}

/// GET /api/v1/analytics/order-breakdown?by=status|orderType
async fn order_breakdown(
    state: web::Data<AppState>,
    query: web::Query<BreakdownQuery>,
) -> Result<HttpResponse, ApiError> {
    let by = query.by.unwrap_or(BreakdownBy::Status);
    Ok(cached_json(state.analytics.order_breakdown(by.into()).await?))
}
