// Route exports
pub mod analytics;
pub mod menu;
pub mod orders;
pub mod recommendations;

use crate::core::Recommender;
use crate::error::{handle_json_payload_error, handle_path_error, handle_query_payload_error};
use crate::models::HealthResponse;
use crate::services::{AnalyticsService, CatalogStore, EnrichmentClient, OrderStore};
use actix_web::{web, HttpResponse, Responder};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub analytics: Arc<AnalyticsService>,
    pub enrichment: Arc<EnrichmentClient>,
    pub recommender: Arc<Recommender>,
    /// Page size used when a list request has no `limit`
    pub default_page_limit: u32,
    /// Reported by the health check ("postgres" or "memory")
    pub store_kind: &'static str,
}

/// Payload error handlers plus every route; shared by the server and tests
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
        .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
        .app_data(web::PathConfig::default().error_handler(handle_path_error))
        .configure(configure_routes);
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(menu::configure)
            .configure(orders::configure)
            .configure(recommendations::configure)
            .configure(analytics::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = match state.catalog.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        store: state.store_kind.to_string(),
        enrichment_configured: state.enrichment.is_configured(),
        analytics_cache: state.analytics.cache().stats(),
    })
}
