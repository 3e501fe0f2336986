use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dinewise::config::Settings;
use dinewise::core::{HistoryRanker, PreferenceMatcher, Recommender};
use dinewise::models::ScoringWeights;
use dinewise::routes::{self, AppState};
use dinewise::services::{
    AnalyticsCache, AnalyticsService, CatalogStore, EnrichmentClient, EnrichmentConfig, InMemoryStore, OrderStore,
    PostgresStore,
};
use std::io;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| startup_error("Configuration error", e))?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    info!("Starting dinewise service...");

    let (catalog, orders, store_kind): (Arc<dyn CatalogStore>, Arc<dyn OrderStore>, &'static str) =
        match settings.database.url() {
            Some(url) => {
                let db = &settings.database;
                let store = Arc::new(
                    PostgresStore::from_settings(
                        url,
                        db.max_connections,
                        db.min_connections,
                        db.acquire_timeout_secs,
                        db.idle_timeout_secs,
                    )
                    .await
                    .map_err(|e| {
                        error!("Failed to connect to PostgreSQL: {}", e);
                        startup_error("PostgreSQL connection error", e)
                    })?,
                );
                info!("PostgreSQL store initialized (max: {} connections)", db.max_connections.unwrap_or(10));
                let catalog: Arc<dyn CatalogStore> = store.clone();
                let orders: Arc<dyn OrderStore> = store;
                (catalog, orders, "postgres")
            }
            None => {
                warn!("No database URL configured, using the in-memory store");
                let store = Arc::new(InMemoryStore::new());
                let catalog: Arc<dyn CatalogStore> = store.clone();
                let orders: Arc<dyn OrderStore> = store;
                (catalog, orders, "memory")
            }
        };

    let cache = Arc::new(AnalyticsCache::new(settings.cache.max_entries, settings.cache.ttl_secs));
    info!(
        "Analytics cache initialized ({} entries, TTL: {}s)",
        settings.cache.max_entries, settings.cache.ttl_secs
    );

    let analytics = Arc::new(AnalyticsService::new(catalog.clone(), orders.clone(), cache));

    let enrichment = Arc::new(
        EnrichmentClient::new(EnrichmentConfig::from(&settings.enrichment))
            .map_err(|e| startup_error("HTTP client error", e))?,
    );
    if enrichment.is_configured() {
        info!("Text enrichment enabled (model: {})", settings.enrichment.model);
    } else {
        warn!("No enrichment API key configured, AI endpoints will return fallback content");
    }

    let weights = ScoringWeights::from(&settings.scoring.weights);
    let recommender = Recommender::new(
        PreferenceMatcher::new(settings.matching.max_candidates),
        HistoryRanker::new(weights),
    );
    info!("Recommender initialized with weights: {:?}", weights);

    let app_state = AppState {
        catalog,
        orders,
        analytics,
        enrichment,
        recommender: Arc::new(recommender),
        default_page_limit: settings.pagination.default_limit,
        store_kind,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_app)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
