// Service exports
pub mod analytics;
pub mod cache;
pub mod enrichment;
pub mod memory;
pub mod postgres;
pub mod store;

pub use analytics::{AnalyticsError, AnalyticsService};
pub use cache::{AnalyticsCache, CacheError, CacheKey, CacheStats, Clock, ManualClock, SystemClock};
pub use enrichment::{Answer, AnswerSource, EnrichmentClient, EnrichmentConfig, EnrichmentOutcome, EnrichmentResult};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{CatalogStore, GroupKey, MenuPage, OrderPage, OrderStore, StoreError};
