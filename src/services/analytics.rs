use crate::core::filters::{MenuFilter, MenuQuery, SortField, SortKey};
use crate::models::{Availability, MenuCategory};
use crate::services::cache::{AnalyticsCache, CacheError, CacheKey};
use crate::services::store::{
    AggregateBucket, AggregateQuery, CatalogStore, GroupKey, OrderStore, OrderSummary, StoreError,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Response envelope cached as bytes; `generatedAt` marks the computation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CachedResponse<T> {
    success: bool,
    data: T,
    generated_at: DateTime<Utc>,
}

impl<T> CachedResponse<T> {
    fn new(data: T, generated_at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            data,
            generated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[serde(flatten)]
    pub orders: OrderSummary,
    pub menu_item_count: u64,
    pub available_item_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedAggregate {
    pub group_by: &'static str,
    pub buckets: Vec<AggregateBucket>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularItem {
    pub id: Uuid,
    pub name: String,
    pub category: MenuCategory,
    pub price: f64,
    pub popularity: u64,
    pub rating: f64,
}

/// Read-only aggregates over the catalog and order stores
///
/// Every aggregate is served from [`AnalyticsCache`] as pre-serialized JSON,
/// so repeated requests inside the cache window return identical bytes.
pub struct AnalyticsService {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    cache: Arc<AnalyticsCache>,
}

impl AnalyticsService {
    pub fn new(catalog: Arc<dyn CatalogStore>, orders: Arc<dyn OrderStore>, cache: Arc<AnalyticsCache>) -> Self {
        Self { catalog, orders, cache }
    }

    pub fn cache(&self) -> &AnalyticsCache {
        &self.cache
    }

    pub async fn dashboard(&self) -> Result<Vec<u8>, AnalyticsError> {
        self.cache
            .get_or_compute(&CacheKey::dashboard(), || async {
                let orders = self.orders.summary().await?;

                let all = MenuQuery::new(MenuFilter::new(), 0);
                let menu_item_count = self.catalog.find_items(&all).await?.total;

                let available = MenuQuery::new(MenuFilter::new().availability(Availability::Available), 0);
                let available_item_count = self.catalog.find_items(&available).await?.total;

                Ok::<_, AnalyticsError>(CachedResponse::new(
                    DashboardSummary {
                        orders,
                        menu_item_count,
                        available_item_count,
                    },
                    self.cache.now(),
                ))
            })
            .await
    }

    /// Sales buckets grouped by a time unit (cancelled orders excluded)
    pub async fn sales(&self, group_by: GroupKey) -> Result<Vec<u8>, AnalyticsError> {
        self.grouped(CacheKey::sales(group_by.as_str()), AggregateQuery::new(group_by))
            .await
    }

    /// Order counts per status or order type (cancelled orders included)
    pub async fn order_breakdown(&self, by: GroupKey) -> Result<Vec<u8>, AnalyticsError> {
        self.grouped(
            CacheKey::order_breakdown(by.as_str()),
            AggregateQuery::new(by).including_cancelled(),
        )
        .await
    }

    async fn grouped(&self, key: String, query: AggregateQuery) -> Result<Vec<u8>, AnalyticsError> {
        self.cache
            .get_or_compute(&key, || async {
                let buckets = self.orders.aggregate(&query).await?;
                Ok::<_, AnalyticsError>(CachedResponse::new(
                    GroupedAggregate {
                        group_by: query.group_by.as_str(),
                        buckets,
                    },
                    self.cache.now(),
                ))
            })
            .await
    }

    pub async fn popular_items(&self, limit: usize) -> Result<Vec<u8>, AnalyticsError> {
        self.cache
            .get_or_compute(&CacheKey::popular_items(limit), || async {
                let query = MenuQuery::new(MenuFilter::new(), limit)
                    .sorted_by(SortKey::desc(SortField::Popularity))
                    .sorted_by(SortKey::desc(SortField::Rating));
                let page = self.catalog.find_items(&query).await?;

                let items: Vec<PopularItem> = page
                    .items
                    .into_iter()
                    .map(|item| PopularItem {
                        id: item.id,
                        name: item.name,
                        category: item.category,
                        price: item.price,
                        popularity: item.popularity,
                        rating: item.rating.average,
                    })
                    .collect();

                Ok::<_, AnalyticsError>(CachedResponse::new(items, self.cache.now()))
            })
            .await
    }
}
