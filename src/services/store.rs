use crate::core::filters::{MenuQuery, OrderQuery};
use crate::models::{MenuItem, MenuItemUpdate, NewMenuItem, Order, OrderStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the catalog and order stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),
}

/// One page of menu items plus the total number of matches
#[derive(Debug, Clone)]
pub struct MenuPage {
    pub items: Vec<MenuItem>,
    pub total: u64,
}

#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub total: u64,
}

/// Grouping key for order aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupKey {
    Day,
    Week,
    Month,
    Hour,
    Status,
    OrderType,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Day => "day",
            GroupKey::Week => "week",
            GroupKey::Month => "month",
            GroupKey::Hour => "hour",
            GroupKey::Status => "status",
            GroupKey::OrderType => "orderType",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateQuery {
    pub group_by: GroupKey,
    pub include_cancelled: bool,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl AggregateQuery {
    pub fn new(group_by: GroupKey) -> Self {
        Self {
            group_by,
            include_cancelled: false,
            from: None,
            to: None,
        }
    }

    pub fn including_cancelled(mut self) -> Self {
        self.include_cancelled = true;
        self
    }
}

/// One aggregation group, sorted by `key` ascending in store results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateBucket {
    pub key: String,
    pub order_count: u64,
    pub revenue: f64,
    pub average_order_value: f64,
}

/// Totals over non-cancelled orders
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total_orders: u64,
    pub total_revenue: f64,
    pub average_order_value: f64,
}

/// Persistent collection of menu items
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_items(&self, query: &MenuQuery) -> Result<MenuPage, StoreError>;

    async fn get_item(&self, id: Uuid) -> Result<Option<MenuItem>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the name is taken
    async fn insert_item(&self, item: NewMenuItem) -> Result<MenuItem, StoreError>;

    async fn update_item(&self, id: Uuid, update: MenuItemUpdate) -> Result<Option<MenuItem>, StoreError>;

    async fn delete_item(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn record_rating(&self, id: Uuid, rating: f64) -> Result<Option<MenuItem>, StoreError>;

    async fn increment_popularity(&self, id: Uuid, by: u64) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Persistent collection of placed orders
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: Order) -> Result<Order, StoreError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    async fn find_orders(&self, query: &OrderQuery) -> Result<OrderPage, StoreError>;

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, StoreError>;

    async fn aggregate(&self, query: &AggregateQuery) -> Result<Vec<AggregateBucket>, StoreError>;

    async fn summary(&self) -> Result<OrderSummary, StoreError>;
}

pub(crate) fn average(revenue: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        revenue / count as f64
    }
}
