use crate::core::filters::{compare_items, MenuQuery, OrderQuery};
use crate::models::{MenuItem, MenuItemUpdate, NewMenuItem, Order, OrderStatus};
use crate::services::store::{
    average, AggregateBucket, AggregateQuery, CatalogStore, GroupKey, MenuPage, OrderPage,
    OrderStore, OrderSummary, StoreError,
};
use async_trait::async_trait;
use chrono::{Datelike, Duration, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-process store for development and tests
///
/// Implements the same filter semantics as the PostgreSQL store by evaluating
/// [`crate::core::filters::MenuFilter::matches`] against every item.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    items: RwLock<Vec<MenuItem>>,
    orders: RwLock<Vec<Order>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing items (ids and stats are kept as-is)
    pub fn with_items(items: Vec<MenuItem>) -> Self {
        Self {
            items: RwLock::new(items),
            orders: RwLock::new(Vec::new()),
        }
    }

    pub fn with_data(items: Vec<MenuItem>, orders: Vec<Order>) -> Self {
        Self {
            items: RwLock::new(items),
            orders: RwLock::new(orders),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn find_items(&self, query: &MenuQuery) -> Result<MenuPage, StoreError> {
        let items = self.items.read().await;

        let mut matching: Vec<MenuItem> = items
            .iter()
            .filter(|item| query.filter.matches(item))
            .cloned()
            .collect();

        if !query.sort.is_empty() {
            matching.sort_by(|a, b| compare_items(a, b, &query.sort));
        }

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        Ok(MenuPage { items, total })
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<MenuItem>, StoreError> {
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn insert_item(&self, item: NewMenuItem) -> Result<MenuItem, StoreError> {
        let mut items = self.items.write().await;

        if items.iter().any(|existing| existing.name == item.name) {
            return Err(StoreError::Conflict(format!(
                "menu item '{}' already exists",
                item.name
            )));
        }

        let item = item.into_item(Utc::now());
        items.push(item.clone());
        Ok(item)
    }

    async fn update_item(&self, id: Uuid, update: MenuItemUpdate) -> Result<Option<MenuItem>, StoreError> {
        let mut items = self.items.write().await;

        let Some(index) = items.iter().position(|item| item.id == id) else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            if items.iter().any(|existing| existing.id != id && &existing.name == name) {
                return Err(StoreError::Conflict(format!("menu item '{}' already exists", name)));
            }
        }

        let item = &mut items[index];
        update.apply(item, Utc::now());
        Ok(Some(item.clone()))
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id != id);
        Ok(items.len() < before)
    }

    async fn record_rating(&self, id: Uuid, rating: f64) -> Result<Option<MenuItem>, StoreError> {
        let mut items = self.items.write().await;
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            return Ok(None);
        };
        item.rating = item.rating.with_submission(rating);
        item.updated_at = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn increment_popularity(&self, id: Uuid, by: u64) -> Result<(), StoreError> {
        let mut items = self.items.write().await;
        if let Some(item) = items.iter_mut().find(|item| item.id == id) {
            item.popularity += by;
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        if orders.iter().any(|o| o.order_number == order.order_number) {
            return Err(StoreError::Conflict(format!(
                "order number {} already exists",
                order.order_number
            )));
        }
        orders.push(order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.iter().find(|o| o.id == id).cloned())
    }

    async fn find_orders(&self, query: &OrderQuery) -> Result<OrderPage, StoreError> {
        let orders = self.orders.read().await;

        let mut matching: Vec<Order> = orders
            .iter()
            .filter(|o| query.filter.matches(o))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let orders = matching
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        Ok(OrderPage { orders, total })
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, StoreError> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        order.status = status;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn aggregate(&self, query: &AggregateQuery) -> Result<Vec<AggregateBucket>, StoreError> {
        let orders = self.orders.read().await;
        let mut groups: BTreeMap<String, (u64, f64)> = BTreeMap::new();

        for order in orders.iter() {
            if !query.include_cancelled && order.status == OrderStatus::Cancelled {
                continue;
            }
            if query.from.is_some_and(|from| order.created_at < from)
                || query.to.is_some_and(|to| order.created_at > to)
            {
                continue;
            }

            let entry = groups.entry(group_label(order, query.group_by)).or_default();
            entry.0 += 1;
            entry.1 += order.total_amount;
        }

        Ok(groups
            .into_iter()
            .map(|(key, (order_count, revenue))| AggregateBucket {
                key,
                order_count,
                revenue,
                average_order_value: average(revenue, order_count),
            })
            .collect())
    }

    async fn summary(&self) -> Result<OrderSummary, StoreError> {
        let orders = self.orders.read().await;
        let (total_orders, total_revenue) = orders
            .iter()
            .filter(|o| o.status != OrderStatus::Cancelled)
            .fold((0u64, 0.0f64), |(count, revenue), o| (count + 1, revenue + o.total_amount));

        Ok(OrderSummary {
            total_orders,
            total_revenue,
            average_order_value: average(total_revenue, total_orders),
        })
    }
}

/// Bucket label; matches the labels the PostgreSQL store produces
fn group_label(order: &Order, group_by: GroupKey) -> String {
    let created = order.created_at;
    match group_by {
        GroupKey::Day => created.format("%Y-%m-%d").to_string(),
        GroupKey::Week => {
            let date = created.date_naive();
            let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
            monday.format("%Y-%m-%d").to_string()
        }
        GroupKey::Month => created.format("%Y-%m").to_string(),
        GroupKey::Hour => created.format("%H").to_string(),
        GroupKey::Status => order.status.as_str().to_string(),
        GroupKey::OrderType => order.order_type.as_str().to_string(),
    }
}
