use crate::core::filters::{MenuFilter, MenuQuery, OrderFilter, OrderQuery, SortDirection, SortField};
use crate::models::{
    Availability, DietaryInfo, Ingredient, MenuCategory, MenuItem, MenuItemUpdate, NewMenuItem,
    Order, OrderItem, OrderStatus, OrderType, Rating,
};
use crate::services::store::{
    average, AggregateBucket, AggregateQuery, CatalogStore, GroupKey, MenuPage, OrderPage,
    OrderStore, OrderSummary, StoreError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use uuid::Uuid;

const MENU_COLUMNS: &str = "id, name, description, category, price, ingredients, vegetarian, vegan, \
     gluten_free, dairy_free, spicy, availability, rating_average, rating_count, popularity, tags, \
     preparation_time, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, items, order_type, \
     status, table_number, notes, total_amount, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct MenuItemRow {
    id: Uuid,
    name: String,
    description: String,
    category: MenuCategory,
    price: f64,
    ingredients: Json<Vec<Ingredient>>,
    vegetarian: bool,
    vegan: bool,
    gluten_free: bool,
    dairy_free: bool,
    spicy: bool,
    availability: Availability,
    rating_average: f64,
    rating_count: i64,
    popularity: i64,
    tags: Vec<String>,
    preparation_time: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MenuItemRow> for MenuItem {
    fn from(row: MenuItemRow) -> Self {
        MenuItem {
            id: row.id,
            name: row.name,
            description: row.description,
            category: row.category,
            price: row.price,
            ingredients: row.ingredients.0,
            dietary: DietaryInfo {
                vegetarian: row.vegetarian,
                vegan: row.vegan,
                gluten_free: row.gluten_free,
                dairy_free: row.dairy_free,
                spicy: row.spicy,
            },
            availability: row.availability,
            rating: Rating {
                average: row.rating_average,
                count: row.rating_count.max(0) as u64,
            },
            popularity: row.popularity.max(0) as u64,
            tags: row.tags,
            preparation_time: row.preparation_time.and_then(|m| u32::try_from(m).ok()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_name: String,
    customer_email: Option<String>,
    items: Json<Vec<OrderItem>>,
    order_type: OrderType,
    status: OrderStatus,
    table_number: Option<i32>,
    notes: Option<String>,
    total_amount: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Order {
            id: row.id,
            order_number: row.order_number,
            customer_name: row.customer_name,
            customer_email: row.customer_email,
            items: row.items.0,
            order_type: row.order_type,
            status: row.status,
            table_number: row.table_number.and_then(|n| u32::try_from(n).ok()),
            notes: row.notes,
            total_amount: row.total_amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL-backed catalog and order store
///
/// Menu ingredients and order line items are stored as JSONB; the structured
/// [`MenuFilter`] is translated into SQL predicates over those columns.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run the embedded migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }
}

/// Escape LIKE metacharacters and wrap the term for substring matching
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_menu_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &MenuFilter) {
    builder.push(" WHERE TRUE");

    if let Some(availability) = filter.availability {
        builder.push(" AND availability = ").push_bind(availability);
    }
    if let Some(category) = filter.category {
        builder.push(" AND category = ").push_bind(category);
    }

    let flags = [
        ("vegetarian", filter.vegetarian),
        ("vegan", filter.vegan),
        ("gluten_free", filter.gluten_free),
        ("dairy_free", filter.dairy_free),
        ("spicy", filter.spicy),
    ];
    for (column, wanted) in flags {
        if let Some(wanted) = wanted {
            builder.push(format!(" AND {} = ", column)).push_bind(wanted);
        }
    }

    if let Some(min) = filter.min_price {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND price <= ").push_bind(max);
    }

    if !filter.excluded_allergens.is_empty() {
        builder
            .push(
                " AND NOT EXISTS (SELECT 1 FROM jsonb_array_elements(ingredients) AS ing, \
                 jsonb_array_elements_text(COALESCE(ing->'allergens', '[]'::jsonb)) AS tag \
                 WHERE lower(tag) = ANY(",
            )
            .push_bind(filter.excluded_allergens.clone())
            .push("))");
    }

    if !filter.ingredient_names.is_empty() {
        let patterns: Vec<String> = filter.ingredient_names.iter().map(|n| like_pattern(n)).collect();
        builder
            .push(
                " AND EXISTS (SELECT 1 FROM jsonb_array_elements(ingredients) AS ing \
                 WHERE lower(ing->>'name') LIKE ANY(",
            )
            .push_bind(patterns)
            .push("))");
    }

    if let Some(text) = &filter.search {
        let pattern = like_pattern(text);
        builder
            .push(" AND (lower(name) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR lower(description) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM unnest(tags) AS t WHERE lower(t) LIKE ")
            .push_bind(pattern.clone())
            .push(") OR EXISTS (SELECT 1 FROM jsonb_array_elements(ingredients) AS ing WHERE lower(ing->>'name') LIKE ")
            .push_bind(pattern)
            .push("))");
    }
}

fn push_order_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    builder.push(" WHERE TRUE");

    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(order_type) = filter.order_type {
        builder.push(" AND order_type = ").push_bind(order_type);
    }
    if let Some(email) = &filter.customer_email {
        builder
            .push(" AND lower(customer_email) = ")
            .push_bind(email.to_lowercase());
    }
    if let Some(from) = filter.from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        builder.push(" AND created_at <= ").push_bind(to);
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Rating => "rating_average",
        SortField::Popularity => "popularity",
        SortField::Price => "price",
        SortField::Name => "name",
        SortField::CreatedAt => "created_at",
    }
}

fn group_expression(group_by: GroupKey) -> &'static str {
    match group_by {
        GroupKey::Day => "to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD')",
        GroupKey::Week => "to_char(date_trunc('week', created_at AT TIME ZONE 'UTC'), 'YYYY-MM-DD')",
        GroupKey::Month => "to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM')",
        GroupKey::Hour => "to_char(created_at AT TIME ZONE 'UTC', 'HH24')",
        GroupKey::Status => "status::text",
        GroupKey::OrderType => "order_type::text",
    }
}

fn map_unique_violation(err: sqlx::Error, what: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("{} already exists", what))
        }
        _ => StoreError::SqlxError(err),
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    async fn find_items(&self, query: &MenuQuery) -> Result<MenuPage, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM menu_items");
        push_menu_filter(&mut count, &query.filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM menu_items", MENU_COLUMNS));
        push_menu_filter(&mut select, &query.filter);

        select.push(" ORDER BY ");
        for key in &query.sort {
            let direction = match key.direction {
                SortDirection::Asc => "ASC",
                SortDirection::Desc => "DESC",
            };
            select.push(format!("{} {}, ", sort_column(key.field), direction));
        }
        select.push("name ASC");

        select.push(" LIMIT ").push_bind(query.limit as i64);
        select.push(" OFFSET ").push_bind(query.offset as i64);

        let rows: Vec<MenuItemRow> = select.build_query_as().fetch_all(&self.pool).await?;

        tracing::debug!("Catalog query matched {} items (returned {})", total, rows.len());

        Ok(MenuPage {
            items: rows.into_iter().map(MenuItem::from).collect(),
            total: total.max(0) as u64,
        })
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<MenuItem>, StoreError> {
        let query = format!("SELECT {} FROM menu_items WHERE id = $1", MENU_COLUMNS);
        let row: Option<MenuItemRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MenuItem::from))
    }

    async fn insert_item(&self, item: NewMenuItem) -> Result<MenuItem, StoreError> {
        let item = item.into_item(Utc::now());
        let query = r#"
            INSERT INTO menu_items (
                id, name, description, category, price, ingredients,
                vegetarian, vegan, gluten_free, dairy_free, spicy,
                availability, rating_average, rating_count, popularity, tags,
                preparation_time, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        "#;

        sqlx::query(query)
            .bind(item.id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category)
            .bind(item.price)
            .bind(Json(&item.ingredients))
            .bind(item.dietary.vegetarian)
            .bind(item.dietary.vegan)
            .bind(item.dietary.gluten_free)
            .bind(item.dietary.dairy_free)
            .bind(item.dietary.spicy)
            .bind(item.availability)
            .bind(item.rating.average)
            .bind(item.rating.count as i64)
            .bind(item.popularity as i64)
            .bind(&item.tags)
            .bind(item.preparation_time.map(|m| m as i32))
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, &format!("menu item '{}'", item.name)))?;

        tracing::debug!("Inserted menu item {} ({})", item.name, item.id);

        Ok(item)
    }

    async fn update_item(&self, id: Uuid, update: MenuItemUpdate) -> Result<Option<MenuItem>, StoreError> {
        let Some(mut item) = self.get_item(id).await? else {
            return Ok(None);
        };
        update.apply(&mut item, Utc::now());

        let query = r#"
            UPDATE menu_items SET
                name = $2, description = $3, category = $4, price = $5, ingredients = $6,
                vegetarian = $7, vegan = $8, gluten_free = $9, dairy_free = $10, spicy = $11,
                availability = $12, tags = $13, preparation_time = $14, updated_at = $15
            WHERE id = $1
        "#;

        sqlx::query(query)
            .bind(item.id)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.category)
            .bind(item.price)
            .bind(Json(&item.ingredients))
            .bind(item.dietary.vegetarian)
            .bind(item.dietary.vegan)
            .bind(item.dietary.gluten_free)
            .bind(item.dietary.dairy_free)
            .bind(item.dietary.spicy)
            .bind(item.availability)
            .bind(&item.tags)
            .bind(item.preparation_time.map(|m| m as i32))
            .bind(item.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, &format!("menu item '{}'", item.name)))?;

        Ok(Some(item))
    }

    async fn delete_item(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_rating(&self, id: Uuid, rating: f64) -> Result<Option<MenuItem>, StoreError> {
        let query = format!(
            r#"
            UPDATE menu_items SET
                rating_average = (rating_average * rating_count + $2) / (rating_count + 1),
                rating_count = rating_count + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            MENU_COLUMNS
        );

        let row: Option<MenuItemRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(rating)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(MenuItem::from))
    }

    async fn increment_popularity(&self, id: Uuid, by: u64) -> Result<(), StoreError> {
        sqlx::query("UPDATE menu_items SET popularity = popularity + $2 WHERE id = $1")
            .bind(id)
            .bind(by as i64)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    async fn insert_order(&self, order: Order) -> Result<Order, StoreError> {
        let query = r#"
            INSERT INTO orders (
                id, order_number, customer_name, customer_email, items, order_type,
                status, table_number, notes, total_amount, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#;

        sqlx::query(query)
            .bind(order.id)
            .bind(&order.order_number)
            .bind(&order.customer_name)
            .bind(&order.customer_email)
            .bind(Json(&order.items))
            .bind(order.order_type)
            .bind(order.status)
            .bind(order.table_number.map(|n| n as i32))
            .bind(&order.notes)
            .bind(order.total_amount)
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, &format!("order {}", order.order_number)))?;

        tracing::debug!("Inserted order {} ({} items)", order.order_number, order.items.len());

        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let query = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Order::from))
    }

    async fn find_orders(&self, query: &OrderQuery) -> Result<OrderPage, StoreError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
        push_order_filter(&mut count, &query.filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
        push_order_filter(&mut select, &query.filter);
        select.push(" ORDER BY created_at DESC");
        select.push(" LIMIT ").push_bind(query.limit as i64);
        select.push(" OFFSET ").push_bind(query.offset as i64);

        let rows: Vec<OrderRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(OrderPage {
            orders: rows.into_iter().map(Order::from).collect(),
            total: total.max(0) as u64,
        })
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Option<Order>, StoreError> {
        let query = format!(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ORDER_COLUMNS
        );
        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Order::from))
    }

    async fn aggregate(&self, query: &AggregateQuery) -> Result<Vec<AggregateBucket>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} AS key, COUNT(*) AS order_count, COALESCE(SUM(total_amount), 0) AS revenue FROM orders WHERE TRUE",
            group_expression(query.group_by)
        ));

        if !query.include_cancelled {
            builder.push(" AND status <> ").push_bind(OrderStatus::Cancelled);
        }
        if let Some(from) = query.from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = query.to {
            builder.push(" AND created_at <= ").push_bind(to);
        }
        builder.push(" GROUP BY 1 ORDER BY 1");

        let rows: Vec<(String, i64, f64)> = builder.build_query_as().fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(key, count, revenue)| {
                let order_count = count.max(0) as u64;
                AggregateBucket {
                    key,
                    order_count,
                    revenue,
                    average_order_value: average(revenue, order_count),
                }
            })
            .collect())
    }

    async fn summary(&self) -> Result<OrderSummary, StoreError> {
        let (count, revenue): (i64, f64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total_amount), 0) FROM orders WHERE status <> 'cancelled'",
        )
        .fetch_one(&self.pool)
        .await?;

        let total_orders = count.max(0) as u64;
        Ok(OrderSummary {
            total_orders,
            total_revenue: revenue,
            average_order_value: average(revenue, total_orders),
        })
    }
}
