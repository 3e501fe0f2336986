use crate::core::filters::{MenuFilter, MenuQuery, OrderFilter, OrderQuery, SortDirection, SortField, SortKey};
use crate::models::domain::{
    Availability, CustomerPreferences, DietaryInfo, Ingredient, MenuCategory, MenuItemUpdate,
    NewMenuItem, OrderHistoryEntry, OrderStatus, OrderType,
};
use crate::services::store::GroupKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MenuSortBy {
    Rating,
    Popularity,
    Price,
    Name,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Page/limit pair resolved to offset/limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        ((self.page - 1) as usize) * self.limit as usize
    }
}

/// Query string of `GET /menu`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MenuListQuery {
    pub category: Option<MenuCategory>,
    pub availability: Option<Availability>,
    pub vegetarian: Option<bool>,
    pub vegan: Option<bool>,
    pub gluten_free: Option<bool>,
    pub dairy_free: Option<bool>,
    pub spicy: Option<bool>,
    #[validate(range(min = 0.0, message = "minPrice must be non-negative"))]
    pub min_price: Option<f64>,
    #[validate(range(min = 0.0, message = "maxPrice must be non-negative"))]
    pub max_price: Option<f64>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
    pub sort_by: Option<MenuSortBy>,
    pub order: Option<SortOrder>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

impl MenuListQuery {
    pub fn page_request(&self, default_limit: u32) -> PageRequest {
        PageRequest::new(self.page, self.limit, default_limit)
    }

    pub fn to_menu_query(&self, default_limit: u32) -> MenuQuery {
        let mut filter = MenuFilter::new().price_between(self.min_price, self.max_price);
        filter.category = self.category;
        filter.availability = self.availability;
        filter.vegetarian = self.vegetarian;
        filter.vegan = self.vegan;
        filter.gluten_free = self.gluten_free;
        filter.dairy_free = self.dairy_free;
        filter.spicy = self.spicy;
        if let Some(search) = &self.search {
            filter = filter.search(search);
        }

        let field = match self.sort_by.unwrap_or(MenuSortBy::Name) {
            MenuSortBy::Rating => SortField::Rating,
            MenuSortBy::Popularity => SortField::Popularity,
            MenuSortBy::Price => SortField::Price,
            MenuSortBy::Name => SortField::Name,
            MenuSortBy::CreatedAt => SortField::CreatedAt,
        };
        // Rankings and recency default to descending, price and name to ascending
        let direction = match (self.order, field) {
            (Some(SortOrder::Asc), _) => SortDirection::Asc,
            (Some(SortOrder::Desc), _) => SortDirection::Desc,
            (None, SortField::Price | SortField::Name) => SortDirection::Asc,
            (None, _) => SortDirection::Desc,
        };

        let page = self.page_request(default_limit);
        MenuQuery::new(filter, page.limit as usize)
            .sorted_by(SortKey { field, direction })
            .offset(page.offset())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItemRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: String,
    pub category: MenuCategory,
    #[validate(range(min = 0.0, message = "price must be non-negative"))]
    pub price: f64,
    #[serde(default)]
    #[validate(nested)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub dietary: DietaryInfo,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(range(min = 1, max = 480))]
    pub preparation_time: Option<u32>,
}

impl From<CreateMenuItemRequest> for NewMenuItem {
    fn from(req: CreateMenuItemRequest) -> Self {
        NewMenuItem {
            name: req.name.trim().to_string(),
            description: req.description.trim().to_string(),
            category: req.category,
            price: req.price,
            ingredients: req.ingredients,
            dietary: req.dietary,
            availability: req.availability,
            tags: req.tags,
            preparation_time: req.preparation_time,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItemRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    pub category: Option<MenuCategory>,
    #[validate(range(min = 0.0, message = "price must be non-negative"))]
    pub price: Option<f64>,
    #[validate(nested)]
    pub ingredients: Option<Vec<Ingredient>>,
    pub dietary: Option<DietaryInfo>,
    pub availability: Option<Availability>,
    pub tags: Option<Vec<String>>,
    #[validate(range(min = 1, max = 480))]
    pub preparation_time: Option<u32>,
}

impl From<UpdateMenuItemRequest> for MenuItemUpdate {
    fn from(req: UpdateMenuItemRequest) -> Self {
        MenuItemUpdate {
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description.map(|d| d.trim().to_string()),
            category: req.category,
            price: req.price,
            ingredients: req.ingredients,
            dietary: req.dietary,
            availability: req.availability,
            tags: req.tags,
            preparation_time: req.preparation_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RateMenuItemRequest {
    #[validate(range(min = 1.0, max = 5.0, message = "rating must be between 1 and 5"))]
    pub rating: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1, max = 50, message = "quantity must be between 1 and 50"))]
    pub quantity: u32,
    #[validate(length(max = 200))]
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100, message = "customerName must be 1-100 characters"))]
    pub customer_name: String,
    #[validate(email(message = "customerEmail must be a valid email address"))]
    pub customer_email: Option<String>,
    #[validate(length(min = 1, max = 50, message = "an order needs between 1 and 50 items"), nested)]
    pub items: Vec<OrderItemRequest>,
    pub order_type: OrderType,
    #[validate(range(min = 1, max = 500))]
    pub table_number: Option<u32>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    #[validate(email)]
    pub customer_email: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

impl OrderListQuery {
    pub fn page_request(&self, default_limit: u32) -> PageRequest {
        PageRequest::new(self.page, self.limit, default_limit)
    }

    pub fn to_order_query(&self, default_limit: u32) -> OrderQuery {
        let page = self.page_request(default_limit);
        OrderQuery {
            filter: OrderFilter {
                status: self.status,
                order_type: self.order_type,
                customer_email: self.customer_email.clone(),
                from: self.from,
                to: self.to,
            },
            limit: page.limit as usize,
            offset: page.offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Body of `POST /recommendations`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    #[validate(nested)]
    pub preferences: CustomerPreferences,
    /// Inline history; takes precedence over `customer_email`
    #[serde(default)]
    pub order_history: Vec<OrderHistoryEntry>,
    #[validate(email)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub enhance_descriptions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 500, message = "question must be 1-500 characters"))]
    pub question: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGrouping {
    Day,
    Week,
    Month,
    Hour,
}

impl From<TimeGrouping> for GroupKey {
    fn from(value: TimeGrouping) -> Self {
        match value {
            TimeGrouping::Day => GroupKey::Day,
            TimeGrouping::Week => GroupKey::Week,
            TimeGrouping::Month => GroupKey::Month,
            TimeGrouping::Hour => GroupKey::Hour,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakdownBy {
    Status,
    OrderType,
}

impl From<BreakdownBy> for GroupKey {
    fn from(value: BreakdownBy) -> Self {
        match value {
            BreakdownBy::Status => GroupKey::Status,
            BreakdownBy::OrderType => GroupKey::OrderType,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesQuery {
    pub group_by: Option<TimeGrouping>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreakdownQuery {
    pub by: Option<BreakdownBy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PopularItemsQuery {
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}
