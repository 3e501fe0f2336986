use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Menu section a dish is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "menu_category", rename_all = "lowercase")]
pub enum MenuCategory {
    Appetizer,
    Main,
    Dessert,
    Beverage,
    Side,
    Salad,
    Soup,
}

impl MenuCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MenuCategory::Appetizer => "appetizer",
            MenuCategory::Main => "main",
            MenuCategory::Dessert => "dessert",
            MenuCategory::Beverage => "beverage",
            MenuCategory::Side => "side",
            MenuCategory::Salad => "salad",
            MenuCategory::Soup => "soup",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "availability", rename_all = "lowercase")]
pub enum Availability {
    Available,
    Limited,
    Unavailable,
}

impl Default for Availability {
    fn default() -> Self {
        Availability::Available
    }
}

/// Ingredient with its allergen tags (e.g. "nuts", "dairy", "gluten")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Ingredient {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
}

/// Dietary flags. The flags are independent; vegan does not imply vegetarian.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryInfo {
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(rename = "glutenFree", default)]
    pub gluten_free: bool,
    #[serde(rename = "dairyFree", default)]
    pub dairy_free: bool,
    #[serde(default)]
    pub spicy: bool,
}

/// Running rating average
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: u64,
}

impl Rating {
    /// Fold a new submission into the running average
    pub fn with_submission(self, value: f64) -> Rating {
        let count = self.count + 1;
        let average = (self.average * self.count as f64 + value) / count as f64;
        Rating { average, count }
    }
}

/// A dish on the menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: MenuCategory,
    pub price: f64,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub dietary: DietaryInfo,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub popularity: u64,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Minutes
    #[serde(default)]
    pub preparation_time: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    pub fn ingredient_names(&self) -> Vec<String> {
        self.ingredients.iter().map(|i| i.name.clone()).collect()
    }
}

/// Fields required to create a menu item; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub name: String,
    pub description: String,
    pub category: MenuCategory,
    pub price: f64,
    pub ingredients: Vec<Ingredient>,
    pub dietary: DietaryInfo,
    pub availability: Availability,
    pub tags: Vec<String>,
    pub preparation_time: Option<u32>,
}

impl NewMenuItem {
    pub fn into_item(self, now: DateTime<Utc>) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            category: self.category,
            price: self.price,
            ingredients: self.ingredients,
            dietary: self.dietary,
            availability: self.availability,
            rating: Rating::default(),
            popularity: 0,
            tags: self.tags,
            preparation_time: self.preparation_time,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<MenuCategory>,
    pub price: Option<f64>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub dietary: Option<DietaryInfo>,
    pub availability: Option<Availability>,
    pub tags: Option<Vec<String>>,
    pub preparation_time: Option<u32>,
}

impl MenuItemUpdate {
    pub fn apply(self, item: &mut MenuItem, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(description) = self.description {
            item.description = description;
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(ingredients) = self.ingredients {
            item.ingredients = ingredients;
        }
        if let Some(dietary) = self.dietary {
            item.dietary = dietary;
        }
        if let Some(availability) = self.availability {
            item.availability = availability;
        }
        if let Some(tags) = self.tags {
            item.tags = tags;
        }
        if let Some(minutes) = self.preparation_time {
            item.preparation_time = Some(minutes);
        }
        item.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "order_status", rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "order_type", rename_all = "kebab-case")]
pub enum OrderType {
    DineIn,
    Takeout,
    Delivery,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::DineIn => "dine-in",
            OrderType::Takeout => "takeout",
            OrderType::Delivery => "delivery",
        }
    }
}

/// Line item snapshot taken when the order was placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub category: MenuCategory,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub price: f64,
    pub quantity: u32,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub items: Vec<OrderItem>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(default)]
    pub table_number: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
    pub total_amount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// View of this order as ranker input
    pub fn history_entry(&self) -> OrderHistoryEntry {
        OrderHistoryEntry {
            items: self
                .items
                .iter()
                .map(|item| HistoryItem {
                    name: Some(item.name.clone()),
                    category: item.category,
                    ingredients: item.ingredients.clone(),
                    price: item.price,
                })
                .collect(),
        }
    }
}

/// One past purchase as seen by the history ranker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(default)]
    pub name: Option<String>,
    pub category: MenuCategory,
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
    #[serde(default)]
    pub items: Vec<HistoryItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpiceLevel {
    Mild,
    Medium,
    Hot,
    ExtraHot,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryPreferences {
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(rename = "glutenFree", default)]
    pub gluten_free: bool,
    #[serde(rename = "dairyFree", default)]
    pub dairy_free: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct PriceRange {
    #[validate(range(min = 0.0))]
    pub min: Option<f64>,
    #[validate(range(min = 0.0))]
    pub max: Option<f64>,
}

/// Customer preferences, constructed per request and never persisted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPreferences {
    #[serde(default)]
    pub dietary: DietaryPreferences,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub spice_level: Option<SpiceLevel>,
    #[serde(default)]
    #[validate(nested)]
    pub price_range: Option<PriceRange>,
    #[serde(default)]
    pub category: Option<MenuCategory>,
    #[serde(default)]
    pub preferred_ingredients: Vec<String>,
}

/// Candidate with its ranker score; `score` is `None` when ranking was skipped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub item: MenuItem,
    pub score: Option<f64>,
}

/// Scoring weights for the history ranker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub rating: f64,
    pub popularity: f64,
    pub category: f64,
    pub ingredient: f64,
    pub price_band: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            rating: 0.4,
            popularity: 0.1,
            category: 0.3,
            ingredient: 0.2,
            price_band: 0.2,
        }
    }
}
