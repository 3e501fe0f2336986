use crate::models::{Availability, MenuCategory, MenuItem, Order, OrderStatus, OrderType};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Structured menu filter
///
/// Every constraint is a named optional field. Stores translate it into
/// their own query form (SQL for PostgreSQL, [`MenuFilter::matches`] for the
/// in-memory store).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuFilter {
    pub availability: Option<Availability>,
    pub category: Option<MenuCategory>,
    pub vegetarian: Option<bool>,
    pub vegan: Option<bool>,
    pub gluten_free: Option<bool>,
    pub dairy_free: Option<bool>,
    pub spicy: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Lower-cased allergen tags; items with any of them are excluded
    pub excluded_allergens: Vec<String>,
    /// Lower-cased ingredient name fragments; at least one must match
    pub ingredient_names: Vec<String>,
    /// Substring searched across name, description, tags and ingredient names
    pub search: Option<String>,
}

impl MenuFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn availability(mut self, availability: Availability) -> Self {
        self.availability = Some(availability);
        self
    }

    pub fn category(mut self, category: MenuCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn price_between(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn exclude_allergens<I, S>(mut self, allergens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded_allergens = normalize_terms(allergens);
        self
    }

    pub fn with_any_ingredient<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ingredient_names = normalize_terms(names);
        self
    }

    pub fn search(mut self, text: impl AsRef<str>) -> Self {
        let text = text.as_ref().trim();
        self.search = if text.is_empty() {
            None
        } else {
            Some(text.to_lowercase())
        };
        self
    }

    /// In-process evaluation of the filter against one item
    pub fn matches(&self, item: &MenuItem) -> bool {
        if let Some(availability) = self.availability {
            if item.availability != availability {
                return false;
            }
        }

        if let Some(category) = self.category {
            if item.category != category {
                return false;
            }
        }

        let flags = [
            (self.vegetarian, item.dietary.vegetarian),
            (self.vegan, item.dietary.vegan),
            (self.gluten_free, item.dietary.gluten_free),
            (self.dairy_free, item.dietary.dairy_free),
            (self.spicy, item.dietary.spicy),
        ];
        if flags
            .iter()
            .any(|(wanted, actual)| matches!(wanted, Some(w) if w != actual))
        {
            return false;
        }

        if self.min_price.is_some_and(|min| item.price < min)
            || self.max_price.is_some_and(|max| item.price > max)
        {
            return false;
        }

        if !self.excluded_allergens.is_empty() {
            let has_allergen = item.ingredients.iter().any(|ingredient| {
                ingredient
                    .allergens
                    .iter()
                    .any(|tag| self.excluded_allergens.contains(&tag.to_lowercase()))
            });
            if has_allergen {
                return false;
            }
        }

        if !self.ingredient_names.is_empty() {
            let has_preferred = item.ingredients.iter().any(|ingredient| {
                let name = ingredient.name.to_lowercase();
                self.ingredient_names.iter().any(|wanted| name.contains(wanted))
            });
            if !has_preferred {
                return false;
            }
        }

        if let Some(text) = &self.search {
            if !matches_text(item, text) {
                return false;
            }
        }

        true
    }
}

fn normalize_terms<I, S>(terms: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn matches_text(item: &MenuItem, text: &str) -> bool {
    item.name.to_lowercase().contains(text)
        || item.description.to_lowercase().contains(text)
        || item.tags.iter().any(|t| t.to_lowercase().contains(text))
        || item
            .ingredients
            .iter()
            .any(|i| i.name.to_lowercase().contains(text))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Rating,
    Popularity,
    Price,
    Name,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: SortField) -> Self {
        Self { field, direction: SortDirection::Asc }
    }

    pub fn desc(field: SortField) -> Self {
        Self { field, direction: SortDirection::Desc }
    }
}

/// Filter plus ordering and paging
#[derive(Debug, Clone, PartialEq)]
pub struct MenuQuery {
    pub filter: MenuFilter,
    pub sort: Vec<SortKey>,
    pub limit: usize,
    pub offset: usize,
}

impl MenuQuery {
    pub fn new(filter: MenuFilter, limit: usize) -> Self {
        Self {
            filter,
            sort: Vec::new(),
            limit,
            offset: 0,
        }
    }

    pub fn sorted_by(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// Compare two items by a list of sort keys; name is the final tie-breaker
pub fn compare_items(a: &MenuItem, b: &MenuItem, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let ordering = match key.field {
            SortField::Rating => a.rating.average.partial_cmp(&b.rating.average).unwrap_or(Ordering::Equal),
            SortField::Popularity => a.popularity.cmp(&b.popularity),
            SortField::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
            SortField::Name => a.name.cmp(&b.name),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.name.cmp(&b.name)
}

/// Order list filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub customer_email: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|s| order.status != s) {
            return false;
        }
        if self.order_type.is_some_and(|t| order.order_type != t) {
            return false;
        }
        if let Some(email) = &self.customer_email {
            match &order.customer_email {
                Some(e) if e.eq_ignore_ascii_case(email) => {}
                _ => return false,
            }
        }
        if self.from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| order.created_at > to) {
            return false;
        }
        true
    }
}

/// Orders are always listed newest first
#[derive(Debug, Clone, PartialEq)]
pub struct OrderQuery {
    pub filter: OrderFilter,
    pub limit: usize,
    pub offset: usize,
}
