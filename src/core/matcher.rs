use crate::core::filters::{MenuFilter, MenuQuery, SortField, SortKey};
use crate::models::{Availability, CustomerPreferences, MenuItem, SpiceLevel};
use crate::services::store::{CatalogStore, StoreError};

/// Default cap on returned candidates
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

/// Result of the matching process
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub items: Vec<MenuItem>,
    /// True when the primary filter found nothing and the relaxed filter ran
    pub relaxed: bool,
}

/// Translates customer preferences into catalog filters
///
/// # Pipeline
/// 1. Primary filter: every stated preference becomes a constraint
/// 2. Relaxed filter (only when the primary pass is empty): availability plus
///    a vegetarian constraint when vegetarian or vegan was requested
///
/// Both passes order by rating then popularity, descending.
#[derive(Debug, Clone)]
pub struct PreferenceMatcher {
    max_candidates: usize,
}

impl PreferenceMatcher {
    pub fn new(max_candidates: usize) -> Self {
        Self { max_candidates }
    }

    pub fn with_default_limit() -> Self {
        Self::new(DEFAULT_MAX_CANDIDATES)
    }

    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Filter expressing every stated preference
    pub fn primary_filter(&self, preferences: &CustomerPreferences) -> MenuFilter {
        let mut filter = MenuFilter::new()
            .availability(Availability::Available)
            .exclude_allergens(&preferences.allergies)
            .with_any_ingredient(&preferences.preferred_ingredients);

        let dietary = &preferences.dietary;
        if dietary.vegetarian {
            filter.vegetarian = Some(true);
        }
        if dietary.vegan {
            filter.vegan = Some(true);
        }
        if dietary.gluten_free {
            filter.gluten_free = Some(true);
        }
        if dietary.dairy_free {
            filter.dairy_free = Some(true);
        }

        filter.spicy = match preferences.spice_level {
            Some(SpiceLevel::Mild) => Some(false),
            Some(SpiceLevel::Hot) | Some(SpiceLevel::ExtraHot) => Some(true),
            Some(SpiceLevel::Medium) | None => None,
        };

        if let Some(range) = preferences.price_range {
            filter = filter.price_between(range.min, range.max);
        }

        if let Some(category) = preferences.category {
            filter = filter.category(category);
        }

        filter
    }

    /// Fallback filter used once when the primary filter matches nothing
    pub fn relaxed_filter(&self, preferences: &CustomerPreferences) -> MenuFilter {
        let mut filter = MenuFilter::new().availability(Availability::Available);
        if preferences.dietary.vegetarian || preferences.dietary.vegan {
            filter.vegetarian = Some(true);
        }
        filter
    }

    fn ranked_query(&self, filter: MenuFilter) -> MenuQuery {
        MenuQuery::new(filter, self.max_candidates)
            .sorted_by(SortKey::desc(SortField::Rating))
            .sorted_by(SortKey::desc(SortField::Popularity))
    }

    /// Find candidates for the given preferences
    ///
    /// An empty result after relaxation is returned as-is; only store failures
    /// are errors.
    pub async fn find_candidates(
        &self,
        store: &dyn CatalogStore,
        preferences: &CustomerPreferences,
    ) -> Result<MatchOutcome, StoreError> {
        let primary = self.ranked_query(self.primary_filter(preferences));
        let page = store.find_items(&primary).await?;

        if !page.items.is_empty() {
            tracing::debug!("Primary preference filter matched {} items", page.total);
            return Ok(MatchOutcome {
                items: page.items,
                relaxed: false,
            });
        }

        tracing::info!("No items matched preferences, retrying with relaxed filter");

        let relaxed = self.ranked_query(self.relaxed_filter(preferences));
        let page = store.find_items(&relaxed).await?;

        Ok(MatchOutcome {
            items: page.items,
            relaxed: true,
        })
    }
}

impl Default for PreferenceMatcher {
    fn default() -> Self {
        Self::with_default_limit()
    }
}
