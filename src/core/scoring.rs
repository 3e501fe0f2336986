use crate::models::{MenuCategory, MenuItem, OrderHistoryEntry, ScoringWeights};
use std::collections::HashMap;
use std::hash::Hash;
use thiserror::Error;

/// Number of favoured categories kept from history
pub const TOP_CATEGORIES: usize = 3;
/// Number of favoured ingredients kept from history
pub const TOP_INGREDIENTS: usize = 10;

const PRICE_BAND_LOWER: f64 = 0.8;
const PRICE_BAND_UPPER: f64 = 1.2;

#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    #[error("Malformed history entry {entry}: {reason}")]
    MalformedEntry { entry: usize, reason: String },

    #[error("Order history contains no priced items")]
    NoPricedItems,

    #[error("Score for '{0}' is not a finite number")]
    NonFiniteScore(String),
}

/// Inclusive price range derived from past purchases
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBand {
    pub min: f64,
    pub max: f64,
}

impl PriceBand {
    pub fn contains(&self, price: f64) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Preference signals derived from a customer's order history
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySignals {
    pub top_categories: Vec<MenuCategory>,
    /// Lower-cased ingredient names
    pub top_ingredients: Vec<String>,
    pub price_band: PriceBand,
}

/// Frequency counter that remembers first-seen order for tie-breaking
struct FrequencyCounter<K> {
    index: HashMap<K, usize>,
    counts: Vec<(K, usize)>,
}

impl<K: Eq + Hash + Clone> FrequencyCounter<K> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            counts: Vec::new(),
        }
    }

    fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    /// Most frequent keys; the stable sort keeps first-seen order on ties
    fn top(mut self, n: usize) -> Vec<K> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts.into_iter().take(n).map(|(k, _)| k).collect()
    }
}

/// Derive category, ingredient and price signals from order history
pub fn derive_signals(history: &[OrderHistoryEntry]) -> Result<HistorySignals, ScoringError> {
    let mut categories = FrequencyCounter::new();
    let mut ingredients = FrequencyCounter::new();
    let mut min_price = f64::INFINITY;
    let mut max_price = f64::NEG_INFINITY;

    for (entry_index, entry) in history.iter().enumerate() {
        for item in &entry.items {
            if !item.price.is_finite() || item.price < 0.0 {
                return Err(ScoringError::MalformedEntry {
                    entry: entry_index,
                    reason: format!("invalid price {}", item.price),
                });
            }

            categories.add(item.category);
            for name in &item.ingredients {
                let name = name.trim().to_lowercase();
                if !name.is_empty() {
                    ingredients.add(name);
                }
            }

            min_price = min_price.min(item.price);
            max_price = max_price.max(item.price);
        }
    }

    if !min_price.is_finite() {
        return Err(ScoringError::NoPricedItems);
    }

    Ok(HistorySignals {
        top_categories: categories.top(TOP_CATEGORIES),
        top_ingredients: ingredients.top(TOP_INGREDIENTS),
        price_band: PriceBand {
            min: min_price * PRICE_BAND_LOWER,
            max: max_price * PRICE_BAND_UPPER,
        },
    })
}

/// Score a candidate against history signals
///
/// Scoring formula (default weights):
/// score = rating.average * 0.4
///       + popularity * 0.1
///       + 0.3 if category is a favoured category
///       + 0.2 per ingredient found in the favoured ingredients
///       + 0.2 if price lies within the derived price band
pub fn calculate_history_score(
    item: &MenuItem,
    signals: &HistorySignals,
    weights: &ScoringWeights,
) -> Result<f64, ScoringError> {
    let mut score = item.rating.average * weights.rating + item.popularity as f64 * weights.popularity;

    if signals.top_categories.contains(&item.category) {
        score += weights.category;
    }

    let shared_ingredients = item
        .ingredients
        .iter()
        .filter(|i| signals.top_ingredients.contains(&i.name.trim().to_lowercase()))
        .count();
    score += weights.ingredient * shared_ingredients as f64;

    if signals.price_band.contains(item.price) {
        score += weights.price_band;
    }

    if !score.is_finite() {
        return Err(ScoringError::NonFiniteScore(item.name.clone()));
    }

    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Availability, DietaryInfo, HistoryItem, Ingredient, Rating};
    use chrono::Utc;
    use uuid::Uuid;

    fn history_item(category: MenuCategory, ingredients: &[&str], price: f64) -> HistoryItem {
        HistoryItem {
            name: None,
            category,
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            price,
        }
    }

    fn create_test_item(category: MenuCategory, ingredients: &[&str], price: f64) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            name: "Test Dish".to_string(),
            description: String::new(),
            category,
            price,
            ingredients: ingredients
                .iter()
                .map(|name| Ingredient {
                    name: name.to_string(),
                    category: None,
                    allergens: vec![],
                })
                .collect(),
            dietary: DietaryInfo::default(),
            availability: Availability::Available,
            rating: Rating { average: 4.0, count: 10 },
            popularity: 2,
            tags: vec![],
            preparation_time: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_top_categories_break_ties_by_first_seen() {
        let history = vec![OrderHistoryEntry {
            items: vec![
                history_item(MenuCategory::Soup, &[], 6.0),
                history_item(MenuCategory::Dessert, &[], 7.0),
                history_item(MenuCategory::Main, &[], 15.0),
                history_item(MenuCategory::Main, &[], 16.0),
                history_item(MenuCategory::Salad, &[], 9.0),
            ],
        }];

        let signals = derive_signals(&history).unwrap();
        assert_eq!(
            signals.top_categories,
            vec![MenuCategory::Main, MenuCategory::Soup, MenuCategory::Dessert]
        );
    }

    #[test]
    fn test_ingredients_are_lowercased_and_capped() {
        let names: Vec<String> = (0..12).map(|i| format!("Ingredient{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let history = vec![OrderHistoryEntry {
            items: vec![
                history_item(MenuCategory::Main, &refs, 10.0),
                history_item(MenuCategory::Main, &["INGREDIENT11"], 10.0),
            ],
        }];

        let signals = derive_signals(&history).unwrap();
        assert_eq!(signals.top_ingredients.len(), TOP_INGREDIENTS);
        assert_eq!(signals.top_ingredients[0], "ingredient11");
        assert_eq!(signals.top_ingredients[1], "ingredient0");
    }

    #[test]
    fn test_price_band() {
        let history = vec![
            OrderHistoryEntry {
                items: vec![history_item(MenuCategory::Main, &[], 10.0)],
            },
            OrderHistoryEntry {
                items: vec![history_item(MenuCategory::Main, &[], 20.0)],
            },
        ];

        let band = derive_signals(&history).unwrap().price_band;
        assert!((band.min - 8.0).abs() < 1e-9);
        assert!((band.max - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_price_is_malformed() {
        let history = vec![OrderHistoryEntry {
            items: vec![history_item(MenuCategory::Main, &[], -1.0)],
        }];
        assert!(matches!(
            derive_signals(&history),
            Err(ScoringError::MalformedEntry { entry: 0, .. })
        ));
    }

    #[test]
    fn test_history_without_items() {
        let history = vec![OrderHistoryEntry { items: vec![] }];
        assert_eq!(derive_signals(&history), Err(ScoringError::NoPricedItems));
    }

    #[test]
    fn test_score_components() {
        let signals = HistorySignals {
            top_categories: vec![MenuCategory::Main],
            top_ingredients: vec!["garlic".to_string(), "tomato".to_string()],
            price_band: PriceBand { min: 8.0, max: 24.0 },
        };
        let weights = ScoringWeights::default();

        // 4.0*0.4 + 2*0.1 + 0.3 + 2*0.2 + 0.2
        let item = create_test_item(MenuCategory::Main, &["Garlic", "Tomato", "Basil"], 12.0);
        let score = calculate_history_score(&item, &signals, &weights).unwrap();
        assert!((score - 2.7).abs() < 1e-9, "got {}", score);

        // No category, ingredient or price bonus
        let item = create_test_item(MenuCategory::Dessert, &["Sugar"], 30.0);
        let score = calculate_history_score(&item, &signals, &weights).unwrap();
        assert!((score - 1.8).abs() < 1e-9, "got {}", score);
    }

    #[test]
    fn test_padded_ingredient_names_still_match() {
        let history = vec![OrderHistoryEntry {
            items: vec![history_item(MenuCategory::Main, &["  Garlic "], 10.0)],
        }];
        let signals = derive_signals(&history).unwrap();
        assert_eq!(signals.top_ingredients, vec!["garlic"]);

        // 4.0*0.4 + 2*0.1 + one shared ingredient
        let item = create_test_item(MenuCategory::Dessert, &[" Garlic"], 30.0);
        let score = calculate_history_score(&item, &signals, &ScoringWeights::default()).unwrap();
        assert!((score - 2.0).abs() < 1e-9, "got {}", score);
    }
}
