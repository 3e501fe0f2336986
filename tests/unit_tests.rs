// Unit tests for the dinewise matching and ranking core

use chrono::Utc;
use dinewise::core::{calculate_history_score, derive_signals, HistoryRanker, MenuFilter, PreferenceMatcher};
use dinewise::models::{
    Availability, CustomerPreferences, DietaryInfo, DietaryPreferences, HistoryItem, Ingredient, MenuCategory,
    MenuItem, OrderHistoryEntry, PriceRange, Rating, ScoringWeights, SpiceLevel,
};
use uuid::Uuid;

fn create_test_item(name: &str, category: MenuCategory, price: f64) -> MenuItem {
    MenuItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("{} from the kitchen", name),
        category,
        price,
        ingredients: vec![],
        dietary: DietaryInfo::default(),
        availability: Availability::Available,
        rating: Rating { average: 4.0, count: 3 },
        popularity: 1,
        tags: vec![],
        preparation_time: Some(15),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn ingredient(name: &str, allergens: &[&str]) -> Ingredient {
    Ingredient {
        name: name.to_string(),
        category: None,
        allergens: allergens.iter().map(|a| a.to_string()).collect(),
    }
}

fn history_entry(category: MenuCategory, price: f64) -> OrderHistoryEntry {
    OrderHistoryEntry {
        items: vec![HistoryItem {
            name: None,
            category,
            ingredients: vec![],
            price,
        }],
    }
}

#[test]
fn test_dietary_flags_combine_with_and() {
    let matcher = PreferenceMatcher::default();
    let preferences = CustomerPreferences {
        dietary: DietaryPreferences {
            vegetarian: true,
            gluten_free: true,
            ..DietaryPreferences::default()
        },
        ..CustomerPreferences::default()
    };
    let filter = matcher.primary_filter(&preferences);

    let mut both = create_test_item("Risotto", MenuCategory::Main, 16.0);
    both.dietary.vegetarian = true;
    both.dietary.gluten_free = true;

    let mut only_vegetarian = create_test_item("Lasagna", MenuCategory::Main, 16.0);
    only_vegetarian.dietary.vegetarian = true;

    assert!(filter.matches(&both));
    assert!(!filter.matches(&only_vegetarian));
}

#[test]
fn test_vegan_does_not_imply_vegetarian_flag() {
    let mut item = create_test_item("Tofu bowl", MenuCategory::Main, 12.0);
    item.dietary.vegan = true;

    let filter = MenuFilter {
        vegetarian: Some(true),
        ..MenuFilter::new()
    };
    assert!(!filter.matches(&item));
}

#[test]
fn test_allergen_exclusion_is_case_insensitive() {
    let matcher = PreferenceMatcher::default();
    let preferences = CustomerPreferences {
        allergies: vec!["Nuts".to_string()],
        ..CustomerPreferences::default()
    };
    let filter = matcher.primary_filter(&preferences);

    let mut satay = create_test_item("Satay", MenuCategory::Appetizer, 9.0);
    satay.ingredients = vec![ingredient("Peanut sauce", &["NUTS"]), ingredient("Chicken", &[])];

    let mut spring_rolls = create_test_item("Spring rolls", MenuCategory::Appetizer, 7.0);
    spring_rolls.ingredients = vec![ingredient("Cabbage", &[])];

    assert!(!filter.matches(&satay));
    assert!(filter.matches(&spring_rolls));
}

#[test]
fn test_preferred_ingredients_match_by_substring() {
    let matcher = PreferenceMatcher::default();
    let preferences = CustomerPreferences {
        preferred_ingredients: vec!["mushroom".to_string()],
        ..CustomerPreferences::default()
    };
    let filter = matcher.primary_filter(&preferences);

    let mut pizza = create_test_item("Pizza", MenuCategory::Main, 14.0);
    pizza.ingredients = vec![ingredient("Wild Mushrooms", &[])];

    let salad = create_test_item("Salad", MenuCategory::Salad, 9.0);

    assert!(filter.matches(&pizza));
    assert!(!filter.matches(&salad));
}

#[test]
fn test_price_range_is_inclusive() {
    let matcher = PreferenceMatcher::default();
    let preferences = CustomerPreferences {
        price_range: Some(PriceRange {
            min: Some(10.0),
            max: Some(25.0),
        }),
        ..CustomerPreferences::default()
    };
    let filter = matcher.primary_filter(&preferences);

    assert!(filter.matches(&create_test_item("Low", MenuCategory::Main, 10.0)));
    assert!(filter.matches(&create_test_item("High", MenuCategory::Main, 25.0)));
    assert!(!filter.matches(&create_test_item("Over", MenuCategory::Main, 25.01)));
}

#[test]
fn test_spice_level_mapping() {
    let matcher = PreferenceMatcher::default();
    let with_spice = |level| CustomerPreferences {
        spice_level: Some(level),
        ..CustomerPreferences::default()
    };

    assert_eq!(matcher.primary_filter(&with_spice(SpiceLevel::Mild)).spicy, Some(false));
    assert_eq!(matcher.primary_filter(&with_spice(SpiceLevel::Medium)).spicy, None);
    assert_eq!(matcher.primary_filter(&with_spice(SpiceLevel::Hot)).spicy, Some(true));
    assert_eq!(matcher.primary_filter(&with_spice(SpiceLevel::ExtraHot)).spicy, Some(true));
}

#[test]
fn test_unavailable_items_never_match() {
    let matcher = PreferenceMatcher::default();
    let filter = matcher.primary_filter(&CustomerPreferences::default());

    let mut item = create_test_item("Special", MenuCategory::Main, 20.0);
    item.availability = Availability::Unavailable;
    assert!(!filter.matches(&item));

    item.availability = Availability::Limited;
    assert!(!filter.matches(&item));
}

#[test]
fn test_relaxed_filter_keeps_vegetarian_for_vegan_request() {
    let matcher = PreferenceMatcher::default();
    let preferences = CustomerPreferences {
        dietary: DietaryPreferences {
            vegan: true,
            ..DietaryPreferences::default()
        },
        category: Some(MenuCategory::Dessert),
        ..CustomerPreferences::default()
    };

    let relaxed = matcher.relaxed_filter(&preferences);
    assert_eq!(relaxed.vegetarian, Some(true));
    assert_eq!(relaxed.vegan, None);
    assert_eq!(relaxed.category, None);
    assert_eq!(relaxed.availability, Some(Availability::Available));
}

#[test]
fn test_main_history_boosts_main_by_category_weight() {
    // Five mains outrank the appetizer and soup, which push dessert out of the top three
    let mut history: Vec<OrderHistoryEntry> = (0..5).map(|_| history_entry(MenuCategory::Main, 18.0)).collect();
    history.extend((0..3).map(|_| history_entry(MenuCategory::Appetizer, 8.0)));
    history.extend((0..2).map(|_| history_entry(MenuCategory::Soup, 7.0)));
    history.push(history_entry(MenuCategory::Dessert, 6.0));

    let signals = derive_signals(&history).unwrap();
    assert_eq!(signals.top_categories[0], MenuCategory::Main);
    assert!(!signals.top_categories.contains(&MenuCategory::Dessert));

    let weights = ScoringWeights::default();
    let main = create_test_item("Curry", MenuCategory::Main, 12.0);
    let dessert = create_test_item("Curry", MenuCategory::Dessert, 12.0);

    let main_score = calculate_history_score(&main, &signals, &weights).unwrap();
    let dessert_score = calculate_history_score(&dessert, &signals, &weights).unwrap();
    assert!((main_score - dessert_score - 0.3).abs() < 1e-9);
}

#[test]
fn test_ranker_output_is_permutation_of_input() {
    let ranker = HistoryRanker::default();
    let candidates: Vec<MenuItem> = (0..8)
        .map(|i| {
            let category = if i % 2 == 0 { MenuCategory::Main } else { MenuCategory::Side };
            let mut item = create_test_item(&format!("Dish {}", i), category, 5.0 + i as f64 * 3.0);
            item.rating.average = (i % 5) as f64;
            item
        })
        .collect();
    let history = vec![history_entry(MenuCategory::Side, 10.0), history_entry(MenuCategory::Side, 14.0)];

    let ranked = ranker.rank(candidates.clone(), &history);
    assert!(ranked.personalized);

    let mut input_ids: Vec<Uuid> = candidates.iter().map(|c| c.id).collect();
    let mut output_ids: Vec<Uuid> = ranked.candidates.iter().map(|c| c.item.id).collect();
    input_ids.sort();
    output_ids.sort();
    assert_eq!(input_ids, output_ids);

    let scores: Vec<f64> = ranked.candidates.iter().map(|c| c.score.unwrap()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_ranker_does_not_mutate_candidates() {
    let ranker = HistoryRanker::default();
    let candidates = vec![
        create_test_item("A", MenuCategory::Main, 10.0),
        create_test_item("B", MenuCategory::Dessert, 6.0),
    ];
    let history = vec![history_entry(MenuCategory::Dessert, 6.0)];

    let ranked = ranker.rank(candidates.clone(), &history);
    for candidate in &ranked.candidates {
        let original = candidates.iter().find(|c| c.id == candidate.item.id).unwrap();
        assert_eq!(&candidate.item, original);
    }
}
