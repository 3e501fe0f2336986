// Integration tests for the recommendation pipeline over the in-memory store

use chrono::Utc;
use dinewise::core::{MenuFilter, MenuQuery, PreferenceMatcher, Recommender, SortField, SortKey};
use dinewise::models::{
    Availability, CustomerPreferences, DietaryInfo, DietaryPreferences, HistoryItem, Ingredient, MenuCategory,
    MenuItem, OrderHistoryEntry, PriceRange, Rating,
};
use dinewise::services::{CatalogStore, InMemoryStore};
use uuid::Uuid;

fn create_test_item(name: &str, category: MenuCategory, price: f64, vegetarian: bool, rating: f64) -> MenuItem {
    MenuItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("House {}", name.to_lowercase()),
        category,
        price,
        ingredients: vec![Ingredient {
            name: "Salt".to_string(),
            category: None,
            allergens: vec![],
        }],
        dietary: DietaryInfo {
            vegetarian,
            ..DietaryInfo::default()
        },
        availability: Availability::Available,
        rating: Rating { average: rating, count: 4 },
        popularity: 0,
        tags: vec![],
        preparation_time: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn vegetarian_in_range() -> CustomerPreferences {
    CustomerPreferences {
        dietary: DietaryPreferences {
            vegetarian: true,
            ..DietaryPreferences::default()
        },
        price_range: Some(PriceRange {
            min: Some(10.0),
            max: Some(25.0),
        }),
        ..CustomerPreferences::default()
    }
}

#[tokio::test]
async fn test_vegetarian_price_range_returns_only_vegetarian_item() {
    let store = InMemoryStore::with_items(vec![
        create_test_item("Halloumi Burger", MenuCategory::Main, 18.99, true, 4.0),
        create_test_item("Chicken Wrap", MenuCategory::Main, 15.00, false, 4.5),
    ]);

    let outcome = PreferenceMatcher::default()
        .find_candidates(&store, &vegetarian_in_range())
        .await
        .unwrap();

    assert!(!outcome.relaxed);
    assert_eq!(outcome.items.len(), 1);
    assert_eq!(outcome.items[0].name, "Halloumi Burger");
}

#[tokio::test]
async fn test_unsatisfiable_preferences_fall_back_to_relaxed_filter() {
    let store = InMemoryStore::with_items(vec![
        create_test_item("Veggie Soup", MenuCategory::Soup, 6.0, true, 3.5),
        create_test_item("Garden Salad", MenuCategory::Salad, 8.0, true, 4.8),
        create_test_item("Steak", MenuCategory::Main, 30.0, false, 5.0),
    ]);

    // No vegetarian dessert exists
    let preferences = CustomerPreferences {
        category: Some(MenuCategory::Dessert),
        ..vegetarian_in_range()
    };

    let outcome = PreferenceMatcher::default()
        .find_candidates(&store, &preferences)
        .await
        .unwrap();

    assert!(outcome.relaxed);
    let names: Vec<&str> = outcome.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Garden Salad", "Veggie Soup"]);
}

#[tokio::test]
async fn test_empty_after_relaxation_is_not_an_error() {
    let store = InMemoryStore::with_items(vec![create_test_item("Steak", MenuCategory::Main, 30.0, false, 5.0)]);

    let outcome = PreferenceMatcher::default()
        .find_candidates(&store, &vegetarian_in_range())
        .await
        .unwrap();

    assert!(outcome.relaxed);
    assert!(outcome.items.is_empty());
}

#[tokio::test]
async fn test_matcher_is_idempotent() {
    let items: Vec<MenuItem> = (0..15)
        .map(|i| create_test_item(&format!("Dish {:02}", i), MenuCategory::Main, 10.0 + i as f64, i % 2 == 0, (i % 5) as f64))
        .collect();
    let store = InMemoryStore::with_items(items);
    let matcher = PreferenceMatcher::default();
    let preferences = CustomerPreferences::default();

    let first = matcher.find_candidates(&store, &preferences).await.unwrap();
    let second = matcher.find_candidates(&store, &preferences).await.unwrap();

    let ids = |items: &[MenuItem]| items.iter().map(|i| i.id).collect::<Vec<_>>();
    assert_eq!(ids(&first.items), ids(&second.items));
    assert_eq!(first.items.len(), matcher.max_candidates());
}

#[tokio::test]
async fn test_candidates_ordered_by_rating_then_popularity() {
    let mut popular = create_test_item("Popular", MenuCategory::Main, 12.0, false, 4.0);
    popular.popularity = 40;
    let quiet = create_test_item("Quiet", MenuCategory::Main, 12.0, false, 4.0);
    let best = create_test_item("Best", MenuCategory::Main, 12.0, false, 4.9);

    let store = InMemoryStore::with_items(vec![quiet, popular, best]);
    let outcome = PreferenceMatcher::default()
        .find_candidates(&store, &CustomerPreferences::default())
        .await
        .unwrap();

    let names: Vec<&str> = outcome.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Best", "Popular", "Quiet"]);
}

#[tokio::test]
async fn test_recommender_personalizes_with_history() {
    let store = InMemoryStore::with_items(vec![
        create_test_item("Tiramisu", MenuCategory::Dessert, 8.0, true, 4.5),
        create_test_item("Pad Thai", MenuCategory::Main, 14.0, false, 4.2),
    ]);
    let history: Vec<OrderHistoryEntry> = (0..3)
        .map(|_| OrderHistoryEntry {
            items: vec![HistoryItem {
                name: Some("Green Curry".to_string()),
                category: MenuCategory::Main,
                ingredients: vec!["salt".to_string()],
                price: 13.0,
            }],
        })
        .collect();

    let recommendation = Recommender::default()
        .recommend(&store, &CustomerPreferences::default(), &history)
        .await
        .unwrap();

    assert!(recommendation.personalized);
    assert!(!recommendation.relaxed);
    assert_eq!(recommendation.candidates[0].item.name, "Pad Thai");
    assert!(recommendation.candidates.iter().all(|c| c.score.is_some()));
}

#[tokio::test]
async fn test_recommender_without_history_keeps_matcher_order() {
    let store = InMemoryStore::with_items(vec![
        create_test_item("Tiramisu", MenuCategory::Dessert, 8.0, true, 4.5),
        create_test_item("Pad Thai", MenuCategory::Main, 14.0, false, 4.2),
    ]);

    let recommendation = Recommender::default()
        .recommend(&store, &CustomerPreferences::default(), &[])
        .await
        .unwrap();

    assert!(!recommendation.personalized);
    assert_eq!(recommendation.candidates[0].item.name, "Tiramisu");
    assert!(recommendation.candidates.iter().all(|c| c.score.is_none()));
}

#[tokio::test]
async fn test_store_search_and_paging() {
    let store = InMemoryStore::with_items(vec![
        create_test_item("Mushroom Risotto", MenuCategory::Main, 16.0, true, 4.1),
        create_test_item("Mushroom Soup", MenuCategory::Soup, 7.0, true, 3.9),
        create_test_item("Fish Tacos", MenuCategory::Main, 13.0, false, 4.4),
    ]);

    let query = MenuQuery::new(MenuFilter::new().search("MUSHROOM"), 1).sorted_by(SortKey::asc(SortField::Price));
    let page = store.find_items(&query).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Mushroom Soup");

    let next = store.find_items(&query.clone().offset(1)).await.unwrap();
    assert_eq!(next.items[0].name, "Mushroom Risotto");
}

#[test]
fn test_deleted_item_is_no_longer_matched() {
    let item = create_test_item("Paella", MenuCategory::Main, 22.0, false, 4.7);
    let id = item.id;
    let store = InMemoryStore::with_items(vec![item]);

    let deleted = tokio_test::block_on(store.delete_item(id));
    assert!(tokio_test::assert_ok!(deleted));

    let outcome = tokio_test::block_on(PreferenceMatcher::default().find_candidates(&store, &CustomerPreferences::default()));
    let outcome = tokio_test::assert_ok!(outcome);
    assert!(outcome.items.is_empty());
    assert!(!tokio_test::assert_ok!(tokio_test::block_on(store.delete_item(id))));
}
