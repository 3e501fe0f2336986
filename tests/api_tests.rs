// HTTP tests for the dinewise REST surface, backed by the in-memory store

use actix_web::{http::StatusCode, test, web, App};
use chrono::Utc;
use dinewise::core::Recommender;
use dinewise::models::{Availability, DietaryInfo, Ingredient, MenuCategory, MenuItem, Rating};
use dinewise::routes::{self, AppState};
use dinewise::services::enrichment::FALLBACK_ANSWER;
use dinewise::services::{AnalyticsCache, AnalyticsService, EnrichmentClient, EnrichmentConfig, InMemoryStore};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

fn create_test_item(name: &str, category: MenuCategory, price: f64, vegetarian: bool) -> MenuItem {
    MenuItem {
        id: Uuid::new_v4(),
        name: name.to_string(),
        description: format!("Our {}", name.to_lowercase()),
        category,
        price,
        ingredients: vec![Ingredient {
            name: "Tomato".to_string(),
            category: Some("vegetable".to_string()),
            allergens: vec![],
        }],
        dietary: DietaryInfo {
            vegetarian,
            ..DietaryInfo::default()
        },
        availability: Availability::Available,
        rating: Rating { average: 4.0, count: 2 },
        popularity: 0,
        tags: vec!["house".to_string()],
        preparation_time: Some(20),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn app_state(store: Arc<InMemoryStore>, enrichment: EnrichmentConfig) -> AppState {
    let cache = Arc::new(AnalyticsCache::new(100, 300));
    AppState {
        catalog: store.clone(),
        orders: store.clone(),
        analytics: Arc::new(AnalyticsService::new(store.clone(), store, cache)),
        enrichment: Arc::new(EnrichmentClient::new(enrichment).unwrap()),
        recommender: Arc::new(Recommender::default()),
        default_page_limit: 20,
        store_kind: "memory",
    }
}

macro_rules! init_app {
    ($store:expr) => {
        init_app!($store, EnrichmentConfig::default())
    };
    ($store:expr, $enrichment:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(app_state($store, $enrichment)))
                .configure(routes::configure_app),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_reports_memory_store() {
    let app = init_app!(Arc::new(InMemoryStore::new()));

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
    assert_eq!(body["enrichmentConfigured"], false);
}

#[actix_web::test]
async fn test_menu_listing_is_paginated() {
    let store = Arc::new(InMemoryStore::with_items(vec![
        create_test_item("Margherita", MenuCategory::Main, 11.0, true),
        create_test_item("Caprese", MenuCategory::Salad, 9.0, true),
        create_test_item("Meatballs", MenuCategory::Main, 14.0, false),
    ]));
    let app = init_app!(store);

    let req = test::TestRequest::get()
        .uri("/api/v1/menu?vegetarian=true&sortBy=price&limit=1&page=2")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"][0]["name"], "Margherita");
    assert_eq!(body["pagination"], json!({"page": 2, "limit": 1, "total": 2, "pages": 2}));
}

#[actix_web::test]
async fn test_create_menu_item_and_duplicate_conflict() {
    let app = init_app!(Arc::new(InMemoryStore::new()));
    let payload = json!({
        "name": "Shakshuka",
        "description": "Eggs poached in spiced tomato sauce",
        "category": "main",
        "price": 12.5,
        "ingredients": [{"name": "Egg", "allergens": ["eggs"]}],
        "dietary": {"vegetarian": true, "glutenFree": true}
    });

    let req = test::TestRequest::post().uri("/api/v1/menu").set_json(&payload).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["availability"], "available");
    assert_eq!(body["data"]["dietary"]["glutenFree"], true);

    let req = test::TestRequest::post().uri("/api/v1/menu").set_json(&payload).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn test_validation_errors_carry_field_details() {
    let app = init_app!(Arc::new(InMemoryStore::new()));

    let req = test::TestRequest::post()
        .uri("/api/v1/menu")
        .set_json(json!({"name": "", "category": "main", "price": -1.0}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Validation failed");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"price"));
}

#[actix_web::test]
async fn test_validation_details_use_request_field_names() {
    let item = create_test_item("Ramen", MenuCategory::Main, 12.5, false);
    let id = item.id;
    let app = init_app!(Arc::new(InMemoryStore::with_items(vec![item])));

    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .set_json(json!({
            "customerName": "Ada",
            "customerEmail": "bad",
            "orderType": "takeout",
            "items": [{"menuItemId": id, "quantity": 1}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"][0]["field"], "customerEmail");

    let req = test::TestRequest::get().uri("/api/v1/menu?minPrice=-1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"][0]["field"], "minPrice");
}

#[actix_web::test]
async fn test_malformed_input_is_rejected_as_bad_request() {
    let app = init_app!(Arc::new(InMemoryStore::new()));

    let req = test::TestRequest::post()
        .uri("/api/v1/menu")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/v1/menu/not-a-uuid").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get().uri("/api/v1/analytics/sales?groupBy=year").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_unknown_menu_item_is_not_found() {
    let app = init_app!(Arc::new(InMemoryStore::new()));

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/menu/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Menu item not found");
}

#[actix_web::test]
async fn test_rating_updates_running_average() {
    let item = create_test_item("Gnocchi", MenuCategory::Main, 13.0, true);
    let id = item.id;
    let app = init_app!(Arc::new(InMemoryStore::with_items(vec![item])));

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/menu/{}/rate", id))
        .set_json(json!({"rating": 5}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    // (4.0 * 2 + 5) / 3
    let average = body["data"]["rating"]["average"].as_f64().unwrap();
    assert!((average - 13.0 / 3.0).abs() < 1e-9);
    assert_eq!(body["data"]["rating"]["count"], 3);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/menu/{}/rate", id))
        .set_json(json!({"rating": 6}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_order_lifecycle() {
    let item = create_test_item("Ramen", MenuCategory::Main, 12.5, false);
    let id = item.id;
    let app = init_app!(Arc::new(InMemoryStore::with_items(vec![item])));

    // Dine-in without a table is rejected
    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .set_json(json!({
            "customerName": "Ada",
            "orderType": "dine-in",
            "items": [{"menuItemId": id, "quantity": 2}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"][0]["field"], "tableNumber");

    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .set_json(json!({
            "customerName": "Ada",
            "customerEmail": "ada@example.com",
            "orderType": "dine-in",
            "tableNumber": 7,
            "items": [{"menuItemId": id, "quantity": 2}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let order = &body["data"];
    assert_eq!(order["status"], "pending");
    assert_eq!(order["totalAmount"], 25.0);
    assert_eq!(order["items"][0]["name"], "Ramen");
    assert!(order["orderNumber"].as_str().unwrap().starts_with("ORD-"));
    let order_id = order["id"].as_str().unwrap().to_string();

    // Popularity grows by the ordered quantity
    let req = test::TestRequest::get().uri(&format!("/api/v1/menu/{}", id)).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["popularity"], 2);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/orders/{}/status", order_id))
        .set_json(json!({"status": "delivered"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Delivered is terminal
    let req = test::TestRequest::patch()
        .uri(&format!("/api/v1/orders/{}/status", order_id))
        .set_json(json!({"status": "pending"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/v1/orders?customerEmail=ada@example.com")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["status"], "delivered");
}

#[actix_web::test]
async fn test_order_with_unavailable_item_is_rejected() {
    let mut item = create_test_item("Seasonal Pie", MenuCategory::Dessert, 7.0, true);
    item.availability = Availability::Unavailable;
    let id = item.id;
    let app = init_app!(Arc::new(InMemoryStore::with_items(vec![item])));

    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .set_json(json!({
            "customerName": "Ada",
            "orderType": "takeout",
            "items": [{"menuItemId": id, "quantity": 1}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["details"][0]["field"], "items[0].menuItemId");
}

#[actix_web::test]
async fn test_recommendations_without_enrichment_key() {
    let store = Arc::new(InMemoryStore::with_items(vec![
        create_test_item("Halloumi Burger", MenuCategory::Main, 18.99, true),
        create_test_item("Chicken Wrap", MenuCategory::Main, 15.00, false),
    ]));
    let app = init_app!(store);

    let req = test::TestRequest::post()
        .uri("/api/v1/recommendations")
        .set_json(json!({
            "preferences": {"dietary": {"vegetarian": true}, "priceRange": {"min": 10, "max": 25}},
            "enhanceDescriptions": true
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let data = &body["data"];
    assert_eq!(data["total"], 1);
    assert_eq!(data["relaxed"], false);
    assert_eq!(data["personalized"], false);
    let first = &data["recommendations"][0];
    assert_eq!(first["name"], "Halloumi Burger");
    assert_eq!(first["enhancedDescription"], first["description"]);
    assert_eq!(first["enrichmentOutcome"], "short_circuit");
}

#[actix_web::test]
async fn test_ai_endpoints_fall_back_without_key() {
    let item = create_test_item("Minestrone", MenuCategory::Soup, 6.5, true);
    let id = item.id;
    let app = init_app!(Arc::new(InMemoryStore::with_items(vec![item])));

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/ai/enhance-description/{}", id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["enhancedDescription"], "Our minestrone");
    assert_eq!(body["data"]["fallbackUsed"], true);

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/ask")
        .set_json(json!({"question": "Is the minestrone vegetarian?"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["answer"], FALLBACK_ANSWER);
    assert_eq!(body["data"]["source"], "fallback");
    assert_eq!(body["data"]["contextItems"], json!(["Minestrone"]));
}

#[actix_web::test]
async fn test_ask_uses_provider_when_configured() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Yes, it is vegetarian."}}]}"#)
        .create_async()
        .await;

    let store = Arc::new(InMemoryStore::with_items(vec![create_test_item(
        "Minestrone",
        MenuCategory::Soup,
        6.5,
        true,
    )]));
    let enrichment = EnrichmentConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.url(),
        ..EnrichmentConfig::default()
    };
    let app = init_app!(store, enrichment);

    let req = test::TestRequest::post()
        .uri("/api/v1/ai/ask")
        .set_json(json!({"question": "Is the minestrone vegetarian?"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["data"]["answer"], "Yes, it is vegetarian.");
    assert_eq!(body["data"]["source"], "ai");
    assert_eq!(body["data"]["outcome"], "success");
}

#[actix_web::test]
async fn test_analytics_payloads_are_cached() {
    let item = create_test_item("Bibimbap", MenuCategory::Main, 14.0, true);
    let id = item.id;
    let app = init_app!(Arc::new(InMemoryStore::with_items(vec![item])));

    let req = test::TestRequest::get().uri("/api/v1/analytics/dashboard").to_request();
    let first = test::call_and_read_body(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .set_json(json!({
            "customerName": "Grace",
            "orderType": "takeout",
            "items": [{"menuItemId": id, "quantity": 1}]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Within the window the new order is not visible
    let req = test::TestRequest::get().uri("/api/v1/analytics/dashboard").to_request();
    let second = test::call_and_read_body(&app, req).await;
    assert_eq!(first, second);

    let body: Value = serde_json::from_slice(&second).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["totalOrders"], 0);
    assert_eq!(body["data"]["menuItemCount"], 1);

    // Other aggregates are computed independently
    let req = test::TestRequest::get()
        .uri("/api/v1/analytics/order-breakdown?by=orderType")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["groupBy"], "orderType");
    assert_eq!(body["data"]["buckets"][0]["key"], "takeout");
}
