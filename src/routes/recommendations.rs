use crate::core::{MenuFilter, MenuQuery, OrderFilter, OrderQuery, SortField, SortKey};
use crate::error::ApiError;
use crate::models::{
    AnswerResponse, ApiResponse, AskRequest, Availability, EnhancedDescriptionResponse, MenuItem,
    OrderHistoryEntry, RecommendationRequest, RecommendationResponse, RecommendedItem, ScoredCandidate,
};
use crate::routes::{menu::find_item, AppState};
use crate::services::{EnrichmentClient, EnrichmentOutcome};
use actix_web::{web, HttpResponse};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinSet;
use uuid::Uuid;
use validator::Validate;

/// Past orders loaded for a customer when no inline history is sent
const HISTORY_LOOKUP_LIMIT: usize = 20;
/// Dishes handed to the provider as context for a question
const ANSWER_CONTEXT_ITEMS: usize = 10;
const MAX_QUESTION_KEYWORDS: usize = 5;

const STOP_WORDS: &[&str] = &[
    "what", "which", "does", "have", "with", "your", "there", "that", "this", "from", "about", "any", "are",
    "can", "the", "you", "and", "for", "menu", "dish", "dishes", "food", "something", "recommend",
];

/// Configure recommendation and AI routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/recommendations", web::post().to(recommend))
        .route("/ai/enhance-description/{id}", web::post().to(enhance_description))
        .route("/ai/ask", web::post().to(ask));
}

/// POST /api/v1/recommendations
///
/// Request body:
/// ```json
/// {
///   "preferences": {
///     "dietary": { "vegetarian": true },
///     "allergies": ["nuts"],
///     "priceRange": { "min": 10, "max": 25 }
///   },
///   "customerEmail": "guest@example.com",
///   "enhanceDescriptions": false
/// }
/// ```
async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<RecommendationRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();
    if let Some(range) = req.preferences.price_range {
        if let (Some(min), Some(max)) = (range.min, range.max) {
            if min > max {
                return Err(ApiError::field("preferences.priceRange", "min must not exceed max"));
            }
        }
    }

    let history = load_history(&state, &req).await?;
    tracing::info!(
        "Recommending for preferences with {} history entries",
        history.len()
    );

    let recommendation = state
        .recommender
        .recommend(state.catalog.as_ref(), &req.preferences, &history)
        .await?;

    let recommendations = if req.enhance_descriptions {
        enhance_all(state.enrichment.clone(), recommendation.candidates).await
    } else {
        recommendation
            .candidates
            .into_iter()
            .map(|c| RecommendedItem {
                item: c.item,
                score: c.score,
                enhanced_description: None,
                enrichment_outcome: None,
            })
            .collect()
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(RecommendationResponse {
        total: recommendations.len(),
        recommendations,
        relaxed: recommendation.relaxed,
        personalized: recommendation.personalized,
    })))
}

async fn load_history(state: &AppState, req: &RecommendationRequest) -> Result<Vec<OrderHistoryEntry>, ApiError> {
    if !req.order_history.is_empty() {
        return Ok(req.order_history.clone());
    }
    let Some(email) = &req.customer_email else {
        return Ok(Vec::new());
    };

    let query = OrderQuery {
        filter: OrderFilter {
            customer_email: Some(email.trim().to_lowercase()),
            ..OrderFilter::default()
        },
        limit: HISTORY_LOOKUP_LIMIT,
        offset: 0,
    };
    let page = state.orders.find_orders(&query).await?;
    tracing::debug!("Loaded {} past orders for customer history", page.orders.len());

    Ok(page.orders.iter().map(|order| order.history_entry()).collect())
}

/// Enrich every candidate concurrently, keeping ranking order
async fn enhance_all(client: Arc<EnrichmentClient>, candidates: Vec<ScoredCandidate>) -> Vec<RecommendedItem> {
    let mut tasks = JoinSet::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let client = client.clone();
        let name = candidate.item.name.clone();
        let description = candidate.item.description.clone();
        let ingredients = candidate.item.ingredient_names();
        tasks.spawn(async move {
            let result = client.enhance_description(&name, &description, &ingredients).await;
            (index, result)
        });
    }

    let mut enhanced = vec![None; candidates.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => enhanced[index] = Some(result),
            Err(e) => tracing::warn!("Description enhancement task failed: {}", e),
        }
    }

    candidates
        .into_iter()
        .zip(enhanced)
        .map(|(candidate, result)| {
            let (text, outcome) = match result {
                Some(r) => (r.value, r.outcome),
                None => (candidate.item.description.clone(), EnrichmentOutcome::Error),
            };
            RecommendedItem {
                item: candidate.item,
                score: candidate.score,
                enhanced_description: Some(text),
                enrichment_outcome: Some(outcome),
            }
        })
        .collect()
}

/// POST /api/v1/ai/enhance-description/{id}
///
/// The enhanced text is returned only; the stored description is unchanged.
async fn enhance_description(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let item = find_item(&state, id.into_inner()).await?;

    let result = state
        .enrichment
        .enhance_description(&item.name, &item.description, &item.ingredient_names())
        .await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(EnhancedDescriptionResponse {
        id: item.id,
        name: item.name,
        original_description: item.description,
        enhanced_description: result.value,
        outcome: result.outcome,
        fallback_used: result.fallback_used,
    })))
}

/// POST /api/v1/ai/ask
async fn ask(state: web::Data<AppState>, req: web::Json<AskRequest>) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::field("question", "question must not be blank"));
    }

    let context_items = answer_context(&state, question).await?;
    let context = describe_items(&context_items);
    let result = state.enrichment.answer_question(question, &context).await;

    tracing::info!(
        "Answered question with {} context items (outcome {:?})",
        context_items.len(),
        result.outcome
    );

    Ok(HttpResponse::Ok().json(ApiResponse::ok(AnswerResponse {
        question: question.to_string(),
        answer: result.value.text,
        source: result.value.source,
        outcome: result.outcome,
        fallback_used: result.fallback_used,
        context_items: context_items.into_iter().map(|item| item.name).collect(),
    })))
}

/// Significant lowercase words of a question, in order of appearance
pub fn question_keywords(question: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    question
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() >= 3 && !STOP_WORDS.contains(&word.as_str()))
        .filter(|word| seen.insert(word.clone()))
        .take(MAX_QUESTION_KEYWORDS)
        .collect()
}

/// Available dishes matching the question, or the top-rated ones when none match
async fn answer_context(state: &AppState, question: &str) -> Result<Vec<MenuItem>, ApiError> {
    let mut items: Vec<MenuItem> = Vec::new();

    for keyword in question_keywords(question) {
        if items.len() >= ANSWER_CONTEXT_ITEMS {
            break;
        }
        let query = MenuQuery::new(
            MenuFilter::new().availability(Availability::Available).search(&keyword),
            ANSWER_CONTEXT_ITEMS,
        )
        .sorted_by(SortKey::desc(SortField::Rating));

        for item in state.catalog.find_items(&query).await?.items {
            if items.len() < ANSWER_CONTEXT_ITEMS && !items.iter().any(|i| i.id == item.id) {
                items.push(item);
            }
        }
    }

    if items.is_empty() {
        let query = MenuQuery::new(
            MenuFilter::new().availability(Availability::Available),
            ANSWER_CONTEXT_ITEMS,
        )
        .sorted_by(SortKey::desc(SortField::Rating))
        .sorted_by(SortKey::desc(SortField::Popularity));
        items = state.catalog.find_items(&query).await?.items;
    }

    Ok(items)
}

fn describe_items(items: &[MenuItem]) -> String {
    items
        .iter()
        .map(|item| {
            let mut dietary = Vec::new();
            if item.dietary.vegetarian {
                dietary.push("vegetarian");
            }
            if item.dietary.vegan {
                dietary.push("vegan");
            }
            if item.dietary.gluten_free {
                dietary.push("gluten-free");
            }
            if item.dietary.dairy_free {
                dietary.push("dairy-free");
            }
            if item.dietary.spicy {
                dietary.push("spicy");
            }

            let allergens: Vec<&str> = item
                .ingredients
                .iter()
                .flat_map(|i| i.allergens.iter().map(String::as_str))
                .collect();

            format!(
                "- {} ({}, ${:.2}): {} Ingredients: {}. Dietary: {}. Allergens: {}.",
                item.name,
                item.category.as_str(),
                item.price,
                item.description,
                join_or_none(&item.ingredient_names()),
                if dietary.is_empty() { "none".to_string() } else { dietary.join(", ") },
                if allergens.is_empty() { "none".to_string() } else { allergens.join(", ") },
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}
