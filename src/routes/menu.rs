use crate::error::ApiError;
use crate::models::{
    ApiResponse, CreateMenuItemRequest, MenuItem, MenuListQuery, Pagination, RateMenuItemRequest,
    UpdateMenuItemRequest,
};
use crate::routes::AppState;
use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

/// Configure all menu routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/menu", web::get().to(list_menu))
        .route("/menu", web::post().to(create_menu_item))
        .route("/menu/{id}", web::get().to(get_menu_item))
        .route("/menu/{id}", web::put().to(update_menu_item))
        .route("/menu/{id}", web::delete().to(delete_menu_item))
        .route("/menu/{id}/rate", web::post().to(rate_menu_item));
}

/// GET /api/v1/menu
async fn list_menu(state: web::Data<AppState>, query: web::Query<MenuListQuery>) -> Result<HttpResponse, ApiError> {
    query.validate()?;
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(ApiError::field("minPrice", "minPrice must not exceed maxPrice"));
        }
    }

    let page = query.page_request(state.default_page_limit);
    let menu_query = query.to_menu_query(state.default_page_limit);
    let result = state.catalog.find_items(&menu_query).await?;

    tracing::debug!("Menu listing returned {} of {} items", result.items.len(), result.total);

    Ok(HttpResponse::Ok().json(ApiResponse::paginated(
        result.items,
        Pagination::new(page.page, page.limit, result.total),
    )))
}

/// GET /api/v1/menu/{id}
async fn get_menu_item(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let item = find_item(&state, id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(item)))
}

/// POST /api/v1/menu
async fn create_menu_item(
    state: web::Data<AppState>,
    req: web::Json<CreateMenuItemRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();
    if req.name.trim().is_empty() {
        return Err(ApiError::field("name", "name must not be blank"));
    }
    if let Some(index) = req.ingredients.iter().position(|i| i.name.trim().is_empty()) {
        return Err(ApiError::field(
            format!("ingredients[{}].name", index),
            "ingredient name is required",
        ));
    }

    let item = state.catalog.insert_item(req.into()).await?;
    tracing::info!("Created menu item {} ({})", item.name, item.id);

    Ok(HttpResponse::Created().json(ApiResponse::ok(item)))
}

/// PUT /api/v1/menu/{id}
async fn update_menu_item(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: web::Json<UpdateMenuItemRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let id = id.into_inner();
    let req = req.into_inner();
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ApiError::field("name", "name must not be blank"));
    }

    let item = state
        .catalog
        .update_item(id, req.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Menu item".to_string()))?;

    tracing::info!("Updated menu item {}", id);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(item)))
}

/// DELETE /api/v1/menu/{id}
async fn delete_menu_item(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    if !state.catalog.delete_item(id).await? {
        return Err(ApiError::NotFound("Menu item".to_string()));
    }

    tracing::info!("Deleted menu item {}", id);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({ "id": id }))))
}

/// POST /api/v1/menu/{id}/rate
async fn rate_menu_item(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: web::Json<RateMenuItemRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let id = id.into_inner();

    let item = state
        .catalog
        .record_rating(id, req.rating)
        .await?
        .ok_or_else(|| ApiError::NotFound("Menu item".to_string()))?;

    tracing::debug!(
        "Rated menu item {}: average {:.2} over {} ratings",
        id,
        item.rating.average,
        item.rating.count
    );
    Ok(HttpResponse::Ok().json(ApiResponse::ok(item)))
}

pub(crate) async fn find_item(state: &AppState, id: Uuid) -> Result<MenuItem, ApiError> {
    state
        .catalog
        .get_item(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Menu item".to_string()))
}
