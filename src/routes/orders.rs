use crate::error::ApiError;
use crate::models::{
    ApiResponse, Availability, CreateOrderRequest, FieldError, Order, OrderItem, OrderListQuery, OrderStatus,
    OrderType, Pagination, UpdateOrderStatusRequest,
};
use crate::routes::AppState;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

/// Configure all order routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/orders", web::get().to(list_orders))
        .route("/orders", web::post().to(create_order))
        .route("/orders/{id}", web::get().to(get_order))
        .route("/orders/{id}/status", web::patch().to(update_order_status));
}

/// `ORD-YYYYMMDD-XXXXXX` with six uppercase hex characters
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// POST /api/v1/orders
///
/// Snapshots each referenced menu item into the order, so later menu edits
/// never change what an order says was bought.
async fn create_order(
    state: web::Data<AppState>,
    req: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    let mut problems = Vec::new();
    if req.customer_name.trim().is_empty() {
        problems.push(FieldError {
            field: "customerName".to_string(),
            message: "customerName must not be blank".to_string(),
        });
    }
    if req.order_type == OrderType::DineIn && req.table_number.is_none() {
        problems.push(FieldError {
            field: "tableNumber".to_string(),
            message: "tableNumber is required for dine-in orders".to_string(),
        });
    }

    let mut items = Vec::with_capacity(req.items.len());
    for (index, line) in req.items.iter().enumerate() {
        match state.catalog.get_item(line.menu_item_id).await? {
            None => problems.push(FieldError {
                field: format!("items[{}].menuItemId", index),
                message: format!("menu item {} does not exist", line.menu_item_id),
            }),
            Some(item) if item.availability == Availability::Unavailable => problems.push(FieldError {
                field: format!("items[{}].menuItemId", index),
                message: format!("{} is currently unavailable", item.name),
            }),
            Some(item) => items.push(OrderItem {
                menu_item_id: item.id,
                ingredients: item.ingredient_names(),
                name: item.name,
                category: item.category,
                price: item.price,
                quantity: line.quantity,
                special_instructions: line.special_instructions.clone(),
            }),
        }
    }

    if !problems.is_empty() {
        tracing::info!("Rejected order for {}: {} problem(s)", req.customer_name, problems.len());
        return Err(ApiError::Validation(problems));
    }

    let now = Utc::now();
    let total_amount = round_currency(items.iter().map(OrderItem::line_total).sum());
    let order = Order {
        id: Uuid::new_v4(),
        order_number: generate_order_number(now),
        customer_name: req.customer_name.trim().to_string(),
        customer_email: req.customer_email.map(|e| e.trim().to_lowercase()),
        items,
        order_type: req.order_type,
        status: OrderStatus::Pending,
        table_number: req.table_number,
        notes: req.notes,
        total_amount,
        created_at: now,
        updated_at: now,
    };

    let order = state.orders.insert_order(order).await?;

    // The order is already stored; a failed counter update only skews popularity
    for line in &order.items {
        if let Err(e) = state
            .catalog
            .increment_popularity(line.menu_item_id, line.quantity as u64)
            .await
        {
            tracing::warn!("Failed to bump popularity of {}: {}", line.menu_item_id, e);
        }
    }

    tracing::info!(
        "Created order {} with {} item(s), total {:.2}",
        order.order_number,
        order.items.len(),
        order.total_amount
    );

    Ok(HttpResponse::Created().json(ApiResponse::ok(order)))
}

/// GET /api/v1/orders
async fn list_orders(state: web::Data<AppState>, query: web::Query<OrderListQuery>) -> Result<HttpResponse, ApiError> {
    query.validate()?;
    if let (Some(from), Some(to)) = (query.from, query.to) {
        if from > to {
            return Err(ApiError::field("from", "from must not be after to"));
        }
    }

    let page = query.page_request(state.default_page_limit);
    let result = state
        .orders
        .find_orders(&query.to_order_query(state.default_page_limit))
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::paginated(
        result.orders,
        Pagination::new(page.page, page.limit, result.total),
    )))
}

/// GET /api/v1/orders/{id}
async fn get_order(state: web::Data<AppState>, id: web::Path<Uuid>) -> Result<HttpResponse, ApiError> {
    let order = state
        .orders
        .get_order(id.into_inner())
        .await?
        .ok_or_else(|| ApiError::NotFound("Order".to_string()))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(order)))
}

/// PATCH /api/v1/orders/{id}/status
async fn update_order_status(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    req: web::Json<UpdateOrderStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = id.into_inner();
    let current = state
        .orders
        .get_order(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order".to_string()))?;

    if current.status.is_terminal() && current.status != req.status {
        return Err(ApiError::BadRequest(format!(
            "order is already {} and cannot move to {}",
            current.status.as_str(),
            req.status.as_str()
        )));
    }

    let order = state
        .orders
        .update_status(id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Order".to_string()))?;

    tracing::info!(
        "Order {} moved from {} to {}",
        order.order_number,
        current.status.as_str(),
        order.status.as_str()
    );
    Ok(HttpResponse::Ok().json(ApiResponse::ok(order)))
}
