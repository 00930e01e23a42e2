// HTTP handlers for food order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::document::FoodOrder;
use crate::error::{AppError, ErrorResponse};
use crate::orders::{CreateFoodOrderRequest, UpdateStatusRequest};
use crate::AppState;

/// Handler for POST /api/food/orders
#[utoipa::path(
    post,
    path = "/api/food/orders",
    request_body = CreateFoodOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = Object),
        (status = 400, description = "Invalid order", body = ErrorResponse),
        (status = 404, description = "Restaurant or menu item not found", body = ErrorResponse),
        (status = 409, description = "Out of stock for a confirmed order", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "food"
)]
pub async fn create_food_order_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateFoodOrderRequest>,
) -> Result<(StatusCode, Json<FoodOrder>), AppError> {
    request.validate()?;
    let order = state.orders.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Handler for GET /api/food/orders/{id}
#[utoipa::path(
    get,
    path = "/api/food/orders/{id}",
    params(("id" = String, Path, description = "Food order id")),
    responses(
        (status = 200, description = "Order found", body = Object),
        (status = 404, description = "Order not found", body = ErrorResponse)
    ),
    tag = "food"
)]
pub async fn get_food_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
) -> Result<Json<FoodOrder>, AppError> {
    Ok(Json(state.orders.get_order(&order_id).await?))
}

/// Handler for PATCH /api/food/orders/{id}/status
#[utoipa::path(
    patch,
    path = "/api/food/orders/{id}/status",
    params(("id" = String, Path, description = "Food order id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Object),
        (status = 400, description = "Invalid status transition", body = ErrorResponse),
        (status = 404, description = "Order not found", body = ErrorResponse),
        (status = 409, description = "Out of stock for a confirmed order", body = ErrorResponse)
    ),
    tag = "food"
)]
pub async fn update_food_order_status_handler(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<FoodOrder>, AppError> {
    let order = state.orders.update_status(&order_id, request.status).await?;
    Ok(Json(order))
}
