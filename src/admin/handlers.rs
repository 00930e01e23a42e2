// HTTP handlers for the admin console

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::admin::{
    StoreStatusResponse, UpdateHotelAvailabilityRequest, UpdateStockRequest, UpdateTaxSettingsRequest,
    UpdateTourAvailabilityRequest,
};
use crate::document::{Database, Hotel, MenuItem, TaxSettings, Tour};
use crate::error::{AppError, ErrorResponse};
use crate::AppState;

/// Handler for GET /api/admin/snapshot
/// Returns the whole validated document
#[utoipa::path(
    get,
    path = "/api/admin/snapshot",
    responses(
        (status = 200, description = "Full marketplace document", body = Object),
        (status = 500, description = "Storage or schema failure", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn snapshot_handler(State(state): State<AppState>) -> Result<Json<Database>, AppError> {
    tracing::debug!("Fetching document snapshot");
    Ok(Json(state.admin.snapshot().await?))
}

/// Handler for GET /api/admin/metrics
#[utoipa::path(
    get,
    path = "/api/admin/metrics",
    responses((status = 200, description = "Document store counters", body = StoreStatusResponse)),
    tag = "admin"
)]
pub async fn metrics_handler(State(state): State<AppState>) -> Json<StoreStatusResponse> {
    Json(state.admin.store_status())
}

/// Handler for PUT /api/admin/menu-items/{id}/stock
#[utoipa::path(
    put,
    path = "/api/admin/menu-items/{id}/stock",
    params(("id" = String, Path, description = "Menu item id")),
    request_body = UpdateStockRequest,
    responses(
        (status = 200, description = "Stock updated", body = Object),
        (status = 400, description = "Invalid stock", body = ErrorResponse),
        (status = 404, description = "Menu item not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_stock_handler(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    Json(request): Json<UpdateStockRequest>,
) -> Result<Json<MenuItem>, AppError> {
    request.validate()?;
    Ok(Json(state.admin.update_stock(&item_id, request).await?))
}

/// Handler for PUT /api/admin/hotels/{id}/availability
#[utoipa::path(
    put,
    path = "/api/admin/hotels/{id}/availability",
    params(("id" = String, Path, description = "Hotel id")),
    request_body = UpdateHotelAvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = Object),
        (status = 400, description = "Invalid availability", body = ErrorResponse),
        (status = 404, description = "Hotel not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_hotel_availability_handler(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
    Json(request): Json<UpdateHotelAvailabilityRequest>,
) -> Result<Json<Hotel>, AppError> {
    request.validate()?;
    Ok(Json(state.admin.update_hotel_availability(&hotel_id, request).await?))
}

/// Handler for PUT /api/admin/tours/{id}/availability
#[utoipa::path(
    put,
    path = "/api/admin/tours/{id}/availability",
    params(("id" = String, Path, description = "Tour id")),
    request_body = UpdateTourAvailabilityRequest,
    responses(
        (status = 200, description = "Availability updated", body = Object),
        (status = 404, description = "Tour not found", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_tour_availability_handler(
    State(state): State<AppState>,
    Path(tour_id): Path<String>,
    Json(request): Json<UpdateTourAvailabilityRequest>,
) -> Result<Json<Tour>, AppError> {
    request.validate()?;
    Ok(Json(state.admin.update_tour_availability(&tour_id, request).await?))
}

/// Handler for PUT /api/admin/settings/tax
#[utoipa::path(
    put,
    path = "/api/admin/settings/tax",
    request_body = UpdateTaxSettingsRequest,
    responses(
        (status = 200, description = "Tax rules replaced", body = Object),
        (status = 400, description = "Invalid rates or slabs", body = ErrorResponse)
    ),
    tag = "admin"
)]
pub async fn update_tax_settings_handler(
    State(state): State<AppState>,
    Json(request): Json<UpdateTaxSettingsRequest>,
) -> Result<Json<TaxSettings>, AppError> {
    request.validate()?;
    Ok(Json(state.admin.update_tax_rules(request).await?))
}
