// HTTP handlers for cab and bus booking endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::document::{BusBooking, CabBooking};
use crate::error::{AppError, ErrorResponse};
use crate::orders::UpdateStatusRequest;
use crate::rides::{CreateBusBookingRequest, CreateCabBookingRequest};
use crate::AppState;

/// Handler for POST /api/cabs/bookings
#[utoipa::path(
    post,
    path = "/api/cabs/bookings",
    request_body = CreateCabBookingRequest,
    responses(
        (status = 201, description = "Cab booked", body = Object),
        (status = 400, description = "Invalid ride", body = ErrorResponse),
        (status = 404, description = "Provider not found", body = ErrorResponse)
    ),
    tag = "rides"
)]
pub async fn create_cab_booking_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateCabBookingRequest>,
) -> Result<(StatusCode, Json<CabBooking>), AppError> {
    request.validate()?;
    let booking = state.rides.create_cab_booking(request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Handler for PATCH /api/cabs/bookings/{id}/status
#[utoipa::path(
    patch,
    path = "/api/cabs/bookings/{id}/status",
    params(("id" = String, Path, description = "Cab booking id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Object),
        (status = 400, description = "Invalid status transition", body = ErrorResponse),
        (status = 404, description = "Cab booking not found", body = ErrorResponse)
    ),
    tag = "rides"
)]
pub async fn update_cab_status_handler(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<CabBooking>, AppError> {
    Ok(Json(state.rides.update_cab_status(&booking_id, request.status).await?))
}

/// Handler for POST /api/buses/bookings
#[utoipa::path(
    post,
    path = "/api/buses/bookings",
    request_body = CreateBusBookingRequest,
    responses(
        (status = 201, description = "Seats reserved", body = Object),
        (status = 400, description = "Invalid seat selection", body = ErrorResponse),
        (status = 409, description = "Seat already booked", body = ErrorResponse)
    ),
    tag = "rides"
)]
pub async fn create_bus_booking_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateBusBookingRequest>,
) -> Result<(StatusCode, Json<BusBooking>), AppError> {
    request.validate()?;
    let booking = state.rides.create_bus_booking(request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Handler for PATCH /api/buses/bookings/{id}/status
#[utoipa::path(
    patch,
    path = "/api/buses/bookings/{id}/status",
    params(("id" = String, Path, description = "Bus booking id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Object),
        (status = 400, description = "Invalid status transition", body = ErrorResponse),
        (status = 404, description = "Bus booking not found", body = ErrorResponse)
    ),
    tag = "rides"
)]
pub async fn update_bus_status_handler(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<BusBooking>, AppError> {
    Ok(Json(state.rides.update_bus_status(&booking_id, request.status).await?))
}
