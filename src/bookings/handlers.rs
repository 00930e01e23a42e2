// HTTP handlers for hotel and tour booking endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::bookings::{CreateHotelBookingRequest, CreateTourBookingRequest};
use crate::document::Booking;
use crate::error::{AppError, ErrorResponse};
use crate::orders::UpdateStatusRequest;
use crate::AppState;

/// Handler for POST /api/bookings/hotel
#[utoipa::path(
    post,
    path = "/api/bookings/hotel",
    request_body = CreateHotelBookingRequest,
    responses(
        (status = 201, description = "Hotel booking created", body = Object),
        (status = 400, description = "Invalid stay or no rooms left", body = ErrorResponse),
        (status = 404, description = "Hotel or room type unavailable", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn create_hotel_booking_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateHotelBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    request.validate()?;
    let booking = state.bookings.create_hotel_booking(request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Handler for POST /api/bookings/tour
#[utoipa::path(
    post,
    path = "/api/bookings/tour",
    request_body = CreateTourBookingRequest,
    responses(
        (status = 201, description = "Tour booking created", body = Object),
        (status = 400, description = "Date closed or tour full", body = ErrorResponse),
        (status = 404, description = "Tour unavailable", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn create_tour_booking_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateTourBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    request.validate()?;
    let booking = state.bookings.create_tour_booking(request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Handler for GET /api/bookings/{id}
#[utoipa::path(
    get,
    path = "/api/bookings/{id}",
    params(("id" = String, Path, description = "Booking id")),
    responses(
        (status = 200, description = "Booking found", body = Object),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn get_booking_handler(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.bookings.get_booking(&booking_id).await?))
}

/// Handler for PATCH /api/bookings/{id}/status
#[utoipa::path(
    patch,
    path = "/api/bookings/{id}/status",
    params(("id" = String, Path, description = "Booking id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Object),
        (status = 400, description = "Invalid transition or capacity exceeded", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn update_booking_status_handler(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.bookings.update_status(&booking_id, request.status).await?;
    Ok(Json(booking))
}
