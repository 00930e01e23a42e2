// Error types for the Business Rules System
// Closed set of rule violations raised by the capacity validators and the
// operational rules engine

use axum::http::StatusCode;
use chrono::NaiveDate;
use thiserror::Error;

/// A rule that a candidate document breaks
///
/// Each variant maps to exactly one wire code (see [`RuleViolation::code`])
/// and one HTTP status (see [`RuleViolation::status_code`]). Route handlers
/// pattern-match on the variant, never on the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// Tour does not exist or is switched off
    #[error("Tour {tour_id} is unavailable")]
    TourUnavailable { tour_id: String },

    #[error("Tour {tour_id} is closed on {date}")]
    TourDateClosed { tour_id: String, date: NaiveDate },

    /// Guests already booked plus the requested guests exceed the date's capacity
    #[error("Tour {tour_id} is full on {date}: {booked} booked + {requested} requested > {capacity}")]
    TourOccupancyFull {
        tour_id: String,
        date: NaiveDate,
        booked: u64,
        requested: u32,
        capacity: u32,
    },

    #[error("Invalid tour booking {booking_id}: {reason}")]
    InvalidTourBookingData { booking_id: String, reason: String },

    #[error("Hotel {hotel_id} is unavailable")]
    HotelUnavailable { hotel_id: String },

    #[error("Room type '{room_type}' is unavailable at hotel {hotel_id}")]
    RoomTypeUnavailable { hotel_id: String, room_type: String },

    /// More guests than the booked rooms can hold
    #[error("{guests} guests exceed the {max_guests} allowed for the booked rooms")]
    HotelRoomCapacityExceeded { guests: u32, max_guests: u32 },

    #[error("Hotel {hotel_id} is closed on {date}")]
    HotelDateClosed { hotel_id: String, date: NaiveDate },

    #[error(
        "No '{room_type}' rooms left at hotel {hotel_id} on {date}: {booked} booked + {requested} requested > {rooms}"
    )]
    HotelOccupancyFull {
        hotel_id: String,
        room_type: String,
        date: NaiveDate,
        booked: u64,
        requested: u32,
        rooms: u32,
    },

    #[error("Invalid hotel booking {booking_id}: {reason}")]
    InvalidHotelBookingData { booking_id: String, reason: String },

    #[error("Invalid stay range: {reason}")]
    InvalidStayRange { reason: String },

    /// Confirming an order would drive a menu item's stock below zero
    #[error("Out of stock for confirmed order: {item_name} ({requested} requested, {available} left)")]
    OutOfStockForConfirmedOrder {
        item_name: String,
        requested: i64,
        available: i64,
    },
}

impl RuleViolation {
    /// Wire code returned to clients in `error_code`
    pub fn code(&self) -> String {
        let code = match self {
            RuleViolation::TourUnavailable { .. } => "TOUR_UNAVAILABLE",
            RuleViolation::TourDateClosed { .. } => "TOUR_DATE_CLOSED",
            RuleViolation::TourOccupancyFull { .. } => "TOUR_OCCUPANCY_FULL",
            RuleViolation::InvalidTourBookingData { .. } => "INVALID_TOUR_BOOKING_DATA",
            RuleViolation::HotelUnavailable { .. } => "HOTEL_UNAVAILABLE",
            RuleViolation::RoomTypeUnavailable { .. } => "ROOM_TYPE_UNAVAILABLE",
            RuleViolation::HotelRoomCapacityExceeded { .. } => "HOTEL_ROOM_CAPACITY_EXCEEDED",
            RuleViolation::HotelDateClosed { .. } => "HOTEL_DATE_CLOSED",
            RuleViolation::HotelOccupancyFull { .. } => "HOTEL_OCCUPANCY_FULL",
            RuleViolation::InvalidHotelBookingData { .. } => "INVALID_HOTEL_BOOKING_DATA",
            RuleViolation::InvalidStayRange { .. } => "INVALID_STAY_RANGE",
            RuleViolation::OutOfStockForConfirmedOrder { item_name, .. } => {
                return format!("OUT_OF_STOCK_FOR_CONFIRMED_ORDER:{}", item_name);
            }
        };
        code.to_string()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RuleViolation::TourUnavailable { .. }
            | RuleViolation::HotelUnavailable { .. }
            | RuleViolation::RoomTypeUnavailable { .. } => StatusCode::NOT_FOUND,

            RuleViolation::TourDateClosed { .. }
            | RuleViolation::TourOccupancyFull { .. }
            | RuleViolation::InvalidTourBookingData { .. }
            | RuleViolation::HotelRoomCapacityExceeded { .. }
            | RuleViolation::HotelDateClosed { .. }
            | RuleViolation::HotelOccupancyFull { .. }
            | RuleViolation::InvalidHotelBookingData { .. }
            | RuleViolation::InvalidStayRange { .. } => StatusCode::BAD_REQUEST,

            RuleViolation::OutOfStockForConfirmedOrder { .. } => StatusCode::CONFLICT,
        }
    }
}

/// Result type alias for rule evaluation
pub type RuleResult<T> = Result<T, RuleViolation>;
