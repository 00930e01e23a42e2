use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::document::{BookingStatus, Contact};

/// Customer details shared by every booking request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Asha")]
    pub customer_name: String,
    #[validate(custom = "crate::validation::validate_phone")]
    #[schema(example = "+919876543210")]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub user_id: Option<String>,
}

impl From<&ContactRequest> for Contact {
    fn from(request: &ContactRequest) -> Self {
        Contact {
            user_id: request.user_id.clone(),
            customer_name: request.customer_name.trim().to_string(),
            email: request.email.clone(),
            phone: request.phone.clone(),
        }
    }
}

fn one() -> u32 {
    1
}

/// Request DTO for POST /api/bookings/hotel
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHotelBookingRequest {
    #[validate(length(min = 1, message = "hotelId is required"))]
    #[schema(example = "hotel_backwater")]
    pub hotel_id: String,
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Deluxe")]
    pub room_type: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "one")]
    #[validate(range(min = 1, max = 50, message = "numRooms must be between 1 and 50"))]
    pub num_rooms: u32,
    #[validate(range(min = 1, max = 100, message = "guests must be between 1 and 100"))]
    pub guests: u32,
    #[serde(flatten)]
    #[validate]
    pub contact: ContactRequest,
    pub coupon_code: Option<String>,
    pub billing_state: Option<String>,
    pub status: Option<BookingStatus>,
}

/// Request DTO for POST /api/bookings/tour
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTourBookingRequest {
    #[validate(length(min = 1, message = "tourId is required"))]
    #[schema(example = "tour_munnar")]
    pub tour_id: String,
    pub tour_date: NaiveDate,
    #[validate(range(min = 1, max = 100, message = "guests must be between 1 and 100"))]
    pub guests: u32,
    #[serde(flatten)]
    #[validate]
    pub contact: ContactRequest,
    pub coupon_code: Option<String>,
    pub billing_state: Option<String>,
    pub status: Option<BookingStatus>,
}
