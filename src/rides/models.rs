use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::bookings::ContactRequest;
use crate::document::BookingStatus;

/// Request DTO for POST /api/cabs/bookings
///
/// Either `fare` is given, or the provider's base fare and per-km rate price
/// `distanceKm`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCabBookingRequest {
    #[schema(example = "cab_kochi_taxi")]
    pub provider_id: Option<String>,
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Ernakulam South")]
    pub pickup_location: String,
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Fort Kochi")]
    pub drop_location: String,
    pub ride_date: Option<NaiveDate>,
    #[schema(example = "sedan")]
    pub vehicle_type: Option<String>,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    #[schema(value_type = Option<String>, example = "12.5")]
    pub distance_km: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    #[schema(value_type = Option<String>, example = "450")]
    pub fare: Option<Decimal>,
    #[serde(flatten)]
    #[validate]
    pub contact: ContactRequest,
    pub coupon_code: Option<String>,
    pub billing_state: Option<String>,
    pub status: Option<BookingStatus>,
}

fn validate_seat_list(seats: &Vec<String>) -> Result<(), ValidationError> {
    if seats.iter().any(|seat| seat.trim().is_empty()) {
        return Err(ValidationError::new("blank_seat"));
    }
    Ok(())
}

/// Request DTO for POST /api/buses/bookings
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusBookingRequest {
    #[validate(length(min = 1, message = "routeId is required"))]
    #[schema(example = "route_kochi_bangalore")]
    pub route_id: String,
    pub operator: Option<String>,
    pub travel_date: NaiveDate,
    #[validate(length(min = 1, message = "At least one seat is required"), custom = "validate_seat_list")]
    #[schema(example = json!(["4A", "4B"]))]
    pub seats: Vec<String>,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    #[schema(value_type = String, example = "899")]
    pub fare_per_seat: Decimal,
    #[serde(flatten)]
    #[validate]
    pub contact: ContactRequest,
    pub coupon_code: Option<String>,
    pub billing_state: Option<String>,
    pub status: Option<BookingStatus>,
}

impl CreateBusBookingRequest {
    /// Seat labels trimmed and upper-cased, in request order
    pub fn normalized_seats(&self) -> Vec<String> {
        self.seats.iter().map(|seat| normalize_seat(seat)).collect()
    }
}

pub fn normalize_seat(seat: &str) -> String {
    seat.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bus_request(seats: serde_json::Value) -> CreateBusBookingRequest {
        serde_json::from_value(json!({
            "routeId": "route_r1",
            "travelDate": "2026-05-01",
            "seats": seats,
            "farePerSeat": "500",
            "customerName": "Asha"
        }))
        .unwrap()
    }

    #[test]
    fn test_bus_request_validation() {
        assert!(bus_request(json!(["4a", " 4B "])).validate().is_ok());
        assert!(bus_request(json!([])).validate().is_err());
        assert!(bus_request(json!(["4A", " "])).validate().is_err());
    }

    #[test]
    fn test_normalized_seats() {
        assert_eq!(bus_request(json!(["4a", " 4B "])).normalized_seats(), vec!["4A", "4B"]);
    }

    #[test]
    fn test_cab_request_rejects_negative_fare() {
        let request: CreateCabBookingRequest = serde_json::from_value(json!({
            "pickupLocation": "A",
            "dropLocation": "B",
            "fare": "-1",
            "customerName": "Asha"
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
