// Status-bearing records: hotel/tour bookings, food orders, cab and bus bookings

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::dates;

/// Lifecycle status shared by bookings and orders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            "completed" => Ok(BookingStatus::Completed),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }

    /// Counts toward occupancy (everything except cancelled)
    pub fn is_active(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    /// Counts toward inventory consumption
    pub fn is_consuming(&self) -> bool {
        matches!(self, BookingStatus::Confirmed | BookingStatus::Completed)
    }
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Pending
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    Hotel,
    Tour,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingType::Hotel => "hotel",
            BookingType::Tour => "tour",
        }
    }
}

/// Contact details captured on every booking and order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Contact {
    /// Stable key used to aggregate a customer's history
    pub fn identity_key(&self) -> Option<String> {
        if let Some(user_id) = self.user_id.as_deref().filter(|id| !id.trim().is_empty()) {
            return Some(user_id.trim().to_string());
        }
        if let Some(phone) = self.phone.as_deref() {
            let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
            if !digits.is_empty() {
                return Some(format!("phone:{}", digits));
            }
        }
        self.email
            .as_deref()
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .map(|email| format!("email:{}", email))
    }
}

/// GST breakdown frozen into a record at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakup {
    pub gst_rate: Decimal,
    pub taxable_value: Decimal,
    pub gst_amount: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
}

/// Price snapshot stored in a record's `pricing` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPricing {
    pub base_amount: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub tax: TaxBreakup,
    pub total: Decimal,
    #[serde(default)]
    pub nights: Option<i64>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

/// Hotel or tour booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    pub item_id: String,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(flatten)]
    pub contact: Contact,
    #[serde(default, with = "dates::option_day")]
    pub check_in: Option<NaiveDate>,
    #[serde(default, with = "dates::option_day")]
    pub check_out: Option<NaiveDate>,
    #[serde(default)]
    pub room_type: Option<String>,
    #[serde(default)]
    pub num_rooms: Option<u32>,
    #[serde(default, with = "dates::option_day")]
    pub tour_date: Option<NaiveDate>,
    #[serde(default)]
    pub guests: u32,
    #[serde(default)]
    pub pricing: Option<BookingPricing>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Rooms held by this booking; legacy rows without a count hold one room
    pub fn rooms_held(&self) -> u32 {
        self.num_rooms.unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FoodOrderItem {
    #[serde(default)]
    pub menu_item_id: Option<String>,
    pub name: String,
    #[validate(range(min = 1))]
    pub quantity: u32,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FoodOrder {
    #[validate(length(min = 1))]
    pub id: String,
    pub restaurant_id: String,
    #[serde(flatten)]
    pub contact: Contact,
    #[serde(default)]
    pub items: Vec<FoodOrderItem>,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub pricing: Option<BookingPricing>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CabBooking {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(flatten)]
    pub contact: Contact,
    pub pickup_location: String,
    pub drop_location: String,
    #[serde(default, with = "dates::option_day")]
    pub ride_date: Option<NaiveDate>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub distance_km: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub fare: Decimal,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub pricing: Option<BookingPricing>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BusBooking {
    #[validate(length(min = 1))]
    pub id: String,
    pub route_id: String,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(with = "dates::day")]
    pub travel_date: NaiveDate,
    #[serde(default)]
    pub seats: Vec<String>,
    #[serde(flatten)]
    pub contact: Contact,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub fare_per_seat: Decimal,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub pricing: Option<BookingPricing>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
