// Document model
// The whole marketplace dataset as one in-memory aggregate, plus the
// canonical schema check run on every read and before every write

pub mod catalog;
pub mod dates;
pub mod platform;
pub mod transactions;

pub use catalog::*;
pub use platform::*;
pub use transactions::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

/// Aggregate root loaded wholesale by the document store adapter
///
/// `Clone` produces a structurally independent copy; the adapter relies on
/// this to keep the pre-mutation snapshot intact while the mutator works on
/// the loaded document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub tours: Vec<Tour>,
    #[serde(default)]
    pub hotels: Vec<Hotel>,
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    /// Flat menu item list; the only place stock is tracked
    #[serde(default)]
    pub menu_items: Vec<MenuItem>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub cab_bookings: Vec<CabBooking>,
    #[serde(default)]
    pub bus_bookings: Vec<BusBooking>,
    #[serde(default)]
    pub food_orders: Vec<FoodOrder>,
    #[serde(default)]
    pub queries: Vec<SupportQuery>,
    #[serde(default)]
    pub audit_log: Vec<AuditEntry>,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    #[serde(default)]
    pub service_areas: Vec<ServiceArea>,
    #[serde(default)]
    pub cab_providers: Vec<CabProvider>,
    #[serde(default)]
    pub user_profiles: Vec<UserProfile>,
    #[serde(default)]
    pub behavior_profiles: Vec<BehaviorProfile>,
    #[serde(default)]
    pub analytics_events: Vec<AnalyticsEvent>,
    #[serde(default)]
    pub site_pages: Vec<SitePage>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub policies: Policies,
    #[serde(default)]
    pub payment: PaymentSettings,
}

impl Database {
    pub fn tour(&self, id: &str) -> Option<&Tour> {
        self.tours.iter().find(|tour| tour.id == id)
    }

    pub fn tour_mut(&mut self, id: &str) -> Option<&mut Tour> {
        self.tours.iter_mut().find(|tour| tour.id == id)
    }

    pub fn hotel(&self, id: &str) -> Option<&Hotel> {
        self.hotels.iter().find(|hotel| hotel.id == id)
    }

    pub fn hotel_mut(&mut self, id: &str) -> Option<&mut Hotel> {
        self.hotels.iter_mut().find(|hotel| hotel.id == id)
    }

    pub fn restaurant(&self, id: &str) -> Option<&Restaurant> {
        self.restaurants.iter().find(|restaurant| restaurant.id == id)
    }

    pub fn menu_item(&self, id: &str) -> Option<&MenuItem> {
        self.menu_items.iter().find(|item| item.id == id)
    }

    pub fn menu_item_mut(&mut self, id: &str) -> Option<&mut MenuItem> {
        self.menu_items.iter_mut().find(|item| item.id == id)
    }

    pub fn booking(&self, id: &str) -> Option<&Booking> {
        self.bookings.iter().find(|booking| booking.id == id)
    }

    pub fn booking_mut(&mut self, id: &str) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|booking| booking.id == id)
    }

    pub fn food_order(&self, id: &str) -> Option<&FoodOrder> {
        self.food_orders.iter().find(|order| order.id == id)
    }

    pub fn food_order_mut(&mut self, id: &str) -> Option<&mut FoodOrder> {
        self.food_orders.iter_mut().find(|order| order.id == id)
    }

    pub fn cab_booking(&self, id: &str) -> Option<&CabBooking> {
        self.cab_bookings.iter().find(|booking| booking.id == id)
    }

    pub fn cab_booking_mut(&mut self, id: &str) -> Option<&mut CabBooking> {
        self.cab_bookings.iter_mut().find(|booking| booking.id == id)
    }

    pub fn bus_booking(&self, id: &str) -> Option<&BusBooking> {
        self.bus_bookings.iter().find(|booking| booking.id == id)
    }

    pub fn bus_booking_mut(&mut self, id: &str) -> Option<&mut BusBooking> {
        self.bus_bookings.iter_mut().find(|booking| booking.id == id)
    }

    pub fn cab_provider(&self, id: &str) -> Option<&CabProvider> {
        self.cab_providers.iter().find(|provider| provider.id == id)
    }

    pub fn coupon(&self, code: &str) -> Option<&Coupon> {
        self.coupons
            .iter()
            .find(|coupon| coupon.code.eq_ignore_ascii_case(code.trim()))
    }

    pub fn coupon_mut(&mut self, code: &str) -> Option<&mut Coupon> {
        self.coupons
            .iter_mut()
            .find(|coupon| coupon.code.eq_ignore_ascii_case(code.trim()))
    }

    /// Menu items that belong to a restaurant, in stored order
    pub fn menu_for<'a>(&'a self, restaurant_id: &'a str) -> impl Iterator<Item = &'a MenuItem> + 'a {
        self.menu_items
            .iter()
            .filter(move |item| item.restaurant_id.as_deref() == Some(restaurant_id))
    }
}

/// Generate a type-prefixed identifier such as `book_4f1c…`
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// A record that fails the canonical schema
#[derive(Debug, Clone, PartialEq, Error)]
#[error("schema violation in {collection}/{id}: {message}")]
pub struct SchemaError {
    pub collection: String,
    pub id: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(collection: &str, id: &str, message: impl Into<String>) -> Self {
        Self {
            collection: collection.to_string(),
            id: id.to_string(),
            message: message.into(),
        }
    }
}

fn check<T: Validate>(collection: &str, id: &str, record: &T) -> Result<(), SchemaError> {
    record
        .validate()
        .map_err(|errors| SchemaError::new(collection, id, errors.to_string()))
}

fn check_unique<'a>(
    collection: &str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SchemaError::new(collection, id, "duplicate id"));
        }
    }
    Ok(())
}

/// Validate the whole document against the canonical schema
///
/// Field-level rules come from each record's `Validate` derive; on top of
/// that ids must be unique per collection and type-specific booking fields
/// must be well formed. The first violation is returned.
pub fn validate_document(db: &Database) -> Result<(), SchemaError> {
    check_unique("tours", db.tours.iter().map(|t| t.id.as_str()))?;
    check_unique("hotels", db.hotels.iter().map(|h| h.id.as_str()))?;
    check_unique("restaurants", db.restaurants.iter().map(|r| r.id.as_str()))?;
    check_unique("menuItems", db.menu_items.iter().map(|m| m.id.as_str()))?;
    check_unique("bookings", db.bookings.iter().map(|b| b.id.as_str()))?;
    check_unique("cabBookings", db.cab_bookings.iter().map(|b| b.id.as_str()))?;
    check_unique("busBookings", db.bus_bookings.iter().map(|b| b.id.as_str()))?;
    check_unique("foodOrders", db.food_orders.iter().map(|o| o.id.as_str()))?;
    check_unique("coupons", db.coupons.iter().map(|c| c.code.as_str()))?;
    check_unique("sitePages", db.site_pages.iter().map(|p| p.slug.as_str()))?;
    check_unique("auditLog", db.audit_log.iter().map(|a| a.id.as_str()))?;

    for tour in &db.tours {
        check("tours", &tour.id, tour)?;
    }
    for hotel in &db.hotels {
        check("hotels", &hotel.id, hotel)?;
        for room in &hotel.room_types {
            check("hotels", &hotel.id, room)?;
        }
    }
    for restaurant in &db.restaurants {
        check("restaurants", &restaurant.id, restaurant)?;
    }
    for item in &db.menu_items {
        check("menuItems", &item.id, item)?;
    }
    for booking in &db.bookings {
        check("bookings", &booking.id, booking)?;
        validate_booking_shape(booking)?;
    }
    for order in &db.food_orders {
        check("foodOrders", &order.id, order)?;
        for line in &order.items {
            check("foodOrders", &order.id, line)?;
        }
    }
    for booking in &db.cab_bookings {
        check("cabBookings", &booking.id, booking)?;
    }
    for booking in &db.bus_bookings {
        check("busBookings", &booking.id, booking)?;
    }
    for coupon in &db.coupons {
        check("coupons", &coupon.code, coupon)?;
    }
    for provider in &db.cab_providers {
        check("cabProviders", &provider.id, provider)?;
    }
    for slab in &db.settings.tax_rules.hotel_slabs {
        check("settings", &db.settings.id, slab)?;
    }
    Ok(())
}

// Structural shape only; capacity is the rules engine's concern
fn validate_booking_shape(booking: &Booking) -> Result<(), SchemaError> {
    match booking.booking_type {
        BookingType::Hotel => {
            if booking.check_in.is_none() || booking.check_out.is_none() {
                return Err(SchemaError::new(
                    "bookings",
                    &booking.id,
                    "hotel booking requires checkIn and checkOut",
                ));
            }
            if booking.room_type.as_deref().map_or(true, |r| r.trim().is_empty()) {
                return Err(SchemaError::new("bookings", &booking.id, "hotel booking requires roomType"));
            }
        }
        BookingType::Tour => {
            if booking.tour_date.is_none() {
                return Err(SchemaError::new("bookings", &booking.id, "tour booking requires tourDate"));
            }
        }
    }
    Ok(())
}
