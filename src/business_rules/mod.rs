// Business Rules System Module
//
// Inventory-consistency rules for the marketplace document:
// - Pricing: GST breakdowns, hotel tax slabs, coupons and quotes
// - Availability: tour and hotel capacity validators
// - Inventory: food stock reconciliation driven by order status
// - Audit: append-only audit entries written inside the same mutation
//
// `apply_operational_rules` ties the validators and the stock reconciliation
// together and is run by the document store on every rule-checked mutation.

pub mod error;
pub mod types;
pub mod availability;
pub mod pricing;
pub mod inventory;
pub mod audit;

// Re-export commonly used types for convenience
pub use error::{RuleResult, RuleViolation};
pub use types::{DiscountType, ServiceKind};
pub use availability::{
    enumerate_dates,
    ranges_overlap,
    validate_booking_capacity,
    validate_hotel_booking_capacity,
    validate_tour_booking_capacity,
};
pub use pricing::{compute_gst, days_between, hotel_gst_rate, QuoteContext};
pub use audit::{AuditLogger, AuditRecord};

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::document::{Booking, BookingStatus, BookingType, Database};

/// Fields whose change can affect occupancy
#[derive(Debug, PartialEq, Eq)]
struct OccupancyFingerprint<'a> {
    booking_type: BookingType,
    item_id: &'a str,
    status: BookingStatus,
    guests: u32,
    room_type: Option<&'a str>,
    num_rooms: Option<u32>,
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    tour_date: Option<NaiveDate>,
}

impl<'a> From<&'a Booking> for OccupancyFingerprint<'a> {
    fn from(booking: &'a Booking) -> Self {
        Self {
            booking_type: booking.booking_type,
            item_id: &booking.item_id,
            status: booking.status,
            guests: booking.guests,
            room_type: booking.room_type.as_deref(),
            num_rooms: booking.num_rooms,
            check_in: booking.check_in,
            check_out: booking.check_out,
            tour_date: booking.tour_date,
        }
    }
}

/// Ids of bookings created or changed in an occupancy-relevant way, in `after` order
pub fn changed_booking_ids(before: &Database, after: &Database) -> Vec<String> {
    let previous: HashMap<&str, OccupancyFingerprint<'_>> = before
        .bookings
        .iter()
        .map(|booking| (booking.id.as_str(), OccupancyFingerprint::from(booking)))
        .collect();

    after
        .bookings
        .iter()
        .filter(|booking| previous.get(booking.id.as_str()) != Some(&OccupancyFingerprint::from(*booking)))
        .map(|booking| booking.id.clone())
        .collect()
}

/// Enforce cross-record invariants on a mutated document
///
/// 1. Reconcile food stock from the change in consuming orders, failing when
///    stock would go negative, then refresh `available` for touched items.
/// 2. Re-run the capacity validator for every changed booking that is still
///    active, against the whole of `after`.
///
/// `before` is only read. `after` may have menu item stock and availability
/// adjusted even when an error is returned; callers discard it in that case.
pub fn apply_operational_rules(before: &Database, after: &mut Database) -> RuleResult<()> {
    inventory::reconcile_stock(before, after)?;
    inventory::refresh_availability(before, after);

    let changed = changed_booking_ids(before, after);
    for id in &changed {
        let Some(booking) = after.booking(id) else {
            continue;
        };
        if !booking.status.is_active() {
            continue;
        }
        validate_booking_capacity(after, booking)?;
    }

    if !changed.is_empty() {
        tracing::debug!(changed = changed.len(), "booking capacity re-validated");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        Contact, FoodOrder, FoodOrderItem, Hotel, HotelAvailability, MenuItem, RoomType,
    };
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::{BTreeMap, BTreeSet};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn hotel_db() -> Database {
        Database {
            hotels: vec![Hotel {
                id: "hotel_h1".into(),
                name: "H1".into(),
                location: None,
                room_types: vec![RoomType { room_type: "Deluxe".into(), price: dec!(3200), capacity: 2 }],
                available: true,
                availability: HotelAvailability {
                    closed_dates: BTreeSet::new(),
                    rooms_by_type: BTreeMap::from([("Deluxe".to_string(), 1)]),
                },
                min_nights: None,
                max_nights: None,
                amenities: vec![],
            }],
            ..Database::default()
        }
    }

    fn booking(id: &str, status: BookingStatus) -> Booking {
        Booking {
            id: id.into(),
            booking_type: BookingType::Hotel,
            item_id: "hotel_h1".into(),
            item_name: None,
            status,
            contact: Contact::default(),
            check_in: Some(day(10)),
            check_out: Some(day(12)),
            room_type: Some("Deluxe".into()),
            num_rooms: Some(1),
            tour_date: None,
            guests: 2,
            pricing: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_changed_booking_ids_ignores_cosmetic_edits() {
        let before = Database { bookings: vec![booking("b1", BookingStatus::Pending)], ..Database::default() };
        let mut after = before.clone();
        after.bookings[0].contact.customer_name = "Renamed".into();
        after.bookings[0].updated_at = Some(Utc::now());
        assert!(changed_booking_ids(&before, &after).is_empty());

        after.bookings[0].status = BookingStatus::Confirmed;
        after.bookings.push(booking("b2", BookingStatus::Pending));
        assert_eq!(changed_booking_ids(&before, &after), vec!["b1".to_string(), "b2".to_string()]);
    }

    #[test]
    fn test_new_overbooking_is_rejected() {
        let mut before = hotel_db();
        before.bookings.push(booking("b1", BookingStatus::Confirmed));
        let mut after = before.clone();
        after.bookings.push(booking("b2", BookingStatus::Pending));

        let err = apply_operational_rules(&before, &mut after).unwrap_err();
        assert_eq!(err.code(), "HOTEL_OCCUPANCY_FULL");
    }

    #[test]
    fn test_cancelled_changes_skip_validation() {
        // Historical overbooking stays untouched unless a booking changes
        let mut before = hotel_db();
        before.bookings.push(booking("b1", BookingStatus::Confirmed));
        before.bookings.push(booking("b2", BookingStatus::Confirmed));

        let mut after = before.clone();
        after.bookings[1].status = BookingStatus::Cancelled;
        assert!(apply_operational_rules(&before, &mut after).is_ok());
    }

    #[test]
    fn test_before_is_never_mutated() {
        let before = Database {
            menu_items: vec![MenuItem {
                id: "food_m1".into(),
                restaurant_id: None,
                name: "M1".into(),
                price: dec!(50),
                stock: Some(3),
                max_per_order: None,
                available: true,
                category: None,
            }],
            ..Database::default()
        };
        let snapshot = before.clone();
        let mut after = before.clone();
        after.food_orders.push(FoodOrder {
            id: "food_o1".into(),
            restaurant_id: "rest_1".into(),
            contact: Contact::default(),
            items: vec![FoodOrderItem {
                menu_item_id: Some("food_m1".into()),
                name: "M1".into(),
                quantity: 2,
                price: dec!(50),
            }],
            status: BookingStatus::Confirmed,
            delivery_address: None,
            pricing: None,
            created_at: Utc::now(),
            updated_at: None,
        });

        apply_operational_rules(&before, &mut after).unwrap();
        assert_eq!(before, snapshot);
        assert_eq!(after.menu_items[0].stock, Some(1));
    }
}
