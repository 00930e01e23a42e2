use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::bookings::{CreateHotelBookingRequest, CreateTourBookingRequest};
use crate::business_rules::pricing::{quote_hotel_stay, quote_tour};
use crate::business_rules::{
    validate_hotel_booking_capacity, validate_tour_booking_capacity, AuditLogger, AuditRecord, QuoteContext,
    RuleViolation,
};
use crate::document::{new_id, Booking, BookingPricing, BookingStatus, BookingType, Contact, Coupon, Database};
use crate::error::AppError;
use crate::jsondb::JsonDb;
use crate::orders::StatusMachine;

/// Service for hotel and tour booking business logic
#[derive(Clone)]
pub struct BookingService {
    db: Arc<JsonDb>,
}

pub(crate) fn find_coupon<'a>(db: &'a Database, code: Option<&str>) -> Result<Option<&'a Coupon>, AppError> {
    match code.map(str::trim).filter(|code| !code.is_empty()) {
        Some(code) => db
            .coupon(code)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Coupon {} does not exist", code))),
        None => Ok(None),
    }
}

/// Count a redemption for the coupon frozen into `pricing`
pub(crate) fn redeem_coupon(db: &mut Database, pricing: &BookingPricing) {
    if let Some(coupon) = pricing.coupon_code.as_deref().and_then(|code| db.coupon_mut(code)) {
        coupon.used_count += 1;
    }
}

fn record_created(db: &mut Database, booking: &Booking) {
    let total = booking.pricing.as_ref().map(|pricing| pricing.total);
    AuditLogger::log(
        db,
        AuditRecord::new("booking_created", "booking", &booking.id).with_details(json!({
            "type": booking.booking_type,
            "itemId": booking.item_id,
            "status": booking.status,
            "total": total,
        })),
    );
}

/// Append a hotel booking to the document
///
/// The capacity check here runs against the candidate document for an early,
/// specific error; the operational rules repeat it at commit.
pub(crate) fn place_hotel_booking(
    db: &mut Database,
    booking_id: &str,
    request: &CreateHotelBookingRequest,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let status = StatusMachine::initial(request.status)?;
    let room_type = request.room_type.trim();

    let hotel = db
        .hotel(&request.hotel_id)
        .filter(|hotel| hotel.available)
        .ok_or_else(|| RuleViolation::HotelUnavailable { hotel_id: request.hotel_id.clone() })?;
    let room = hotel.room_type(room_type).ok_or_else(|| RuleViolation::RoomTypeUnavailable {
        hotel_id: hotel.id.clone(),
        room_type: room_type.to_string(),
    })?;

    let mut booking = Booking {
        id: booking_id.to_string(),
        booking_type: BookingType::Hotel,
        item_id: hotel.id.clone(),
        item_name: Some(hotel.name.clone()),
        status,
        contact: Contact::from(&request.contact),
        check_in: Some(request.check_in),
        check_out: Some(request.check_out),
        room_type: Some(room.room_type.clone()),
        num_rooms: Some(request.num_rooms),
        tour_date: None,
        guests: request.guests,
        pricing: None,
        created_at: now,
        updated_at: None,
    };
    validate_hotel_booking_capacity(db, &booking)?;

    let ctx = QuoteContext::new(&db.settings.tax_rules, now)
        .with_coupon(find_coupon(db, request.coupon_code.as_deref())?)
        .with_billing_state(request.billing_state.as_deref());
    let pricing = quote_hotel_stay(&ctx, room.price, request.num_rooms, request.check_in, request.check_out)?;

    redeem_coupon(db, &pricing);
    booking.pricing = Some(pricing);
    record_created(db, &booking);
    db.bookings.push(booking);
    Ok(())
}

pub(crate) fn place_tour_booking(
    db: &mut Database,
    booking_id: &str,
    request: &CreateTourBookingRequest,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let status = StatusMachine::initial(request.status)?;

    let tour = db
        .tour(&request.tour_id)
        .filter(|tour| tour.available)
        .ok_or_else(|| RuleViolation::TourUnavailable { tour_id: request.tour_id.clone() })?;

    let mut booking = Booking {
        id: booking_id.to_string(),
        booking_type: BookingType::Tour,
        item_id: tour.id.clone(),
        item_name: Some(tour.title.clone()),
        status,
        contact: Contact::from(&request.contact),
        check_in: None,
        check_out: None,
        room_type: None,
        num_rooms: None,
        tour_date: Some(request.tour_date),
        guests: request.guests,
        pricing: None,
        created_at: now,
        updated_at: None,
    };
    validate_tour_booking_capacity(db, &booking)?;

    let ctx = QuoteContext::new(&db.settings.tax_rules, now)
        .with_coupon(find_coupon(db, request.coupon_code.as_deref())?)
        .with_billing_state(request.billing_state.as_deref());
    let pricing = quote_tour(&ctx, tour.price, request.guests)?;

    redeem_coupon(db, &pricing);
    booking.pricing = Some(pricing);
    record_created(db, &booking);
    db.bookings.push(booking);
    Ok(())
}

pub(crate) fn change_booking_status(db: &mut Database, booking_id: &str, status: BookingStatus) -> Result<(), AppError> {
    let booking = db
        .booking_mut(booking_id)
        .ok_or_else(|| AppError::not_found("Booking", booking_id))?;
    let from = booking.status;
    booking.status = StatusMachine::transition(from, status)?;
    if from == status {
        return Ok(());
    }
    booking.updated_at = Some(Utc::now());
    AuditLogger::log_status_change(db, "booking", booking_id, from.as_str(), status.as_str());
    Ok(())
}

impl BookingService {
    pub fn new(db: Arc<JsonDb>) -> Self {
        Self { db }
    }

    async fn commit<F>(&self, label: &str, booking_id: &str, mutator: F) -> Result<Booking, AppError>
    where
        F: FnOnce(&mut Database) -> Result<(), AppError> + Send,
    {
        let db = self.db.mutate_data(Some(label), mutator).await?;
        db.booking(booking_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Booking", booking_id))
    }

    /// Book rooms at a hotel
    ///
    /// # Validation
    /// - Hotel must exist and be available; the room type must exist
    /// - Stay length within the hotel's min/max nights, guests within room capacity
    /// - No closed night in the stay and, for room types with a room count,
    ///   enough free rooms on every night
    pub async fn create_hotel_booking(&self, request: CreateHotelBookingRequest) -> Result<Booking, AppError> {
        let booking_id = new_id("book");
        let now = Utc::now();
        let booking = self
            .commit("booking_hotel", &booking_id, |db| place_hotel_booking(db, &booking_id, &request, now))
            .await?;
        tracing::info!(booking_id = %booking.id, hotel_id = %booking.item_id, "hotel booking created");
        Ok(booking)
    }

    /// Book places on a tour date
    pub async fn create_tour_booking(&self, request: CreateTourBookingRequest) -> Result<Booking, AppError> {
        let booking_id = new_id("book");
        let now = Utc::now();
        let booking = self
            .commit("booking_tour", &booking_id, |db| place_tour_booking(db, &booking_id, &request, now))
            .await?;
        tracing::info!(booking_id = %booking.id, tour_id = %booking.item_id, "tour booking created");
        Ok(booking)
    }

    pub async fn get_booking(&self, booking_id: &str) -> Result<Booking, AppError> {
        let db = self.db.read_data().await?;
        db.booking(booking_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Booking", booking_id))
    }

    /// Change a booking's status; cancelling frees its capacity
    pub async fn update_status(&self, booking_id: &str, status: BookingStatus) -> Result<Booking, AppError> {
        self.commit("booking_status", booking_id, |db| change_booking_status(db, booking_id, status))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookings::ContactRequest;
    use crate::document::{Hotel, HotelAvailability, RoomType, Tour, TourAvailability};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::{BTreeMap, BTreeSet};

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn document() -> Database {
        Database {
            hotels: vec![Hotel {
                id: "hotel_h1".into(),
                name: "Lake View".into(),
                location: None,
                room_types: vec![RoomType { room_type: "Deluxe".into(), price: dec!(3000), capacity: 2 }],
                available: true,
                availability: HotelAvailability {
                    closed_dates: BTreeSet::new(),
                    rooms_by_type: BTreeMap::from([("Deluxe".to_string(), 1)]),
                },
                min_nights: None,
                max_nights: None,
                amenities: vec![],
            }],
            tours: vec![Tour {
                id: "tour_t1".into(),
                title: "Tea Trail".into(),
                location: None,
                price: dec!(1500),
                duration: None,
                max_guests: Some(4),
                available: true,
                availability: TourAvailability::default(),
                images: vec![],
            }],
            ..Database::default()
        }
    }

    fn contact() -> ContactRequest {
        ContactRequest { customer_name: "Asha".into(), phone: None, email: None, user_id: None }
    }

    fn hotel_request() -> CreateHotelBookingRequest {
        CreateHotelBookingRequest {
            hotel_id: "hotel_h1".into(),
            room_type: "Deluxe".into(),
            check_in: date(3, 10),
            check_out: date(3, 12),
            num_rooms: 1,
            guests: 2,
            contact: contact(),
            coupon_code: None,
            billing_state: None,
            status: Some(BookingStatus::Confirmed),
        }
    }

    fn tour_request(guests: u32) -> CreateTourBookingRequest {
        CreateTourBookingRequest {
            tour_id: "tour_t1".into(),
            tour_date: date(4, 1),
            guests,
            contact: contact(),
            coupon_code: None,
            billing_state: None,
            status: None,
        }
    }

    #[test]
    fn test_hotel_booking_priced_by_slab() {
        let mut db = document();
        place_hotel_booking(&mut db, "book_1", &hotel_request(), Utc::now()).unwrap();

        let booking = db.booking("book_1").unwrap();
        assert_eq!(booking.item_name.as_deref(), Some("Lake View"));
        let pricing = booking.pricing.as_ref().unwrap();
        assert_eq!(pricing.nights, Some(2));
        assert_eq!(pricing.base_amount, dec!(6000));
        assert_eq!(pricing.tax.gst_rate, dec!(0.12));
        assert_eq!(pricing.total, dec!(6720));
        assert_eq!(db.audit_log[0].action, "booking_created");
    }

    #[test]
    fn test_hotel_precheck_rejects_full_room_type() {
        let mut db = document();
        place_hotel_booking(&mut db, "book_1", &hotel_request(), Utc::now()).unwrap();
        let err = place_hotel_booking(&mut db, "book_2", &hotel_request(), Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "HOTEL_OCCUPANCY_FULL");
        assert_eq!(db.bookings.len(), 1);
    }

    #[test]
    fn test_unknown_room_type() {
        let mut db = document();
        let mut request = hotel_request();
        request.room_type = "Suite".into();
        let err = place_hotel_booking(&mut db, "book_1", &request, Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "ROOM_TYPE_UNAVAILABLE");
    }

    #[test]
    fn test_inverted_stay_is_rejected_before_pricing() {
        let mut db = document();
        let mut request = hotel_request();
        request.check_out = date(3, 9);
        let err = place_hotel_booking(&mut db, "book_1", &request, Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STAY_RANGE");
    }

    #[test]
    fn test_tour_booking_and_capacity() {
        let mut db = document();
        place_tour_booking(&mut db, "book_1", &tour_request(3), Utc::now()).unwrap();
        let pricing = db.booking("book_1").unwrap().pricing.clone().unwrap();
        assert_eq!(pricing.base_amount, dec!(4500));
        assert_eq!(pricing.total, dec!(4725));

        let err = place_tour_booking(&mut db, "book_2", &tour_request(2), Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "TOUR_OCCUPANCY_FULL");
    }

    #[test]
    fn test_unavailable_tour() {
        let mut db = document();
        db.tours[0].available = false;
        let err = place_tour_booking(&mut db, "book_1", &tour_request(1), Utc::now()).unwrap_err();
        assert_eq!(err.error_code(), "TOUR_UNAVAILABLE");
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_change_booking_status() {
        let mut db = document();
        place_tour_booking(&mut db, "book_1", &tour_request(1), Utc::now()).unwrap();
        change_booking_status(&mut db, "book_1", BookingStatus::Cancelled).unwrap();
        assert_eq!(db.booking("book_1").unwrap().status, BookingStatus::Cancelled);

        let err = change_booking_status(&mut db, "book_1", BookingStatus::Confirmed).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
    }
}
