use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

use crate::bookings::service::{find_coupon, redeem_coupon};
use crate::business_rules::pricing::{quote_ride, round_money};
use crate::business_rules::{AuditLogger, AuditRecord, QuoteContext, ServiceKind};
use crate::document::{new_id, BookingStatus, BusBooking, CabBooking, Contact, Database};
use crate::error::AppError;
use crate::jsondb::JsonDb;
use crate::orders::StatusMachine;
use crate::rides::{normalize_seat, CreateBusBookingRequest, CreateCabBookingRequest};

/// Service for cab and bus bookings
#[derive(Clone)]
pub struct RideService {
    db: Arc<JsonDb>,
}

/// Fare for a cab ride: the quoted fare, else the provider's base fare plus distance
fn resolve_cab_fare(db: &Database, request: &CreateCabBookingRequest) -> Result<Decimal, AppError> {
    let provider = match request.provider_id.as_deref() {
        Some(id) => Some(
            db.cab_provider(id)
                .filter(|provider| provider.active)
                .ok_or_else(|| AppError::not_found("Cab provider", id))?,
        ),
        None => None,
    };

    if let (Some(provider), Some(vehicle)) = (provider, request.vehicle_type.as_deref()) {
        if !provider.vehicle_types.is_empty()
            && !provider.vehicle_types.iter().any(|offered| offered.eq_ignore_ascii_case(vehicle.trim()))
        {
            return Err(AppError::Validation(format!("{} does not offer {} rides", provider.name, vehicle)));
        }
    }

    if let Some(fare) = request.fare {
        return Ok(fare);
    }
    let metered = provider.and_then(|provider| {
        let distance = request.distance_km?;
        Some(provider.base_fare.unwrap_or(Decimal::ZERO) + provider.per_km? * distance)
    });
    metered
        .map(round_money)
        .ok_or_else(|| AppError::Validation("A fare, or a distance with a metered provider, is required".to_string()))
}

pub(crate) fn place_cab_booking(
    db: &mut Database,
    booking_id: &str,
    request: &CreateCabBookingRequest,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let status = StatusMachine::initial(request.status)?;
    let fare = resolve_cab_fare(db, request)?;

    let ctx = QuoteContext::new(&db.settings.tax_rules, now)
        .with_coupon(find_coupon(db, request.coupon_code.as_deref())?)
        .with_billing_state(request.billing_state.as_deref());
    let pricing = quote_ride(&ctx, ServiceKind::Cab, fare, 1)?;
    redeem_coupon(db, &pricing);

    let total = pricing.total;
    db.cab_bookings.push(CabBooking {
        id: booking_id.to_string(),
        provider_id: request.provider_id.clone(),
        contact: Contact::from(&request.contact),
        pickup_location: request.pickup_location.trim().to_string(),
        drop_location: request.drop_location.trim().to_string(),
        ride_date: request.ride_date,
        vehicle_type: request.vehicle_type.clone(),
        distance_km: request.distance_km,
        fare,
        status,
        pricing: Some(pricing),
        created_at: now,
        updated_at: None,
    });
    AuditLogger::log(
        db,
        AuditRecord::new("cab_booking_created", "cab_booking", booking_id)
            .with_details(json!({ "status": status, "total": total })),
    );
    Ok(())
}

/// Seats of active bookings on the same route and date
fn held_seats(db: &Database, route_id: &str, travel_date: chrono::NaiveDate) -> HashSet<String> {
    db.bus_bookings
        .iter()
        .filter(|booking| {
            booking.route_id == route_id && booking.travel_date == travel_date && booking.status.is_active()
        })
        .flat_map(|booking| booking.seats.iter().map(|seat| normalize_seat(seat)))
        .collect()
}

pub(crate) fn place_bus_booking(
    db: &mut Database,
    booking_id: &str,
    request: &CreateBusBookingRequest,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let status = StatusMachine::initial(request.status)?;
    let seats = request.normalized_seats();

    let mut requested = HashSet::new();
    if let Some(seat) = seats.iter().find(|seat| !requested.insert(seat.as_str())) {
        return Err(AppError::Validation(format!("Seat {} is listed twice", seat)));
    }

    let held = held_seats(db, &request.route_id, request.travel_date);
    if let Some(seat) = seats.iter().find(|seat| held.contains(seat.as_str())) {
        return Err(AppError::conflict(
            "SEAT_ALREADY_BOOKED",
            format!("Seat {} on {} is already booked for {}", seat, request.route_id, request.travel_date),
        ));
    }

    let ctx = QuoteContext::new(&db.settings.tax_rules, now)
        .with_coupon(find_coupon(db, request.coupon_code.as_deref())?)
        .with_billing_state(request.billing_state.as_deref());
    let units = u32::try_from(seats.len()).map_err(|_| AppError::Validation("Too many seats".to_string()))?;
    let pricing = quote_ride(&ctx, ServiceKind::Bus, request.fare_per_seat, units)?;
    redeem_coupon(db, &pricing);

    let total = pricing.total;
    db.bus_bookings.push(BusBooking {
        id: booking_id.to_string(),
        route_id: request.route_id.clone(),
        operator: request.operator.clone(),
        travel_date: request.travel_date,
        seats: seats.clone(),
        contact: Contact::from(&request.contact),
        fare_per_seat: request.fare_per_seat,
        status,
        pricing: Some(pricing),
        created_at: now,
        updated_at: None,
    });
    AuditLogger::log(
        db,
        AuditRecord::new("bus_booking_created", "bus_booking", booking_id)
            .with_details(json!({ "routeId": request.route_id, "seats": seats, "total": total })),
    );
    Ok(())
}

pub(crate) fn change_cab_status(db: &mut Database, booking_id: &str, status: BookingStatus) -> Result<(), AppError> {
    let booking = db
        .cab_booking_mut(booking_id)
        .ok_or_else(|| AppError::not_found("Cab booking", booking_id))?;
    let from = booking.status;
    booking.status = StatusMachine::transition(from, status)?;
    if from != status {
        booking.updated_at = Some(Utc::now());
        AuditLogger::log_status_change(db, "cab_booking", booking_id, from.as_str(), status.as_str());
    }
    Ok(())
}

pub(crate) fn change_bus_status(db: &mut Database, booking_id: &str, status: BookingStatus) -> Result<(), AppError> {
    let booking = db
        .bus_booking_mut(booking_id)
        .ok_or_else(|| AppError::not_found("Bus booking", booking_id))?;
    let from = booking.status;
    booking.status = StatusMachine::transition(from, status)?;
    if from != status {
        booking.updated_at = Some(Utc::now());
        AuditLogger::log_status_change(db, "bus_booking", booking_id, from.as_str(), status.as_str());
    }
    Ok(())
}

impl RideService {
    pub fn new(db: Arc<JsonDb>) -> Self {
        Self { db }
    }

    pub async fn create_cab_booking(&self, request: CreateCabBookingRequest) -> Result<CabBooking, AppError> {
        let booking_id = new_id("cab");
        let now = Utc::now();
        let db = self
            .db
            .mutate_data(Some("cab_booking_create"), |db| place_cab_booking(db, &booking_id, &request, now))
            .await?;
        let booking = db
            .cab_booking(&booking_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("cab booking {} missing after commit", booking_id)))?;
        tracing::info!(booking_id = %booking.id, fare = %booking.fare, "cab booking created");
        Ok(booking)
    }

    pub async fn update_cab_status(&self, booking_id: &str, status: BookingStatus) -> Result<CabBooking, AppError> {
        let db = self
            .db
            .mutate_data(Some("cab_booking_status"), |db| change_cab_status(db, booking_id, status))
            .await?;
        db.cab_booking(booking_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Cab booking", booking_id))
    }

    /// Reserve bus seats
    ///
    /// Seats already held by an active booking on the same route and date
    /// are rejected with `SEAT_ALREADY_BOOKED` (409).
    pub async fn create_bus_booking(&self, request: CreateBusBookingRequest) -> Result<BusBooking, AppError> {
        let booking_id = new_id("bus");
        let now = Utc::now();
        let db = self
            .db
            .mutate_data(Some("bus_booking_create"), |db| place_bus_booking(db, &booking_id, &request, now))
            .await?;
        let booking = db
            .bus_booking(&booking_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("bus booking {} missing after commit", booking_id)))?;
        tracing::info!(booking_id = %booking.id, seats = booking.seats.len(), "bus booking created");
        Ok(booking)
    }

    pub async fn update_bus_status(&self, booking_id: &str, status: BookingStatus) -> Result<BusBooking, AppError> {
        let db = self
            .db
            .mutate_data(Some("bus_booking_status"), |db| change_bus_status(db, booking_id, status))
            .await?;
        db.bus_booking(booking_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Bus booking", booking_id))
    }
}
