// Availability / Capacity Validators
//
// Pure checks of a single booking against the full document it lives in.
// Occupancy is always recomputed from every other active booking, so the same
// functions serve as route-level pre-checks and as the post-mutation
// re-validation run by the operational rules engine.

use chrono::NaiveDate;

use crate::business_rules::error::{RuleResult, RuleViolation};
use crate::business_rules::pricing::days_between;
use crate::document::{Booking, BookingType, Database};

/// Half-open ranges `[a_start, a_end)` and `[b_start, b_end)` share at least one day
pub fn ranges_overlap(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start < b_end && b_start < a_end
}

/// Every day in `[start, end)`; empty when `end <= start`
pub fn enumerate_dates(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|day| *day < end).collect()
}

/// Run the capacity validator matching the booking's type
pub fn validate_booking_capacity(db: &Database, booking: &Booking) -> RuleResult<()> {
    match booking.booking_type {
        BookingType::Hotel => validate_hotel_booking_capacity(db, booking),
        BookingType::Tour => validate_tour_booking_capacity(db, booking),
    }
}

/// Check an active tour booking against the tour's capacity for its date
///
/// The tour must exist, be available and open on the date. Guests of every
/// other active booking for the same (tour, date) plus this booking's guests
/// must fit the date's capacity, falling back to `maxGuests`. A tour with
/// neither is uncapped.
pub fn validate_tour_booking_capacity(db: &Database, booking: &Booking) -> RuleResult<()> {
    let invalid = |reason: &str| RuleViolation::InvalidTourBookingData {
        booking_id: booking.id.clone(),
        reason: reason.to_string(),
    };

    if booking.booking_type != BookingType::Tour {
        return Err(invalid("not a tour booking"));
    }
    let date = booking.tour_date.ok_or_else(|| invalid("tourDate is required"))?;
    if booking.guests == 0 {
        return Err(invalid("guests must be at least 1"));
    }

    let tour = db
        .tour(&booking.item_id)
        .filter(|tour| tour.available)
        .ok_or_else(|| RuleViolation::TourUnavailable { tour_id: booking.item_id.clone() })?;

    if tour.is_closed_on(date) {
        return Err(RuleViolation::TourDateClosed { tour_id: tour.id.clone(), date });
    }

    let Some(capacity) = tour.capacity_on(date) else {
        return Ok(());
    };

    let booked: u64 = db
        .bookings
        .iter()
        .filter(|other| {
            other.id != booking.id
                && other.booking_type == BookingType::Tour
                && other.item_id == booking.item_id
                && other.tour_date == Some(date)
                && other.status.is_active()
        })
        .map(|other| u64::from(other.guests))
        .sum();

    // u64 so oversized requests cannot wrap
    if booked + u64::from(booking.guests) > u64::from(capacity) {
        return Err(RuleViolation::TourOccupancyFull {
            tour_id: tour.id.clone(),
            date,
            booked,
            requested: booking.guests,
            capacity,
        });
    }
    Ok(())
}

/// Check an active hotel booking against room type, stay rules and occupancy
///
/// Order of checks: booking shape, stay range, hotel, room type, min/max
/// nights, guests per room, closed nights, then per-night room occupancy.
/// Occupancy is only enforced for room types with a configured room count.
pub fn validate_hotel_booking_capacity(db: &Database, booking: &Booking) -> RuleResult<()> {
    let invalid = |reason: &str| RuleViolation::InvalidHotelBookingData {
        booking_id: booking.id.clone(),
        reason: reason.to_string(),
    };

    if booking.booking_type != BookingType::Hotel {
        return Err(invalid("not a hotel booking"));
    }
    let (check_in, check_out) = match (booking.check_in, booking.check_out) {
        (Some(check_in), Some(check_out)) => (check_in, check_out),
        _ => return Err(invalid("checkIn and checkOut are required")),
    };
    let room_type = booking
        .room_type
        .as_deref()
        .map(str::trim)
        .filter(|room_type| !room_type.is_empty())
        .ok_or_else(|| invalid("roomType is required"))?;
    let num_rooms = booking.rooms_held();
    if num_rooms == 0 {
        return Err(invalid("numRooms must be at least 1"));
    }
    if booking.guests == 0 {
        return Err(invalid("guests must be at least 1"));
    }
    if check_out <= check_in {
        return Err(RuleViolation::InvalidStayRange {
            reason: format!("checkOut {} must be after checkIn {}", check_out, check_in),
        });
    }

    let hotel = db
        .hotel(&booking.item_id)
        .filter(|hotel| hotel.available)
        .ok_or_else(|| RuleViolation::HotelUnavailable { hotel_id: booking.item_id.clone() })?;

    let room = hotel.room_type(room_type).ok_or_else(|| RuleViolation::RoomTypeUnavailable {
        hotel_id: hotel.id.clone(),
        room_type: room_type.to_string(),
    })?;

    let nights = days_between(check_in, check_out);
    if let Some(min_nights) = hotel.min_nights {
        if nights < i64::from(min_nights) {
            return Err(RuleViolation::InvalidStayRange {
                reason: format!("minimum stay is {} nights, requested {}", min_nights, nights),
            });
        }
    }
    if let Some(max_nights) = hotel.max_nights {
        if nights > i64::from(max_nights) {
            return Err(RuleViolation::InvalidStayRange {
                reason: format!("maximum stay is {} nights, requested {}", max_nights, nights),
            });
        }
    }

    let max_guests = room.capacity.saturating_mul(num_rooms);
    if booking.guests > max_guests {
        return Err(RuleViolation::HotelRoomCapacityExceeded {
            guests: booking.guests,
            max_guests,
        });
    }

    let stay = enumerate_dates(check_in, check_out);
    if let Some(date) = stay.iter().copied().find(|night| hotel.is_closed_on(*night)) {
        return Err(RuleViolation::HotelDateClosed { hotel_id: hotel.id.clone(), date });
    }

    let Some(rooms) = hotel.rooms_of_type(room_type) else {
        return Ok(());
    };

    let overlapping: Vec<&Booking> = db
        .bookings
        .iter()
        .filter(|other| {
            other.id != booking.id
                && other.booking_type == BookingType::Hotel
                && other.item_id == booking.item_id
                && other.status.is_active()
                && other.room_type.as_deref().map(str::trim) == Some(room_type)
        })
        .filter(|other| match (other.check_in, other.check_out) {
            (Some(start), Some(end)) => ranges_overlap(start, end, check_in, check_out),
            _ => false,
        })
        .collect();

    for night in stay {
        let booked: u64 = overlapping
            .iter()
            .filter(|other| match (other.check_in, other.check_out) {
                (Some(start), Some(end)) => start <= night && night < end,
                _ => false,
            })
            .map(|other| u64::from(other.rooms_held()))
            .sum();

        if booked + u64::from(num_rooms) > u64::from(rooms) {
            return Err(RuleViolation::HotelOccupancyFull {
                hotel_id: hotel.id.clone(),
                room_type: room_type.to_string(),
                date: night,
                booked,
                requested: num_rooms,
                rooms,
            });
        }
    }
    Ok(())
}
