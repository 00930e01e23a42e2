// Cross-entity synchronisation
//
// Derived views rebuilt on every read and again after every mutation:
// restaurant menus, per-customer profiles and per-visitor behaviour
// profiles. Every function here is idempotent.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::mapping::VendorMenus;
use crate::business_rules::ServiceKind;
use crate::document::{BehaviorProfile, BookingPricing, BookingStatus, Contact, Database, MenuItem, UserProfile};

/// Choose each restaurant's menu source on read
///
/// Precedence: dedicated vendor menu, then the inline `menu` column, then the
/// flat menu item list.
pub fn attach_restaurant_menus(db: &mut Database, mut vendor_menus: VendorMenus) {
    for restaurant in db.restaurants.iter_mut() {
        match vendor_menus.remove(&restaurant.id) {
            Some(menu) if !menu.is_empty() => restaurant.menu = menu,
            _ => {}
        }
    }
    sync_restaurant_menus(db);
}

/// Keep restaurant menu views and the flat menu item list consistent
///
/// The flat list holds stock. Menu entries missing from it are added to it;
/// entries present in it are replaced by the flat copy; flat items of the
/// restaurant missing from the view are appended to the view.
pub fn sync_restaurant_menus(db: &mut Database) {
    let Database { restaurants, menu_items, .. } = db;

    for restaurant in restaurants.iter_mut() {
        let mut view: Vec<MenuItem> = Vec::with_capacity(restaurant.menu.len());
        let mut seen: HashSet<String> = HashSet::new();

        for entry in restaurant.menu.drain(..) {
            if !seen.insert(entry.id.clone()) {
                continue;
            }
            match menu_items.iter().find(|item| item.id == entry.id) {
                Some(flat) => view.push(flat.clone()),
                None => {
                    let mut adopted = entry;
                    adopted.restaurant_id = Some(restaurant.id.clone());
                    menu_items.push(adopted.clone());
                    view.push(adopted);
                }
            }
        }

        for item in menu_items.iter() {
            if item.restaurant_id.as_deref() == Some(restaurant.id.as_str()) && !seen.contains(&item.id) {
                seen.insert(item.id.clone());
                view.push(item.clone());
            }
        }

        restaurant.menu = view;
    }
}

#[derive(Default)]
struct Activity {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    total_orders: u32,
    total_spent: Decimal,
    services: BTreeSet<String>,
    last_activity_at: Option<DateTime<Utc>>,
}

impl Activity {
    fn record(
        &mut self,
        contact: &Contact,
        service: ServiceKind,
        status: BookingStatus,
        pricing: Option<&BookingPricing>,
        at: DateTime<Utc>,
    ) {
        let newer = self.last_activity_at.map_or(true, |last| at >= last);
        if newer {
            if !contact.customer_name.trim().is_empty() {
                self.name = Some(contact.customer_name.clone());
            }
            if contact.email.is_some() {
                self.email = contact.email.clone();
            }
            if contact.phone.is_some() {
                self.phone = contact.phone.clone();
            }
            self.last_activity_at = Some(at);
        }
        if status.is_active() {
            self.total_orders += 1;
            self.services.insert(service.as_str().to_string());
        }
        if status.is_consuming() {
            self.total_spent += pricing.map(|p| p.total).unwrap_or(Decimal::ZERO);
        }
    }
}

/// Rebuild user profiles from booking and order history
///
/// Profiles are keyed by the contact identity key. Client-owned preferences
/// survive; profiles whose customer has no remaining history are kept as is.
pub fn sync_user_profiles(db: &mut Database) {
    let mut activity: BTreeMap<String, Activity> = BTreeMap::new();
    let mut track = |contact: &Contact,
                     service: ServiceKind,
                     status: BookingStatus,
                     pricing: Option<&BookingPricing>,
                     at: DateTime<Utc>| {
        if let Some(key) = contact.identity_key() {
            activity.entry(key).or_default().record(contact, service, status, pricing, at);
        }
    };

    for booking in &db.bookings {
        let service = match booking.booking_type {
            crate::document::BookingType::Hotel => ServiceKind::Hotel,
            crate::document::BookingType::Tour => ServiceKind::Tour,
        };
        let at = booking.updated_at.unwrap_or(booking.created_at);
        track(&booking.contact, service, booking.status, booking.pricing.as_ref(), at);
    }
    for order in &db.food_orders {
        let at = order.updated_at.unwrap_or(order.created_at);
        track(&order.contact, ServiceKind::Food, order.status, order.pricing.as_ref(), at);
    }
    for ride in &db.cab_bookings {
        let at = ride.updated_at.unwrap_or(ride.created_at);
        track(&ride.contact, ServiceKind::Cab, ride.status, ride.pricing.as_ref(), at);
    }
    for trip in &db.bus_bookings {
        let at = trip.updated_at.unwrap_or(trip.created_at);
        track(&trip.contact, ServiceKind::Bus, trip.status, trip.pricing.as_ref(), at);
    }

    for (key, summary) in activity {
        let index = match db.user_profiles.iter().position(|profile| profile.id == key) {
            Some(index) => index,
            None => {
                db.user_profiles.push(UserProfile {
                    id: key.clone(),
                    name: None,
                    email: None,
                    phone: None,
                    total_orders: 0,
                    total_spent: Decimal::ZERO,
                    services: BTreeSet::new(),
                    last_activity_at: None,
                    preferences: serde_json::Value::Null,
                });
                db.user_profiles.len() - 1
            }
        };
        let profile = &mut db.user_profiles[index];
        profile.name = summary.name.or(profile.name.take());
        profile.email = summary.email.or(profile.email.take());
        profile.phone = summary.phone.or(profile.phone.take());
        profile.total_orders = summary.total_orders;
        profile.total_spent = summary.total_spent;
        profile.services = summary.services;
        profile.last_activity_at = summary.last_activity_at;
    }
}

/// Rebuild behaviour profiles from analytics events
pub fn sync_behavior_profiles(db: &mut Database) {
    struct Tally {
        events: BTreeMap<String, u64>,
        categories: BTreeMap<String, u64>,
        last_event_at: Option<DateTime<Utc>>,
    }

    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    for event in &db.analytics_events {
        let Some(user_key) = event.user_key.as_deref().filter(|key| !key.is_empty()) else {
            continue;
        };
        let tally = tallies.entry(user_key).or_insert_with(|| Tally {
            events: BTreeMap::new(),
            categories: BTreeMap::new(),
            last_event_at: None,
        });
        *tally.events.entry(event.event.clone()).or_insert(0) += 1;
        if let Some(category) = &event.category {
            *tally.categories.entry(category.clone()).or_insert(0) += 1;
        }
        tally.last_event_at = tally.last_event_at.max(Some(event.created_at));
    }

    let mut rebuilt = Vec::with_capacity(tallies.len());
    for (user_key, tally) in tallies {
        // Highest count wins; ties go to the alphabetically first category
        let top_category = tally
            .categories
            .iter()
            .fold(None::<(&String, u64)>, |best, (category, count)| match best {
                Some((_, best_count)) if best_count >= *count => best,
                _ => Some((category, *count)),
            })
            .map(|(category, _)| category.clone());

        let id = db
            .behavior_profiles
            .iter()
            .find(|profile| profile.user_key == user_key)
            .map(|profile| profile.id.clone())
            .unwrap_or_else(|| format!("behavior_{}", user_key));

        rebuilt.push(BehaviorProfile {
            id,
            user_key: user_key.to_string(),
            event_counts: tally.events,
            top_category,
            last_event_at: tally.last_event_at,
        });
    }

    let rebuilt_keys: HashSet<String> = rebuilt.iter().map(|profile| profile.user_key.clone()).collect();
    let mut kept: Vec<BehaviorProfile> = db
        .behavior_profiles
        .drain(..)
        .filter(|profile| !rebuilt_keys.contains(&profile.user_key))
        .collect();
    kept.extend(rebuilt);
    db.behavior_profiles = kept;
}

/// All derived views, in dependency order
pub fn synchronize(db: &mut Database) {
    sync_restaurant_menus(db);
    sync_user_profiles(db);
    sync_behavior_profiles(db);
}
