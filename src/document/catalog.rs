// Catalog entities: tours, hotels, restaurants and their menu items

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use validator::Validate;

use super::dates;

fn default_true() -> bool {
    true
}

/// A bookable tour with per-date capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Tour {
    #[validate(length(min = 1))]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub location: Option<String>,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price: Decimal,
    #[serde(default)]
    pub duration: Option<String>,
    /// Fallback capacity for dates without an explicit entry
    #[serde(default)]
    pub max_guests: Option<u32>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub availability: TourAvailability,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourAvailability {
    #[serde(default, with = "dates::day_set")]
    pub closed_dates: BTreeSet<NaiveDate>,
    #[serde(default, with = "dates::day_map")]
    pub capacity_by_date: BTreeMap<NaiveDate, u32>,
}

impl Tour {
    /// Guest ceiling for a date, `None` when the tour is uncapped
    pub fn capacity_on(&self, date: NaiveDate) -> Option<u32> {
        self.availability
            .capacity_by_date
            .get(&date)
            .copied()
            .or(self.max_guests)
    }

    pub fn is_closed_on(&self, date: NaiveDate) -> bool {
        self.availability.closed_dates.contains(&date)
    }
}

/// A hotel with typed rooms and per-type room counts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    #[validate(length(min = 1))]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub room_types: Vec<RoomType>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub availability: HotelAvailability,
    #[serde(default)]
    pub min_nights: Option<u32>,
    #[serde(default)]
    pub max_nights: Option<u32>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    #[serde(rename = "type")]
    #[validate(length(min = 1))]
    pub room_type: String,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price: Decimal,
    /// Guests allowed per room
    #[validate(range(min = 1))]
    pub capacity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelAvailability {
    #[serde(default, with = "dates::day_set")]
    pub closed_dates: BTreeSet<NaiveDate>,
    /// Physical rooms per room type; a type without an entry is uncapped
    #[serde(default)]
    pub rooms_by_type: BTreeMap<String, u32>,
}

impl Hotel {
    pub fn room_type(&self, name: &str) -> Option<&RoomType> {
        self.room_types.iter().find(|room| room.room_type == name)
    }

    pub fn rooms_of_type(&self, name: &str) -> Option<u32> {
        self.availability.rooms_by_type.get(name).copied()
    }

    pub fn is_closed_on(&self, date: NaiveDate) -> bool {
        self.availability.closed_dates.contains(&date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[validate(length(min = 1))]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    /// Menu view assembled on read; stock lives on `Database::menu_items`
    #[serde(default)]
    pub menu: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[validate(length(min = 1))]
    pub id: String,
    #[serde(default)]
    pub restaurant_id: Option<String>,
    pub name: String,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub price: Decimal,
    /// Units on hand; `None` means stock is not tracked for this item
    #[serde(default)]
    #[validate(range(min = 0))]
    pub stock: Option<i64>,
    #[serde(default)]
    pub max_per_order: Option<u32>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub category: Option<String>,
}

impl MenuItem {
    /// Case-insensitive name comparison used when an order line carries no item id
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// Tracked stock has run out; `available` is false for the same reason
    pub fn is_sold_out(&self) -> bool {
        self.stock.map_or(false, |stock| stock <= 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_tour_capacity_falls_back_to_max_guests() {
        let tour: Tour = serde_json::from_value(json!({
            "id": "tour_t1",
            "title": "Backwater cruise",
            "price": 2500,
            "maxGuests": 12,
            "availability": {"capacityByDate": {"2026-04-01": 5}}
        }))
        .unwrap();

        let listed = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let other = NaiveDate::from_ymd_opt(2026, 4, 2).unwrap();
        assert_eq!(tour.capacity_on(listed), Some(5));
        assert_eq!(tour.capacity_on(other), Some(12));
        assert!(tour.available);
    }

    #[test]
    fn test_uncapped_tour() {
        let tour: Tour = serde_json::from_value(json!({
            "id": "tour_t2", "title": "Walk", "price": 0
        }))
        .unwrap();
        assert_eq!(tour.capacity_on(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()), None);
    }

    #[test]
    fn test_room_type_uses_type_key() {
        let hotel: Hotel = serde_json::from_value(json!({
            "id": "hotel_h1",
            "name": "Lake View",
            "roomTypes": [{"type": "Deluxe", "price": 3200, "capacity": 2}],
            "availability": {"roomsByType": {"Deluxe": 2}}
        }))
        .unwrap();
        assert_eq!(hotel.room_type("Deluxe").unwrap().price, dec!(3200));
        assert_eq!(hotel.rooms_of_type("Deluxe"), Some(2));
        assert_eq!(hotel.rooms_of_type("Suite"), None);
    }

    #[test]
    fn test_negative_stock_fails_validation() {
        let item = MenuItem {
            id: "food_m1".to_string(),
            restaurant_id: None,
            name: "Masala Dosa".to_string(),
            price: dec!(120),
            stock: Some(-1),
            max_per_order: None,
            available: true,
            category: None,
        };
        assert!(item.validate().is_err());
    }

    #[test]
    fn test_name_matches_ignores_case() {
        let item = MenuItem {
            id: "food_m1".to_string(),
            restaurant_id: None,
            name: "Masala Dosa".to_string(),
            price: dec!(120),
            stock: None,
            max_per_order: None,
            available: true,
            category: None,
        };
        assert!(item.name_matches(" masala dosa "));
        assert!(!item.name_matches("Plain Dosa"));
    }
}
