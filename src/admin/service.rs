use serde_json::json;
use std::sync::Arc;

use crate::admin::{
    StoreStatusResponse, UpdateHotelAvailabilityRequest, UpdateStockRequest, UpdateTaxSettingsRequest,
    UpdateTourAvailabilityRequest,
};
use crate::business_rules::{AuditLogger, AuditRecord};
use crate::document::{Database, GstSlab, Hotel, MenuItem, TaxSettings, Tour};
use crate::error::AppError;
use crate::jsondb::JsonDb;

/// Admin console operations
///
/// Catalog edits go through the same mutation pipeline as customer traffic,
/// so a restock refreshes availability and is audited like any other change.
#[derive(Clone)]
pub struct AdminService {
    db: Arc<JsonDb>,
}

pub(crate) fn set_stock(db: &mut Database, item_id: &str, request: &UpdateStockRequest) -> Result<(), AppError> {
    let item = db
        .menu_item_mut(item_id)
        .ok_or_else(|| AppError::not_found("Menu item", item_id))?;
    let previous = item.stock;
    item.stock = request.stock;
    if let Some(available) = request.available {
        item.available = available;
    } else if request.stock.is_none() {
        item.available = true;
    }

    AuditLogger::log(
        db,
        AuditRecord::new("stock_updated", "menu_item", item_id)
            .with_details(json!({ "from": previous, "to": request.stock })),
    );
    Ok(())
}

pub(crate) fn set_hotel_availability(
    db: &mut Database,
    hotel_id: &str,
    request: &UpdateHotelAvailabilityRequest,
) -> Result<(), AppError> {
    let hotel = db
        .hotel_mut(hotel_id)
        .ok_or_else(|| AppError::not_found("Hotel", hotel_id))?;

    if let Some(rooms) = &request.rooms_by_type {
        if let Some(unknown) = rooms.keys().find(|name| hotel.room_type(name).is_none()) {
            return Err(AppError::Validation(format!("Hotel {} has no room type {}", hotel_id, unknown)));
        }
        hotel.availability.rooms_by_type = rooms.clone();
    }
    if let Some(dates) = &request.closed_dates {
        hotel.availability.closed_dates = dates.iter().copied().collect();
    }
    if let Some(available) = request.available {
        hotel.available = available;
    }
    if request.min_nights.is_some() {
        hotel.min_nights = request.min_nights;
    }
    if request.max_nights.is_some() {
        hotel.max_nights = request.max_nights;
    }
    if let (Some(min), Some(max)) = (hotel.min_nights, hotel.max_nights) {
        if min > max {
            return Err(AppError::Validation(format!("minNights {} exceeds maxNights {}", min, max)));
        }
    }

    AuditLogger::log(
        db,
        AuditRecord::new("availability_updated", "hotel", hotel_id).with_details(json!(request)),
    );
    Ok(())
}

pub(crate) fn set_tour_availability(
    db: &mut Database,
    tour_id: &str,
    request: &UpdateTourAvailabilityRequest,
) -> Result<(), AppError> {
    let tour = db
        .tour_mut(tour_id)
        .ok_or_else(|| AppError::not_found("Tour", tour_id))?;

    if let Some(capacity) = &request.capacity_by_date {
        tour.availability.capacity_by_date = capacity.clone();
    }
    if let Some(dates) = &request.closed_dates {
        tour.availability.closed_dates = dates.iter().copied().collect();
    }
    if let Some(available) = request.available {
        tour.available = available;
    }
    if request.max_guests.is_some() {
        tour.max_guests = request.max_guests;
    }

    AuditLogger::log(
        db,
        AuditRecord::new("availability_updated", "tour", tour_id).with_details(json!(request)),
    );
    Ok(())
}

pub(crate) fn set_tax_rules(db: &mut Database, request: &UpdateTaxSettingsRequest) {
    db.settings.tax_rules = TaxSettings {
        hotel_slabs: request
            .hotel_slabs
            .iter()
            .map(|slab| GstSlab { min: slab.min, max: slab.max, rate: slab.rate })
            .collect(),
        tour_gst_rate: request.tour_gst_rate,
        food_gst_rate: request.food_gst_rate,
        cab_gst_rate: request.cab_gst_rate,
        bus_gst_rate: request.bus_gst_rate,
        home_state: request.home_state.clone(),
    };
    let settings_id = db.settings.id.clone();
    AuditLogger::log(
        db,
        AuditRecord::new("tax_rules_updated", "settings", &settings_id).with_details(json!(request)),
    );
}

impl AdminService {
    pub fn new(db: Arc<JsonDb>) -> Self {
        Self { db }
    }

    pub async fn snapshot(&self) -> Result<Database, AppError> {
        self.db.read_data().await
    }

    pub fn store_status(&self) -> StoreStatusResponse {
        self.db.metrics().log_summary();
        StoreStatusResponse {
            backend: self.db.backend_name().to_string(),
            metrics: self.db.metrics().summary(),
        }
    }

    /// Set an item's stock
    ///
    /// When the stock value changes, availability follows it (`stock > 0`) and
    /// an `available` override is ignored; otherwise the override applies.
    pub async fn update_stock(&self, item_id: &str, request: UpdateStockRequest) -> Result<MenuItem, AppError> {
        let db = self
            .db
            .mutate_data(Some("admin_stock"), |db| set_stock(db, item_id, &request))
            .await?;
        let item = db
            .menu_item(item_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Menu item", item_id))?;
        tracing::info!(menu_item_id = %item.id, stock = ?item.stock, available = item.available, "stock updated");
        Ok(item)
    }

    pub async fn update_hotel_availability(
        &self,
        hotel_id: &str,
        request: UpdateHotelAvailabilityRequest,
    ) -> Result<Hotel, AppError> {
        let db = self
            .db
            .mutate_data(Some("admin_hotel_availability"), |db| set_hotel_availability(db, hotel_id, &request))
            .await?;
        db.hotel(hotel_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Hotel", hotel_id))
    }

    pub async fn update_tour_availability(
        &self,
        tour_id: &str,
        request: UpdateTourAvailabilityRequest,
    ) -> Result<Tour, AppError> {
        let db = self
            .db
            .mutate_data(Some("admin_tour_availability"), |db| set_tour_availability(db, tour_id, &request))
            .await?;
        db.tour(tour_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Tour", tour_id))
    }

    pub async fn update_tax_rules(&self, request: UpdateTaxSettingsRequest) -> Result<TaxSettings, AppError> {
        let db = self
            .db
            .mutate_data(Some("admin_tax_rules"), |db| {
                set_tax_rules(db, &request);
                Ok(())
            })
            .await?;
        Ok(db.settings.tax_rules)
    }
}
