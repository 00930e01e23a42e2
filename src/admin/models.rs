use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::jsondb::MetricsSummary;

/// Request DTO for PUT /api/admin/menu-items/{id}/stock
///
/// `stock: null` stops tracking stock for the item.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStockRequest {
    #[validate(range(min = 0, message = "stock cannot be negative"))]
    #[schema(example = 25)]
    pub stock: Option<i64>,
    /// Explicit availability override; otherwise derived from stock
    pub available: Option<bool>,
}

/// Request DTO for PUT /api/admin/hotels/{id}/availability; omitted fields are left as is
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHotelAvailabilityRequest {
    pub available: Option<bool>,
    /// Replaces the closed night list
    pub closed_dates: Option<Vec<NaiveDate>>,
    /// Replaces the room counts per room type
    pub rooms_by_type: Option<BTreeMap<String, u32>>,
    #[validate(range(min = 1))]
    pub min_nights: Option<u32>,
    #[validate(range(min = 1))]
    pub max_nights: Option<u32>,
}

/// Request DTO for PUT /api/admin/tours/{id}/availability; omitted fields are left as is
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTourAvailabilityRequest {
    pub available: Option<bool>,
    pub closed_dates: Option<Vec<NaiveDate>>,
    /// Replaces the per-date guest capacities
    #[schema(value_type = Option<Object>, example = json!({"2026-04-01": 12}))]
    pub capacity_by_date: Option<BTreeMap<NaiveDate, u32>>,
    pub max_guests: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GstSlabRequest {
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    #[schema(value_type = String, example = "1000")]
    pub min: Decimal,
    #[schema(value_type = Option<String>, example = "7500")]
    pub max: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_gst_rate")]
    #[schema(value_type = String, example = "0.12")]
    pub rate: Decimal,
}

fn validate_slab_bounds(slabs: &Vec<GstSlabRequest>) -> Result<(), ValidationError> {
    if slabs.iter().any(|slab| slab.max.map_or(false, |max| max < slab.min)) {
        return Err(ValidationError::new("slab_max_below_min"));
    }
    Ok(())
}

/// Request DTO for PUT /api/admin/settings/tax; replaces the tax rules wholesale
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaxSettingsRequest {
    #[validate(custom = "validate_slab_bounds")]
    #[validate]
    pub hotel_slabs: Vec<GstSlabRequest>,
    #[validate(custom = "crate::validation::validate_gst_rate")]
    #[schema(value_type = String, example = "0.05")]
    pub tour_gst_rate: Decimal,
    #[validate(custom = "crate::validation::validate_gst_rate")]
    #[schema(value_type = String, example = "0.05")]
    pub food_gst_rate: Decimal,
    #[validate(custom = "crate::validation::validate_gst_rate")]
    #[schema(value_type = String, example = "0.05")]
    pub cab_gst_rate: Decimal,
    #[validate(custom = "crate::validation::validate_gst_rate")]
    #[schema(value_type = String, example = "0.05")]
    pub bus_gst_rate: Decimal,
    #[schema(example = "Kerala")]
    pub home_state: Option<String>,
}

/// Response DTO for GET /api/admin/metrics
#[derive(Debug, Serialize, ToSchema)]
pub struct StoreStatusResponse {
    #[schema(example = "postgres")]
    pub backend: String,
    pub metrics: MetricsSummary,
}
