// Platform-level collections: settings singletons, coupons, audit log,
// support queries, service areas, providers, profiles and analytics

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use validator::Validate;

use crate::business_rules::types::DiscountType;

fn default_true() -> bool {
    true
}

pub const SINGLETON_ID: &str = "default";

fn default_singleton_id() -> String {
    SINGLETON_ID.to_string()
}

/// One price band of the hotel GST schedule; `max: None` is unbounded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GstSlab {
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub min: Decimal,
    #[serde(default)]
    pub max: Option<Decimal>,
    #[validate(custom = "crate::validation::validate_gst_rate")]
    pub rate: Decimal,
}

/// Tax rule configuration; rates are fractions (0.18 = 18%)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSettings {
    #[serde(default = "default_hotel_slabs")]
    pub hotel_slabs: Vec<GstSlab>,
    #[serde(default = "default_service_rate")]
    pub tour_gst_rate: Decimal,
    #[serde(default = "default_service_rate")]
    pub food_gst_rate: Decimal,
    #[serde(default = "default_service_rate")]
    pub cab_gst_rate: Decimal,
    #[serde(default = "default_service_rate")]
    pub bus_gst_rate: Decimal,
    /// Supplier state; bookings billed to another state are interstate (IGST)
    #[serde(default)]
    pub home_state: Option<String>,
}

fn default_hotel_slabs() -> Vec<GstSlab> {
    vec![
        GstSlab { min: Decimal::ZERO, max: Some(Decimal::new(1000, 0)), rate: Decimal::ZERO },
        GstSlab {
            min: Decimal::new(1000, 0),
            max: Some(Decimal::new(7500, 0)),
            rate: Decimal::new(12, 2),
        },
        GstSlab { min: Decimal::new(7500, 0), max: None, rate: Decimal::new(18, 2) },
    ]
}

fn default_service_rate() -> Decimal {
    Decimal::new(5, 2)
}

impl Default for TaxSettings {
    fn default() -> Self {
        Self {
            hotel_slabs: default_hotel_slabs(),
            tour_gst_rate: default_service_rate(),
            food_gst_rate: default_service_rate(),
            cab_gst_rate: default_service_rate(),
            bus_gst_rate: default_service_rate(),
            home_state: None,
        }
    }
}

impl TaxSettings {
    /// Billing to a state other than the supplier's is interstate
    pub fn is_interstate(&self, billing_state: Option<&str>) -> bool {
        match (self.home_state.as_deref(), billing_state) {
            (Some(home), Some(billing)) => !home.trim().eq_ignore_ascii_case(billing.trim()),
            _ => false,
        }
    }
}

/// Settings singleton row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_singleton_id")]
    pub id: String,
    #[serde(default)]
    pub tax_rules: TaxSettings,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub support_phone: Option<String>,
}

fn default_currency() -> String {
    "INR".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: default_singleton_id(),
            tax_rules: TaxSettings::default(),
            currency: default_currency(),
            support_phone: None,
        }
    }
}

/// Policy texts singleton row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policies {
    #[serde(default = "default_singleton_id")]
    pub id: String,
    #[serde(default)]
    pub cancellation: Option<String>,
    #[serde(default)]
    pub refund: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
}

impl Default for Policies {
    fn default() -> Self {
        Self { id: default_singleton_id(), cancellation: None, refund: None, terms: None }
    }
}

/// Payment options singleton row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSettings {
    #[serde(default = "default_singleton_id")]
    pub id: String,
    #[serde(default)]
    pub upi_id: Option<String>,
    #[serde(default = "default_true")]
    pub cod_enabled: bool,
    #[serde(default)]
    pub online_enabled: bool,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self { id: default_singleton_id(), upi_id: None, cod_enabled: true, online_enabled: false }
    }
}

/// Append-only audit event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    pub action: String,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[validate(length(min = 1))]
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[validate(custom = "crate::validation::validate_non_negative_amount")]
    pub value: Decimal,
    #[serde(default)]
    pub min_amount: Option<Decimal>,
    #[serde(default)]
    pub max_discount: Option<Decimal>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    /// Service kinds the coupon applies to; empty means all
    #[serde(default)]
    pub applies_to: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArea {
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CabProvider {
    #[validate(length(min = 1))]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub vehicle_types: Vec<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub base_fare: Option<Decimal>,
    #[serde(default)]
    pub per_km: Option<Decimal>,
}

/// Customer support query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportQuery {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    #[serde(default = "default_query_status")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

fn default_query_status() -> String {
    "open".to_string()
}

/// Per-customer aggregate rebuilt from booking and order history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub total_orders: u32,
    #[serde(default)]
    pub total_spent: Decimal,
    #[serde(default)]
    pub services: BTreeSet<String>,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Free-form preferences owned by the client; preserved across rebuilds
    #[serde(default)]
    pub preferences: JsonValue,
}

/// Per-visitor aggregate rebuilt from analytics events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorProfile {
    pub id: String,
    pub user_key: String,
    #[serde(default)]
    pub event_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub top_category: Option<String>,
    #[serde(default)]
    pub last_event_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: String,
    #[serde(default)]
    pub user_key: Option<String>,
    pub event: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

/// CMS page keyed by slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePage {
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: JsonValue,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
