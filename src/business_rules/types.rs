// Domain type definitions for the Business Rules System
// Shared by the pricing engine, the document model and the route handlers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of discount carried by a coupon
///
/// Determines how the coupon value should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Value is a percentage of the amount (e.g., 10 = 10% off)
    #[serde(alias = "percent")]
    Percentage,

    /// Value is subtracted from the amount (e.g., 150 = ₹150 off)
    #[serde(alias = "fixed", alias = "flat")]
    FixedAmount,
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::FixedAmount => write!(f, "fixed_amount"),
        }
    }
}

/// Marketplace service a price quote or coupon belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Hotel,
    Tour,
    Food,
    Cab,
    Bus,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Hotel => "hotel",
            ServiceKind::Tour => "tour",
            ServiceKind::Food => "food",
            ServiceKind::Cab => "cab",
            ServiceKind::Bus => "bus",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_type_display() {
        assert_eq!(DiscountType::Percentage.to_string(), "percentage");
        assert_eq!(DiscountType::FixedAmount.to_string(), "fixed_amount");
    }

    #[test]
    fn test_discount_type_aliases() {
        let parsed: DiscountType = serde_json::from_str("\"flat\"").unwrap();
        assert_eq!(parsed, DiscountType::FixedAmount);
        let parsed: DiscountType = serde_json::from_str("\"percent\"").unwrap();
        assert_eq!(parsed, DiscountType::Percentage);
    }

    #[test]
    fn test_service_kind_serialization() {
        assert_eq!(serde_json::to_string(&ServiceKind::Cab).unwrap(), "\"cab\"");
        assert_eq!(ServiceKind::Hotel.to_string(), "hotel");
    }
}
