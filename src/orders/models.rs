use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::document::{BookingStatus, Contact};

/// One requested line; the menu item is found by id, or by name within the restaurant
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineRequest {
    #[schema(example = "menu_idli")]
    pub menu_item_id: Option<String>,
    #[schema(example = "Idli")]
    pub name: Option<String>,
    #[validate(range(min = 1, max = 100, message = "Quantity must be between 1 and 100"))]
    #[schema(example = 2, minimum = 1, maximum = 100)]
    pub quantity: u32,
}

impl OrderLineRequest {
    pub fn has_reference(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().map_or(false, |v| !v.trim().is_empty());
        present(&self.menu_item_id) || present(&self.name)
    }
}

/// Request DTO for placing a food order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFoodOrderRequest {
    #[validate(length(min = 1, message = "restaurantId is required"))]
    #[schema(example = "rest_udupi")]
    pub restaurant_id: String,
    #[validate(custom = "crate::validation::validate_not_blank")]
    #[schema(example = "Asha")]
    pub customer_name: String,
    #[validate(custom = "crate::validation::validate_phone")]
    #[schema(example = "+919876543210")]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub user_id: Option<String>,
    pub delivery_address: Option<String>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    #[validate]
    pub items: Vec<OrderLineRequest>,
    pub coupon_code: Option<String>,
    /// Billing state; differs from the home state for interstate GST
    pub billing_state: Option<String>,
    /// Initial status, `pending` when omitted; `confirmed` consumes stock immediately
    pub status: Option<BookingStatus>,
}

impl CreateFoodOrderRequest {
    pub fn contact(&self) -> Contact {
        Contact {
            user_id: self.user_id.clone(),
            customer_name: self.customer_name.trim().to_string(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Request DTO for moving a booking, order or ride to a new status
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}
