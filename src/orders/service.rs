use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;

use crate::business_rules::pricing::quote_food_order;
use crate::business_rules::{AuditLogger, AuditRecord, QuoteContext};
use crate::document::{new_id, BookingStatus, Database, FoodOrder, FoodOrderItem, MenuItem};
use crate::error::AppError;
use crate::jsondb::JsonDb;
use crate::orders::{CreateFoodOrderRequest, OrderLineRequest, StatusMachine};

/// Service for food order business logic
///
/// Builds the mutation closures; stock itself is reconciled by the
/// operational rules when the mutation commits.
#[derive(Clone)]
pub struct FoodOrderService {
    db: Arc<JsonDb>,
}

fn find_menu_item<'a>(db: &'a Database, restaurant_id: &'a str, line: &OrderLineRequest) -> Option<&'a MenuItem> {
    if let Some(id) = line.menu_item_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        return db.menu_for(restaurant_id).find(|item| item.id == id);
    }
    let name = line.name.as_deref()?;
    db.menu_for(restaurant_id).find(|item| item.name_matches(name))
}

/// Resolve request lines against the menu, freezing name and price on each line
///
/// Sold-out items are let through: a consuming order is rejected by stock
/// reconciliation with the out-of-stock code, a pending one waits for a restock.
fn build_lines(db: &Database, restaurant_id: &str, lines: &[OrderLineRequest]) -> Result<Vec<FoodOrderItem>, AppError> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        if !line.has_reference() {
            return Err(AppError::Validation("Each item needs a menuItemId or a name".to_string()));
        }
        let reference = line.menu_item_id.as_deref().or(line.name.as_deref()).unwrap_or_default();
        let item = find_menu_item(db, restaurant_id, line)
            .filter(|item| item.available || item.is_sold_out())
            .ok_or_else(|| AppError::not_found("Menu item", reference))?;

        if let Some(max) = item.max_per_order {
            if line.quantity > max {
                return Err(AppError::Validation(format!(
                    "At most {} of {} can be ordered at once",
                    max, item.name
                )));
            }
        }

        items.push(FoodOrderItem {
            menu_item_id: Some(item.id.clone()),
            name: item.name.clone(),
            quantity: line.quantity,
            price: item.price,
        });
    }
    Ok(items)
}

/// Append a new order to the document
///
/// Fails fast on unknown restaurants, menu items missing from that
/// restaurant, items switched off by an admin and unusable coupons. Stock is
/// not checked here.
pub(crate) fn place_order(
    db: &mut Database,
    order_id: &str,
    request: &CreateFoodOrderRequest,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let restaurant = db
        .restaurant(&request.restaurant_id)
        .filter(|restaurant| restaurant.available)
        .ok_or_else(|| AppError::not_found("Restaurant", &request.restaurant_id))?;
    let restaurant_id = restaurant.id.clone();

    let items = build_lines(db, &restaurant_id, &request.items)?;

    let coupon = match request.coupon_code.as_deref() {
        Some(code) => Some(
            db.coupon(code)
                .ok_or_else(|| AppError::Validation(format!("Coupon {} does not exist", code)))?,
        ),
        None => None,
    };
    let ctx = QuoteContext::new(&db.settings.tax_rules, now)
        .with_coupon(coupon)
        .with_billing_state(request.billing_state.as_deref());
    let pricing = quote_food_order(&ctx, &items)?;

    if let Some(code) = pricing.coupon_code.as_deref() {
        if let Some(coupon) = db.coupon_mut(code) {
            coupon.used_count += 1;
        }
    }

    let status = StatusMachine::initial(request.status)?;
    let total = pricing.total;
    db.food_orders.push(FoodOrder {
        id: order_id.to_string(),
        restaurant_id: restaurant_id.clone(),
        contact: request.contact(),
        items,
        status,
        delivery_address: request.delivery_address.clone(),
        pricing: Some(pricing),
        created_at: now,
        updated_at: None,
    });

    AuditLogger::log(
        db,
        AuditRecord::new("food_order_created", "food_order", order_id).with_details(json!({
            "restaurantId": restaurant_id,
            "status": status,
            "total": total,
        })),
    );
    Ok(())
}

/// Move an existing order along the status machine
pub(crate) fn change_order_status(db: &mut Database, order_id: &str, status: BookingStatus) -> Result<(), AppError> {
    let order = db
        .food_order_mut(order_id)
        .ok_or_else(|| AppError::not_found("Food order", order_id))?;
    let from = order.status;
    order.status = StatusMachine::transition(from, status)?;
    if from == status {
        return Ok(());
    }
    order.updated_at = Some(Utc::now());
    AuditLogger::log_status_change(db, "food_order", order_id, from.as_str(), status.as_str());
    Ok(())
}

impl FoodOrderService {
    pub fn new(db: Arc<JsonDb>) -> Self {
        Self { db }
    }

    /// Place a new order
    ///
    /// # Validation
    /// - Restaurant must exist and be available
    /// - Every line must resolve to an available menu item of that restaurant
    ///   (by id, or by case-insensitive name)
    /// - Price snapshots are captured from current menu prices
    /// - A `confirmed` order draws stock at commit; running out rejects the
    ///   whole order with `OUT_OF_STOCK_FOR_CONFIRMED_ORDER:<item>`
    pub async fn create_order(&self, request: CreateFoodOrderRequest) -> Result<FoodOrder, AppError> {
        let order_id = new_id("food");
        let now = Utc::now();
        tracing::debug!(order_id = %order_id, restaurant_id = %request.restaurant_id, "placing food order");

        let db = self
            .db
            .mutate_data(Some("food_order_create"), |db| place_order(db, &order_id, &request, now))
            .await?;

        let order = db
            .food_order(&order_id)
            .cloned()
            .ok_or_else(|| AppError::Internal(format!("food order {} missing after commit", order_id)))?;
        tracing::info!(order_id = %order.id, status = %order.status, "food order placed");
        Ok(order)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<FoodOrder, AppError> {
        let db = self.db.read_data().await?;
        db.food_order(order_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Food order", order_id))
    }

    /// Change an order's status; confirming draws stock, cancelling a consuming order refunds it
    pub async fn update_status(&self, order_id: &str, status: BookingStatus) -> Result<FoodOrder, AppError> {
        let db = self
            .db
            .mutate_data(Some("food_order_status"), |db| change_order_status(db, order_id, status))
            .await?;

        db.food_order(order_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Food order", order_id))
    }
}
