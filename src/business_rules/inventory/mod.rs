// Food stock reconciliation
//
// Stock moves only when orders cross into or out of a consuming status.
// Consumption is derived independently from the before and after documents
// and the per-item difference is applied to the after document's stock.

use std::collections::{BTreeMap, BTreeSet};

use crate::business_rules::error::{RuleResult, RuleViolation};
use crate::document::{Database, FoodOrder, FoodOrderItem};

/// Menu item id a food order line draws stock from
///
/// Lines carrying `menuItemId` use it directly. Otherwise the first item on the
/// ordering restaurant's menu whose name matches case-insensitively is used,
/// which is ambiguous when that menu lists two items with the same name.
pub fn resolve_line_item<'a>(
    db: &'a Database,
    restaurant_id: &'a str,
    line: &'a FoodOrderItem,
) -> Option<&'a str> {
    if let Some(id) = line.menu_item_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
        return Some(id);
    }
    db.menu_for(restaurant_id)
        .find(|item| item.name_matches(&line.name))
        .map(|item| item.id.as_str())
}

/// Total quantity per menu item held by orders in a consuming status
pub fn consumed_quantities(db: &Database) -> BTreeMap<String, i64> {
    let mut consumed = BTreeMap::new();
    for order in db.food_orders.iter().filter(|order| order.status.is_consuming()) {
        add_order_lines(db, order, &mut consumed);
    }
    consumed
}

fn add_order_lines(db: &Database, order: &FoodOrder, consumed: &mut BTreeMap<String, i64>) {
    for line in &order.items {
        match resolve_line_item(db, &order.restaurant_id, line) {
            Some(id) => *consumed.entry(id.to_string()).or_insert(0) += i64::from(line.quantity),
            None => tracing::warn!(
                order_id = %order.id,
                line = %line.name,
                "food order line matches no menu item; stock not tracked"
            ),
        }
    }
}

/// Apply the consumption delta between `before` and `after` to `after`'s stock
///
/// Increases decrement stock and fail when stock would go negative; decreases
/// refund. Items without tracked stock are skipped. Keys are visited in
/// sorted order so the first failure is deterministic.
pub fn reconcile_stock(before: &Database, after: &mut Database) -> RuleResult<()> {
    let previous = consumed_quantities(before);
    let current = consumed_quantities(after);

    let keys: BTreeSet<&String> = previous.keys().chain(current.keys()).collect();
    for key in keys {
        let delta = current.get(key).copied().unwrap_or(0) - previous.get(key).copied().unwrap_or(0);
        if delta == 0 {
            continue;
        }

        let Some(item) = after.menu_item_mut(key) else {
            tracing::warn!(menu_item_id = %key, delta, "stock delta for unknown menu item ignored");
            continue;
        };
        let Some(stock) = item.stock else {
            continue;
        };

        if delta > stock {
            return Err(RuleViolation::OutOfStockForConfirmedOrder {
                item_name: item.name.clone(),
                requested: delta,
                available: stock,
            });
        }
        item.stock = Some(stock - delta);
        tracing::debug!(menu_item_id = %key, from = stock, to = stock - delta, "stock reconciled");
    }
    Ok(())
}

/// Toggle `available` for every tracked item whose stock differs from `before`
///
/// Covers order-driven moves as well as direct restocks. New items are
/// treated as changed.
pub fn refresh_availability(before: &Database, after: &mut Database) {
    for item in after.menu_items.iter_mut() {
        let Some(stock) = item.stock else {
            continue;
        };
        let previous = before.menu_item(&item.id).and_then(|prior| prior.stock);
        if previous != Some(stock) {
            item.available = stock > 0;
        }
    }
}
