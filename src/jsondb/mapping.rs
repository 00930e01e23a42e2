// Row ↔ document mapping
//
// Rows are flat snake_case objects; the document uses camelCase fields with
// nested JSON for columns declared as JSON. Reading strips nulls so serde
// defaults apply to missing or legacy columns, and decodes JSON columns that
// arrive as strings (once or twice encoded), falling back to an empty value.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use super::error::StoreError;
use super::store::{row_key, Row};
use super::tables::{self, JsonShape, TableSpec};
use crate::document::{Database, MenuItem, SchemaError, SINGLETON_ID};

/// Rows per table name
pub type TableSet = BTreeMap<&'static str, Vec<Row>>;

/// Menus from the dedicated vendor menu table, keyed by restaurant id
pub type VendorMenus = HashMap<String, Vec<MenuItem>>;

pub fn snake_to_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

pub fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Decode a JSON column that may be parsed already or still a string
pub fn decode_json_column(value: Value, shape: JsonShape) -> Value {
    let decoded = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::String(inner)) => serde_json::from_str::<Value>(&inner).unwrap_or(Value::Null),
            Ok(parsed) => parsed,
            Err(_) => Value::Null,
        },
        other => other,
    };
    if shape.accepts(&decoded) {
        decoded
    } else {
        shape.empty()
    }
}

/// Reshape one relational row into a document object
pub fn row_to_document(spec: &TableSpec, row: Row) -> Map<String, Value> {
    let mut doc = Map::with_capacity(row.len());
    for (column, value) in row {
        let value = match spec.json_shape(&column) {
            Some(shape) => decode_json_column(value, shape),
            None => value,
        };
        if value.is_null() {
            continue;
        }
        doc.insert(snake_to_camel(&column), value);
    }
    doc
}

/// Reshape one document object into a relational row
pub fn document_to_row(doc: Map<String, Value>) -> Row {
    doc.into_iter()
        .map(|(field, value)| (camel_to_snake(&field), value))
        .collect()
}

/// Decode a table's rows into typed records; the first bad row is a schema error
pub fn decode_collection<T: DeserializeOwned>(spec: &TableSpec, rows: Vec<Row>) -> Result<Vec<T>, SchemaError> {
    rows.into_iter()
        .map(|row| {
            let key = row_key(&row, spec.conflict_key);
            let doc = row_to_document(spec, row);
            serde_json::from_value(Value::Object(doc))
                .map_err(|err| SchemaError::new(spec.collection, &key, err.to_string()))
        })
        .collect()
}

pub fn encode_collection<T: Serialize>(spec: &TableSpec, records: &[T]) -> Result<Vec<Row>, StoreError> {
    records
        .iter()
        .map(|record| match serde_json::to_value(record) {
            Ok(Value::Object(doc)) => Ok(document_to_row(doc)),
            Ok(other) => Err(StoreError::Encoding {
                table: spec.name.to_string(),
                message: format!("expected an object, got {}", other),
            }),
            Err(err) => Err(StoreError::Encoding {
                table: spec.name.to_string(),
                message: err.to_string(),
            }),
        })
        .collect()
}

fn decode_singleton<T: DeserializeOwned + Default>(spec: &TableSpec, rows: Vec<Row>) -> Result<T, SchemaError> {
    let mut records: Vec<(String, T)> = Vec::with_capacity(rows.len());
    for row in rows {
        let key = row_key(&row, spec.conflict_key);
        let mut decoded = decode_collection::<T>(spec, vec![row])?;
        if let Some(record) = decoded.pop() {
            records.push((key, record));
        }
    }
    let position = records
        .iter()
        .position(|(key, _)| key == SINGLETON_ID)
        .unwrap_or(0);
    Ok(if records.is_empty() {
        T::default()
    } else {
        records.swap_remove(position).1
    })
}

fn take(tables: &mut TableSet, spec: &TableSpec) -> Vec<Row> {
    tables.remove(spec.name).unwrap_or_default()
}

/// Build the document from loaded tables
///
/// Vendor menus are returned separately; attaching them to restaurants is a
/// sync concern.
pub fn decode_database(mut tables: TableSet) -> Result<(Database, VendorMenus), SchemaError> {
    let mut vendor_menus = VendorMenus::new();
    for row in take(&mut tables, &tables::VENDOR_MENUS) {
        let restaurant_id = row_key(&row, tables::VENDOR_MENUS.conflict_key);
        let items = row
            .get("items")
            .cloned()
            .map(|value| decode_json_column(value, JsonShape::List))
            .unwrap_or_else(|| JsonShape::List.empty());
        let menu: Vec<MenuItem> = serde_json::from_value(items)
            .map_err(|err| SchemaError::new("vendorMenus", &restaurant_id, err.to_string()))?;
        vendor_menus.insert(restaurant_id, menu);
    }

    let db = Database {
        tours: decode_collection(&tables::TOURS, take(&mut tables, &tables::TOURS))?,
        hotels: decode_collection(&tables::HOTELS, take(&mut tables, &tables::HOTELS))?,
        restaurants: decode_collection(&tables::RESTAURANTS, take(&mut tables, &tables::RESTAURANTS))?,
        menu_items: decode_collection(&tables::MENU_ITEMS, take(&mut tables, &tables::MENU_ITEMS))?,
        bookings: decode_collection(&tables::BOOKINGS, take(&mut tables, &tables::BOOKINGS))?,
        cab_bookings: decode_collection(&tables::CAB_BOOKINGS, take(&mut tables, &tables::CAB_BOOKINGS))?,
        bus_bookings: decode_collection(&tables::BUS_BOOKINGS, take(&mut tables, &tables::BUS_BOOKINGS))?,
        food_orders: decode_collection(&tables::FOOD_ORDERS, take(&mut tables, &tables::FOOD_ORDERS))?,
        queries: decode_collection(&tables::QUERIES, take(&mut tables, &tables::QUERIES))?,
        audit_log: decode_collection(&tables::AUDIT_LOG, take(&mut tables, &tables::AUDIT_LOG))?,
        coupons: decode_collection(&tables::COUPONS, take(&mut tables, &tables::COUPONS))?,
        service_areas: decode_collection(&tables::SERVICE_AREAS, take(&mut tables, &tables::SERVICE_AREAS))?,
        cab_providers: decode_collection(&tables::CAB_PROVIDERS, take(&mut tables, &tables::CAB_PROVIDERS))?,
        user_profiles: decode_collection(&tables::USER_PROFILES, take(&mut tables, &tables::USER_PROFILES))?,
        behavior_profiles: decode_collection(
            &tables::BEHAVIOR_PROFILES,
            take(&mut tables, &tables::BEHAVIOR_PROFILES),
        )?,
        analytics_events: decode_collection(
            &tables::ANALYTICS_EVENTS,
            take(&mut tables, &tables::ANALYTICS_EVENTS),
        )?,
        site_pages: decode_collection(&tables::SITE_PAGES, take(&mut tables, &tables::SITE_PAGES))?,
        settings: decode_singleton(&tables::SETTINGS, take(&mut tables, &tables::SETTINGS))?,
        policies: decode_singleton(&tables::POLICIES, take(&mut tables, &tables::POLICIES))?,
        payment: decode_singleton(&tables::PAYMENT_SETTINGS, take(&mut tables, &tables::PAYMENT_SETTINGS))?,
    };
    Ok((db, vendor_menus))
}

fn vendor_menu_rows(db: &Database) -> Result<Vec<Row>, StoreError> {
    db.restaurants
        .iter()
        .map(|restaurant| {
            let items = serde_json::to_value(&restaurant.menu).map_err(|err| StoreError::Encoding {
                table: tables::VENDOR_MENUS.name.to_string(),
                message: err.to_string(),
            })?;
            let mut row = Row::new();
            row.insert("restaurant_id".to_string(), Value::String(restaurant.id.clone()));
            row.insert("items".to_string(), items);
            Ok(row)
        })
        .collect()
}

/// Flatten the document into rows for every persisted table
pub fn encode_database(db: &Database) -> Result<TableSet, StoreError> {
    let mut set = TableSet::new();
    set.insert(tables::TOURS.name, encode_collection(&tables::TOURS, &db.tours)?);
    set.insert(tables::HOTELS.name, encode_collection(&tables::HOTELS, &db.hotels)?);
    set.insert(tables::RESTAURANTS.name, encode_collection(&tables::RESTAURANTS, &db.restaurants)?);
    set.insert(tables::MENU_ITEMS.name, encode_collection(&tables::MENU_ITEMS, &db.menu_items)?);
    set.insert(tables::VENDOR_MENUS.name, vendor_menu_rows(db)?);
    set.insert(tables::BOOKINGS.name, encode_collection(&tables::BOOKINGS, &db.bookings)?);
    set.insert(tables::FOOD_ORDERS.name, encode_collection(&tables::FOOD_ORDERS, &db.food_orders)?);
    set.insert(tables::CAB_BOOKINGS.name, encode_collection(&tables::CAB_BOOKINGS, &db.cab_bookings)?);
    set.insert(tables::BUS_BOOKINGS.name, encode_collection(&tables::BUS_BOOKINGS, &db.bus_bookings)?);
    set.insert(tables::COUPONS.name, encode_collection(&tables::COUPONS, &db.coupons)?);
    set.insert(tables::SERVICE_AREAS.name, encode_collection(&tables::SERVICE_AREAS, &db.service_areas)?);
    set.insert(tables::CAB_PROVIDERS.name, encode_collection(&tables::CAB_PROVIDERS, &db.cab_providers)?);
    set.insert(tables::QUERIES.name, encode_collection(&tables::QUERIES, &db.queries)?);
    set.insert(tables::SITE_PAGES.name, encode_collection(&tables::SITE_PAGES, &db.site_pages)?);
    set.insert(tables::SETTINGS.name, encode_collection(&tables::SETTINGS, std::slice::from_ref(&db.settings))?);
    set.insert(tables::POLICIES.name, encode_collection(&tables::POLICIES, std::slice::from_ref(&db.policies))?);
    set.insert(
        tables::PAYMENT_SETTINGS.name,
        encode_collection(&tables::PAYMENT_SETTINGS, std::slice::from_ref(&db.payment))?,
    );
    set.insert(tables::USER_PROFILES.name, encode_collection(&tables::USER_PROFILES, &db.user_profiles)?);
    set.insert(
        tables::BEHAVIOR_PROFILES.name,
        encode_collection(&tables::BEHAVIOR_PROFILES, &db.behavior_profiles)?,
    );
    set.insert(
        tables::ANALYTICS_EVENTS.name,
        encode_collection(&tables::ANALYTICS_EVENTS, &db.analytics_events)?,
    );
    set.insert(tables::AUDIT_LOG.name, encode_collection(&tables::AUDIT_LOG, &db.audit_log)?);
    Ok(set)
}
