// Transaction tests for the document store adapter, run against MemoryStore

use super::*;
use crate::business_rules::{AuditLogger, AuditRecord, RuleViolation};
use crate::document::{
    AnalyticsEvent, Booking, BookingStatus, BookingType, Contact, FoodOrder, FoodOrderItem, Hotel, HotelAvailability,
    MenuItem, Restaurant, RoomType, ServiceArea, SitePage, SupportQuery, Tour, TourAvailability,
};
use chrono::{NaiveDate, Utc};
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}

fn marketplace() -> Database {
    Database {
        tours: vec![Tour {
            id: "tour_t1".into(),
            title: "T1".into(),
            location: Some("Munnar".into()),
            price: dec!(1500),
            duration: None,
            max_guests: Some(20),
            available: true,
            availability: TourAvailability {
                closed_dates: BTreeSet::new(),
                capacity_by_date: BTreeMap::from([(date(4, 1), 5)]),
            },
            images: vec![],
        }],
        hotels: vec![Hotel {
            id: "hotel_h1".into(),
            name: "H1".into(),
            location: None,
            room_types: vec![RoomType { room_type: "Deluxe".into(), price: dec!(3200), capacity: 2 }],
            available: true,
            availability: HotelAvailability {
                closed_dates: BTreeSet::new(),
                rooms_by_type: BTreeMap::from([("Deluxe".to_string(), 2)]),
            },
            min_nights: None,
            max_nights: None,
            amenities: vec![],
        }],
        restaurants: vec![Restaurant {
            id: "rest_r1".into(),
            name: "R1".into(),
            city: None,
            cuisine: None,
            available: true,
            menu: vec![],
        }],
        menu_items: vec![MenuItem {
            id: "food_m1".into(),
            restaurant_id: Some("rest_r1".into()),
            name: "M1".into(),
            price: dec!(120),
            stock: Some(3),
            max_per_order: None,
            available: true,
            category: None,
        }],
        ..Database::default()
    }
}

fn hotel_booking(id: &str) -> Booking {
    Booking {
        id: id.into(),
        booking_type: BookingType::Hotel,
        item_id: "hotel_h1".into(),
        item_name: Some("H1".into()),
        status: BookingStatus::Confirmed,
        contact: Contact::default(),
        check_in: Some(date(3, 10)),
        check_out: Some(date(3, 12)),
        room_type: Some("Deluxe".into()),
        num_rooms: Some(1),
        tour_date: None,
        guests: 2,
        pricing: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn tour_booking(id: &str, guests: u32) -> Booking {
    Booking {
        booking_type: BookingType::Tour,
        item_id: "tour_t1".into(),
        item_name: Some("T1".into()),
        check_in: None,
        check_out: None,
        room_type: None,
        num_rooms: None,
        tour_date: Some(date(4, 1)),
        guests,
        ..hotel_booking(id)
    }
}

fn food_order(id: &str, quantity: u32, status: BookingStatus) -> FoodOrder {
    FoodOrder {
        id: id.into(),
        restaurant_id: "rest_r1".into(),
        contact: Contact::default(),
        items: vec![FoodOrderItem {
            menu_item_id: Some("food_m1".into()),
            name: "M1".into(),
            quantity,
            price: dec!(120),
        }],
        status,
        delivery_address: None,
        pricing: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn options() -> JsonDbOptions {
    JsonDbOptions { backup_interval: None, ..JsonDbOptions::default() }
}

fn open(store: MemoryStore) -> (Arc<MemoryStore>, JsonDb) {
    let store = Arc::new(store);
    let jsondb = JsonDb::new(store.clone(), options());
    (store, jsondb)
}

fn seeded() -> (Arc<MemoryStore>, JsonDb) {
    open(MemoryStore::seeded(&marketplace()).unwrap())
}

fn rule_code(err: &AppError) -> String {
    match err {
        AppError::Rule(violation) => violation.code(),
        other => panic!("expected a rule violation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_read_data_reshapes_seeded_rows() {
    let (_, jsondb) = seeded();
    let db = jsondb.read_data().await.unwrap();

    assert_eq!(db.tours[0].capacity_on(date(4, 1)), Some(5));
    assert_eq!(db.hotels[0].rooms_of_type("Deluxe"), Some(2));
    // Restaurant view rebuilt from the flat list
    assert_eq!(db.restaurants[0].menu.len(), 1);
    assert_eq!(db.restaurants[0].menu[0].id, "food_m1");
    assert_eq!(jsondb.metrics().summary().reads, 1);
}

#[tokio::test]
async fn test_hotel_occupancy_full_on_third_booking() {
    let (_, jsondb) = seeded();

    for id in ["book_1", "book_2"] {
        jsondb
            .mutate_data(Some("booking"), move |db| {
                db.bookings.push(hotel_booking(id));
                Ok(())
            })
            .await
            .unwrap();
    }

    let err = jsondb
        .mutate_data(Some("booking"), |db| {
            db.bookings.push(hotel_booking("book_3"));
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(rule_code(&err), "HOTEL_OCCUPANCY_FULL");

    let db = jsondb.read_data().await.unwrap();
    assert_eq!(db.bookings.len(), 2);
}

#[tokio::test]
async fn test_tour_occupancy_full_after_capacity_reached() {
    let (_, jsondb) = seeded();

    jsondb
        .mutate_data(Some("booking"), |db| {
            db.bookings.push(tour_booking("book_1", 5));
            Ok(())
        })
        .await
        .unwrap();

    let err = jsondb
        .mutate_data(Some("booking"), |db| {
            db.bookings.push(tour_booking("book_2", 1));
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(rule_code(&err), "TOUR_OCCUPANCY_FULL");
}

#[tokio::test]
async fn test_cancellation_frees_tour_capacity() {
    let (_, jsondb) = seeded();
    jsondb
        .mutate_data(Some("booking"), |db| {
            db.bookings.push(tour_booking("book_1", 5));
            Ok(())
        })
        .await
        .unwrap();

    jsondb
        .mutate_data(Some("booking-status"), |db| {
            if let Some(booking) = db.booking_mut("book_1") {
                booking.status = BookingStatus::Cancelled;
            }
            db.bookings.push(tour_booking("book_2", 3));
            Ok(())
        })
        .await
        .unwrap();

    let db = jsondb.read_data().await.unwrap();
    assert_eq!(db.bookings.len(), 2);
}

#[tokio::test]
async fn test_confirmed_order_consumes_stock_and_cancellation_restores_it() {
    let (store, jsondb) = seeded();

    let db = jsondb
        .mutate_data(Some("food"), |db| {
            db.food_orders.push(food_order("food_o1", 3, BookingStatus::Confirmed));
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(db.menu_items[0].stock, Some(0));
    assert!(!db.menu_items[0].available);

    let reread = jsondb.read_data().await.unwrap();
    assert_eq!(reread.menu_items[0].stock, Some(0));
    assert!(!reread.menu_items[0].available);
    assert_eq!(reread.restaurants[0].menu[0].stock, Some(0));

    let writes = store.write_count().await;
    let err = jsondb
        .mutate_data(Some("food"), |db| {
            db.food_orders.push(food_order("food_o2", 1, BookingStatus::Confirmed));
            Ok(())
        })
        .await
        .unwrap_err();
    assert_eq!(rule_code(&err), "OUT_OF_STOCK_FOR_CONFIRMED_ORDER:M1");
    assert_eq!(store.write_count().await, writes);

    let db = jsondb
        .mutate_data(Some("food-status"), |db| {
            if let Some(order) = db.food_order_mut("food_o1") {
                order.status = BookingStatus::Cancelled;
            }
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(db.menu_items[0].stock, Some(3));
    assert!(db.menu_items[0].available);
}

#[tokio::test]
async fn test_pending_order_does_not_touch_stock() {
    let (_, jsondb) = seeded();
    let db = jsondb
        .mutate_data(Some("food"), |db| {
            db.food_orders.push(food_order("food_o1", 3, BookingStatus::Pending));
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(db.menu_items[0].stock, Some(3));
    assert!(db.menu_items[0].available);
}

#[tokio::test]
async fn test_rejected_booking_leaves_document_unchanged() {
    let (store, jsondb) = seeded();
    for id in ["book_1", "book_2"] {
        jsondb
            .mutate_data(Some("booking"), move |db| {
                db.bookings.push(hotel_booking(id));
                Ok(())
            })
            .await
            .unwrap();
    }
    let before = jsondb.read_data().await.unwrap();
    let writes = store.write_count().await;

    let result = jsondb
        .mutate_data(Some("booking"), |db| {
            db.bookings.push(hotel_booking("book_3"));
            if let Some(hotel) = db.hotel_mut("hotel_h1") {
                hotel.availability.closed_dates.insert(date(5, 1));
            }
            Ok(())
        })
        .await;
    assert!(result.is_err());

    let after = jsondb.read_data().await.unwrap();
    assert_eq!(after, before);
    assert_eq!(after.hotels[0].availability, before.hotels[0].availability);
    assert_eq!(store.write_count().await, writes);
    assert_eq!(jsondb.metrics().summary().rule_rejections, 1);
}

#[tokio::test]
async fn test_mutator_error_writes_nothing() {
    let (store, jsondb) = seeded();
    let before = jsondb.read_data().await.unwrap();

    let err = jsondb
        .mutate_data(Some("booking"), |db| {
            db.bookings.push(hotel_booking("book_1"));
            db.menu_items[0].stock = Some(99);
            Err(AppError::Validation("guest name required".into()))
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(store.write_count().await, 0);
    assert_eq!(jsondb.read_data().await.unwrap(), before);
}

#[tokio::test]
async fn test_only_changed_rows_are_written() {
    let (store, jsondb) = seeded();
    jsondb
        .mutate_data(Some("booking"), |db| {
            db.bookings.push(hotel_booking("book_1"));
            Ok(())
        })
        .await
        .unwrap();

    // Seeded tables untouched by the mutation keep their seeded rows only
    assert_eq!(store.rows("tours").await.len(), 1);
    assert_eq!(store.rows("bookings").await.len(), 1);
    assert_eq!(store.write_count().await, 1);
}

#[tokio::test]
async fn test_removed_rows_are_deleted() {
    let (store, jsondb) = seeded();
    jsondb
        .mutate_data(Some("query"), |db| {
            for id in ["q1", "q2"] {
                db.queries.push(SupportQuery {
                    id: id.into(),
                    name: None,
                    email: None,
                    phone: None,
                    message: "Need help".into(),
                    status: "open".into(),
                    created_at: Utc::now(),
                });
            }
            Ok(())
        })
        .await
        .unwrap();

    jsondb
        .mutate_data(Some("query"), |db| {
            db.queries.retain(|query| query.id != "q1");
            Ok(())
        })
        .await
        .unwrap();

    let rows = store.rows("queries").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], "q2");
}

#[tokio::test]
async fn test_audit_log_is_append_only() {
    let (store, jsondb) = seeded();
    jsondb
        .mutate_data(Some("admin"), |db| {
            AuditLogger::log(db, AuditRecord::new("hotel_updated", "hotel", "hotel_h1"));
            Ok(())
        })
        .await
        .unwrap();

    // Editing an existing entry in memory never reaches the table
    jsondb
        .mutate_data(Some("admin"), |db| {
            db.audit_log[0].action = "rewritten".into();
            AuditLogger::log(db, AuditRecord::new("tour_updated", "tour", "tour_t1"));
            Ok(())
        })
        .await
        .unwrap();

    let rows = store.rows("audit_log").await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|row| row["action"] == "hotel_updated"));
    assert!(rows.iter().all(|row| row["action"] != "rewritten"));
}

#[tokio::test]
async fn test_replace_all_never_wipes_with_empty_set() {
    let mut seed = marketplace();
    seed.service_areas = vec![ServiceArea {
        city: "Kochi".into(),
        state: Some("Kerala".into()),
        services: vec!["cab".into()],
        active: true,
    }];
    let (store, jsondb) = open(MemoryStore::seeded(&seed).unwrap());

    jsondb
        .mutate_data(Some("service-areas"), |db| {
            db.service_areas.clear();
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(store.rows("service_areas").await.len(), 1);

    jsondb
        .mutate_data(Some("service-areas"), |db| {
            db.service_areas = vec![ServiceArea {
                city: "Munnar".into(),
                state: Some("Kerala".into()),
                services: vec!["tour".into()],
                active: true,
            }];
            Ok(())
        })
        .await
        .unwrap();
    let rows = store.rows("service_areas").await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["city"], "Munnar");
}

#[tokio::test]
async fn test_missing_column_is_stripped_and_retried_once() {
    let columns = [
        "id",
        "type",
        "item_id",
        "item_name",
        "status",
        "user_id",
        "customer_name",
        "email",
        "phone",
        "check_in",
        "check_out",
        "room_type",
        "num_rooms",
        "tour_date",
        "guests",
        "pricing",
        "created_at",
    ];
    let store = MemoryStore::seeded(&marketplace()).unwrap().with_columns("bookings", &columns);
    let (store, jsondb) = open(store);

    jsondb
        .mutate_data(Some("booking"), |db| {
            let mut booking = hotel_booking("book_1");
            booking.updated_at = Some(Utc::now());
            db.bookings.push(booking);
            Ok(())
        })
        .await
        .unwrap();

    let rows = store.rows("bookings").await;
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].contains_key("updated_at"));
    assert_eq!(jsondb.metrics().summary().schema_drift_recoveries, 1);

    let db = jsondb.read_data().await.unwrap();
    assert_eq!(db.bookings[0].updated_at, None);
}

#[tokio::test]
async fn test_missing_conflict_key_column_is_not_retried() {
    let store = MemoryStore::seeded(&marketplace()).unwrap().with_columns("queries", &["message"]);
    let (_, jsondb) = open(store);

    let err = jsondb
        .mutate_data(Some("query"), |db| {
            db.queries.push(SupportQuery {
                id: "q1".into(),
                name: None,
                email: None,
                phone: None,
                message: "hi".into(),
                status: "open".into(),
                created_at: Utc::now(),
            });
            Ok(())
        })
        .await
        .unwrap_err();

    match err {
        AppError::Persist(err) => {
            assert_eq!(err.failed_table, "queries");
            assert!(matches!(err.source, StoreError::MissingColumn { ref column, .. } if column == "id"));
        }
        other => panic!("expected persist error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_optional_table_degrades_to_empty() {
    let store = MemoryStore::seeded(&marketplace()).unwrap().without_table("site_pages");
    let (_, jsondb) = open(store);

    let db = jsondb.read_data().await.unwrap();
    assert!(db.site_pages.is_empty());

    jsondb
        .mutate_data(Some("cms"), |db| {
            db.site_pages.push(SitePage {
                slug: "about".into(),
                title: Some("About".into()),
                content: json!({"body": "hello"}),
                published: true,
                updated_at: None,
            });
            Ok(())
        })
        .await
        .unwrap();
    assert!(jsondb.read_data().await.unwrap().site_pages.is_empty());
}

#[tokio::test]
async fn test_missing_required_table_fails_read() {
    let store = MemoryStore::seeded(&marketplace()).unwrap().without_table("bookings");
    let (_, jsondb) = open(store);

    let err = jsondb.read_data().await.unwrap_err();
    assert!(matches!(err, AppError::Storage(StoreError::MissingTable { ref table }) if table == "bookings"));
    assert_eq!(jsondb.metrics().summary().read_failures, 1);
}

#[tokio::test]
async fn test_partial_write_reports_committed_and_pending_tables() {
    let (store, jsondb) = seeded();
    store.fail_writes_to("food_orders").await;

    let err = jsondb
        .mutate_data(Some("checkout"), |db| {
            db.bookings.push(tour_booking("book_1", 2));
            db.food_orders.push(food_order("food_o1", 1, BookingStatus::Pending));
            AuditLogger::log(db, AuditRecord::new("checkout", "food_order", "food_o1"));
            Ok(())
        })
        .await
        .unwrap_err();

    let err = match err {
        AppError::Persist(err) => err,
        other => panic!("expected persist error, got {:?}", other),
    };
    assert_eq!(err.failed_table, "food_orders");
    assert_eq!(err.committed_tables, vec!["bookings".to_string()]);
    assert_eq!(err.pending_tables, vec!["audit_log".to_string()]);
    assert_eq!(err.row_keys, vec!["food_o1".to_string()]);

    // Earlier tables hold the new state, later ones the old
    let db = jsondb.read_data().await.unwrap();
    assert_eq!(db.bookings.len(), 1);
    assert!(db.food_orders.is_empty());
    assert!(db.audit_log.is_empty());
    assert_eq!(jsondb.metrics().summary().persist_failures, 1);
}

#[tokio::test]
async fn test_write_timeout_allows_fast_writes() {
    let store = Arc::new(MemoryStore::seeded(&marketplace()).unwrap());
    let jsondb = JsonDb::new(
        store.clone(),
        JsonDbOptions { write_timeout: Some(std::time::Duration::from_secs(5)), ..options() },
    );

    // Generous timeout: the write completes normally
    jsondb
        .mutate_data(Some("booking"), |db| {
            db.bookings.push(hotel_booking("book_1"));
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(store.rows("bookings").await.len(), 1);
}

/// Delegates to a MemoryStore, stalling upserts to one table
struct SlowStore {
    inner: Arc<MemoryStore>,
    slow_table: &'static str,
    delay: std::time::Duration,
}

#[async_trait::async_trait]
impl RemoteStore for SlowStore {
    async fn select_page(
        &self,
        table: &str,
        order_by: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>, StoreError> {
        self.inner.select_page(table, order_by, offset, limit).await
    }

    async fn upsert(&self, table: &str, rows: &[Row], conflict_key: &str) -> Result<(), StoreError> {
        if table == self.slow_table {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.upsert(table, rows, conflict_key).await
    }

    async fn insert_ignore_duplicates(
        &self,
        table: &str,
        rows: &[Row],
        conflict_key: &str,
    ) -> Result<(), StoreError> {
        self.inner.insert_ignore_duplicates(table, rows, conflict_key).await
    }

    async fn delete_where(&self, table: &str, filter: &DeleteFilter) -> Result<(), StoreError> {
        self.inner.delete_where(table, filter).await
    }

    fn backend_name(&self) -> &'static str {
        "slow"
    }
}

#[tokio::test]
async fn test_write_timeout_reports_failed_and_pending_tables() {
    let inner = Arc::new(MemoryStore::seeded(&marketplace()).unwrap());
    let store = SlowStore {
        inner: inner.clone(),
        slow_table: "bookings",
        delay: std::time::Duration::from_millis(200),
    };
    let jsondb = JsonDb::new(
        Arc::new(store),
        JsonDbOptions { write_timeout: Some(std::time::Duration::from_millis(20)), ..options() },
    );

    let err = jsondb
        .mutate_data(Some("booking"), |db| {
            db.bookings.push(hotel_booking("book_1"));
            AuditLogger::log(db, AuditRecord::new("booking_created", "booking", "book_1"));
            Ok(())
        })
        .await
        .unwrap_err();

    let err = match err {
        AppError::Persist(err) => err,
        other => panic!("expected persist error, got {:?}", other),
    };
    assert_eq!(err.failed_table, "bookings");
    assert!(err.committed_tables.is_empty());
    assert_eq!(err.pending_tables, vec!["audit_log".to_string()]);
    assert_eq!(err.row_keys, vec!["book_1".to_string()]);
    assert!(matches!(err.source, StoreError::Timeout { ref table } if table == "bookings"));

    // Nothing landed: the stalled write was dropped and audit_log never started
    assert!(inner.rows("bookings").await.is_empty());
    assert!(inner.rows("audit_log").await.is_empty());
    assert_eq!(jsondb.metrics().summary().persist_failures, 1);
}

#[tokio::test]
async fn test_backups_are_rate_limited_per_label() {
    let store = Arc::new(MemoryStore::seeded(&marketplace()).unwrap());
    let jsondb = JsonDb::new(
        store.clone(),
        JsonDbOptions { backup_interval: Some(std::time::Duration::from_secs(600)), ..options() },
    );

    for id in ["q1", "q2"] {
        jsondb
            .mutate_data(Some("query"), move |db| {
                db.queries.push(SupportQuery {
                    id: id.into(),
                    name: None,
                    email: None,
                    phone: None,
                    message: "hello".into(),
                    status: "open".into(),
                    created_at: Utc::now(),
                });
                Ok(())
            })
            .await
            .unwrap();
    }

    let backups = store.rows("backups").await;
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0]["label"], "query");
    assert!(backups[0]["snapshot"]["menuItems"].is_array());
    assert_eq!(jsondb.metrics().summary().backups_written, 1);
}

#[tokio::test]
async fn test_analytics_label_skips_rules_and_backups() {
    // Historical overbooking that would fail re-validation if it were touched
    let mut seed = marketplace();
    seed.bookings = vec![hotel_booking("book_1"), hotel_booking("book_2"), hotel_booking("book_3")];
    let store = Arc::new(MemoryStore::seeded(&seed).unwrap());
    let jsondb = JsonDb::new(
        store.clone(),
        JsonDbOptions { backup_interval: Some(std::time::Duration::from_secs(600)), ..options() },
    );

    let db = jsondb
        .mutate_data(Some("analytics:view"), |db| {
            db.analytics_events.push(AnalyticsEvent {
                id: "evt_1".into(),
                user_key: Some("visitor_1".into()),
                event: "view".into(),
                category: Some("tours".into()),
                metadata: json!({}),
                created_at: Utc::now(),
            });
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(db.behavior_profiles.len(), 1);
    assert_eq!(db.behavior_profiles[0].top_category.as_deref(), Some("tours"));
    assert!(store.rows("backups").await.is_empty());
}

#[tokio::test]
async fn test_serialized_writes_keep_both_changes() {
    let store = Arc::new(MemoryStore::seeded(&marketplace()).unwrap());
    let jsondb = Arc::new(JsonDb::new(store.clone(), JsonDbOptions { serialize_writes: true, ..options() }));

    let tasks: Vec<_> = ["q1", "q2", "q3"]
        .into_iter()
        .map(|id| {
            let jsondb = jsondb.clone();
            tokio::spawn(async move {
                jsondb
                    .mutate_data(Some("query"), move |db| {
                        db.queries.push(SupportQuery {
                            id: id.into(),
                            name: None,
                            email: None,
                            phone: None,
                            message: "hello".into(),
                            status: "open".into(),
                            created_at: Utc::now(),
                        });
                        Ok(())
                    })
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(jsondb.read_data().await.unwrap().queries.len(), 3);
}

#[tokio::test]
async fn test_rule_violation_is_typed() {
    let (_, jsondb) = seeded();
    let err = jsondb
        .mutate_data(Some("booking"), |db| {
            let mut booking = hotel_booking("book_1");
            booking.room_type = Some("Suite".into());
            db.bookings.push(booking);
            Ok(())
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Rule(RuleViolation::RoomTypeUnavailable { ref room_type, .. }) if room_type == "Suite"
    ));
}

#[test]
fn test_plan_table_modes() {
    let row = |id: &str, status: &str| -> Row { json!({"id": id, "status": status}).as_object().cloned().unwrap() };

    let plan = plan_table(&tables::QUERIES, &[row("a", "open"), row("b", "open")], vec![row("a", "closed")]);
    assert_eq!(
        plan,
        Some(TablePlan::Upsert { rows: vec![row("a", "closed")], removed: vec![json!("b")] })
    );

    assert_eq!(plan_table(&tables::QUERIES, &[row("a", "open")], vec![row("a", "open")]), None);

    let plan = plan_table(&tables::AUDIT_LOG, &[row("a", "x")], vec![row("a", "y"), row("b", "x")]);
    assert_eq!(plan, Some(TablePlan::Append { rows: vec![row("b", "x")] }));

    let city = |name: &str| -> Row { json!({"city": name}).as_object().cloned().unwrap() };
    assert_eq!(plan_table(&tables::SERVICE_AREAS, &[city("Kochi")], vec![]), None);
    assert_eq!(
        plan_table(&tables::SERVICE_AREAS, &[city("Kochi")], vec![city("Goa")]),
        Some(TablePlan::Replace { rows: vec![city("Goa")] })
    );
}
