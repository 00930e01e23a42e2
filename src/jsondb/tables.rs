// Relational table declarations
//
// One table per top-level collection. `PERSIST_ORDER` is the fixed sequence
// writes are issued in; reads use the same list (plus backups, which are
// write-only).

/// How a mutation's rows reach a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Upsert changed rows on the conflict key, delete removed keys
    Upsert,
    /// Insert new rows only, ignoring duplicates; never update or delete
    AppendOnly,
    /// Delete everything then insert the full set; skipped when the set is empty
    ReplaceAll,
}

/// Fallback a JSON column decodes to when it is absent or unreadable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    List,
    Object,
    Nullable,
}

impl JsonShape {
    pub fn empty(&self) -> serde_json::Value {
        match self {
            JsonShape::List => serde_json::Value::Array(Vec::new()),
            JsonShape::Object => serde_json::Value::Object(serde_json::Map::new()),
            JsonShape::Nullable => serde_json::Value::Null,
        }
    }

    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            JsonShape::List => value.is_array(),
            JsonShape::Object => value.is_object(),
            JsonShape::Nullable => value.is_object() || value.is_null(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    /// Document collection name, used in schema errors
    pub collection: &'static str,
    pub conflict_key: &'static str,
    pub order_by: &'static str,
    pub mode: WriteMode,
    pub json_columns: &'static [(&'static str, JsonShape)],
    /// Table belongs to an optional feature and may be absent on older schemas
    pub optional: bool,
}

impl TableSpec {
    pub fn json_shape(&self, column: &str) -> Option<JsonShape> {
        self.json_columns
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, shape)| *shape)
    }
}

const fn table(name: &'static str, collection: &'static str) -> TableSpec {
    TableSpec {
        name,
        collection,
        conflict_key: "id",
        order_by: "id",
        mode: WriteMode::Upsert,
        json_columns: &[],
        optional: false,
    }
}

// Catalog
pub const TOURS: TableSpec = TableSpec {
    json_columns: &[("availability", JsonShape::Object), ("images", JsonShape::List)],
    ..table("tours", "tours")
};
pub const HOTELS: TableSpec = TableSpec {
    json_columns: &[
        ("room_types", JsonShape::List),
        ("availability", JsonShape::Object),
        ("amenities", JsonShape::List),
    ],
    ..table("hotels", "hotels")
};
pub const RESTAURANTS: TableSpec = TableSpec {
    json_columns: &[("menu", JsonShape::List)],
    ..table("restaurants", "restaurants")
};
pub const MENU_ITEMS: TableSpec = table("menu_items", "menuItems");
pub const VENDOR_MENUS: TableSpec = TableSpec {
    conflict_key: "restaurant_id",
    order_by: "restaurant_id",
    json_columns: &[("items", JsonShape::List)],
    optional: true,
    ..table("vendor_menus", "vendorMenus")
};

// Transactions
pub const BOOKINGS: TableSpec = TableSpec {
    json_columns: &[("pricing", JsonShape::Nullable)],
    ..table("bookings", "bookings")
};
pub const FOOD_ORDERS: TableSpec = TableSpec {
    json_columns: &[("items", JsonShape::List), ("pricing", JsonShape::Nullable)],
    ..table("food_orders", "foodOrders")
};
pub const CAB_BOOKINGS: TableSpec = TableSpec {
    json_columns: &[("pricing", JsonShape::Nullable)],
    ..table("cab_bookings", "cabBookings")
};
pub const BUS_BOOKINGS: TableSpec = TableSpec {
    json_columns: &[("seats", JsonShape::List), ("pricing", JsonShape::Nullable)],
    ..table("bus_bookings", "busBookings")
};

// Platform
pub const COUPONS: TableSpec = TableSpec {
    conflict_key: "code",
    order_by: "code",
    json_columns: &[("applies_to", JsonShape::List)],
    ..table("coupons", "coupons")
};
pub const SERVICE_AREAS: TableSpec = TableSpec {
    conflict_key: "city",
    order_by: "city",
    mode: WriteMode::ReplaceAll,
    json_columns: &[("services", JsonShape::List)],
    optional: true,
    ..table("service_areas", "serviceAreas")
};
pub const CAB_PROVIDERS: TableSpec = TableSpec {
    json_columns: &[("vehicle_types", JsonShape::List)],
    optional: true,
    ..table("cab_providers", "cabProviders")
};
pub const QUERIES: TableSpec = table("queries", "queries");
pub const SITE_PAGES: TableSpec = TableSpec {
    conflict_key: "slug",
    order_by: "slug",
    json_columns: &[("content", JsonShape::Nullable)],
    optional: true,
    ..table("site_pages", "sitePages")
};
pub const SETTINGS: TableSpec = TableSpec {
    json_columns: &[("tax_rules", JsonShape::Object)],
    ..table("settings", "settings")
};
pub const POLICIES: TableSpec = TableSpec { optional: true, ..table("policies", "policies") };
pub const PAYMENT_SETTINGS: TableSpec = TableSpec { optional: true, ..table("payment_settings", "payment") };

// Derived profiles
pub const USER_PROFILES: TableSpec = TableSpec {
    json_columns: &[("services", JsonShape::List), ("preferences", JsonShape::Nullable)],
    optional: true,
    ..table("user_profiles", "userProfiles")
};
pub const BEHAVIOR_PROFILES: TableSpec = TableSpec {
    json_columns: &[("event_counts", JsonShape::Object)],
    optional: true,
    ..table("behavior_profiles", "behaviorProfiles")
};

// Logs
pub const ANALYTICS_EVENTS: TableSpec = TableSpec {
    mode: WriteMode::AppendOnly,
    json_columns: &[("metadata", JsonShape::Nullable)],
    optional: true,
    ..table("analytics_events", "analyticsEvents")
};
pub const AUDIT_LOG: TableSpec = TableSpec {
    mode: WriteMode::AppendOnly,
    json_columns: &[("details", JsonShape::Nullable)],
    ..table("audit_log", "auditLog")
};

/// Point-in-time snapshots taken before mutations; never read back
pub const BACKUPS: TableSpec = TableSpec {
    mode: WriteMode::AppendOnly,
    json_columns: &[("snapshot", JsonShape::Object)],
    optional: true,
    ..table("backups", "backups")
};

/// Order tables are written in: catalog, transactions, platform, derived
/// profiles, logs. A partial failure leaves every earlier table on the new
/// state and every later one on the old.
pub const PERSIST_ORDER: &[TableSpec] = &[
    TOURS,
    HOTELS,
    RESTAURANTS,
    MENU_ITEMS,
    VENDOR_MENUS,
    BOOKINGS,
    FOOD_ORDERS,
    CAB_BOOKINGS,
    BUS_BOOKINGS,
    COUPONS,
    SERVICE_AREAS,
    CAB_PROVIDERS,
    QUERIES,
    SITE_PAGES,
    SETTINGS,
    POLICIES,
    PAYMENT_SETTINGS,
    USER_PROFILES,
    BEHAVIOR_PROFILES,
    ANALYTICS_EVENTS,
    AUDIT_LOG,
];

pub fn spec_for(name: &str) -> Option<&'static TableSpec> {
    PERSIST_ORDER.iter().find(|spec| spec.name == name)
}
