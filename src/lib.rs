pub mod admin;
pub mod bookings;
pub mod business_rules;
pub mod config;
pub mod document;
pub mod error;
pub mod jsondb;
pub mod orders;
pub mod rides;
pub mod validation;

use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use admin::AdminService;
use bookings::BookingService;
use jsondb::JsonDb;
use orders::FoodOrderService;
use rides::RideService;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        bookings::create_hotel_booking_handler,
        bookings::create_tour_booking_handler,
        bookings::get_booking_handler,
        bookings::update_booking_status_handler,
        orders::create_food_order_handler,
        orders::get_food_order_handler,
        orders::update_food_order_status_handler,
        rides::create_cab_booking_handler,
        rides::update_cab_status_handler,
        rides::create_bus_booking_handler,
        rides::update_bus_status_handler,
        admin::snapshot_handler,
        admin::metrics_handler,
        admin::update_stock_handler,
        admin::update_hotel_availability_handler,
        admin::update_tour_availability_handler,
        admin::update_tax_settings_handler,
    ),
    components(
        schemas(
            error::ErrorResponse,
            document::BookingStatus,
            bookings::ContactRequest,
            bookings::CreateHotelBookingRequest,
            bookings::CreateTourBookingRequest,
            orders::OrderLineRequest,
            orders::CreateFoodOrderRequest,
            orders::UpdateStatusRequest,
            rides::CreateCabBookingRequest,
            rides::CreateBusBookingRequest,
            admin::UpdateStockRequest,
            admin::UpdateHotelAvailabilityRequest,
            admin::UpdateTourAvailabilityRequest,
            admin::GstSlabRequest,
            admin::UpdateTaxSettingsRequest,
            admin::StoreStatusResponse,
            jsondb::MetricsSummary,
        )
    ),
    tags(
        (name = "bookings", description = "Hotel and tour bookings"),
        (name = "food", description = "Food orders"),
        (name = "rides", description = "Cab and bus bookings"),
        (name = "admin", description = "Admin console")
    ),
    info(
        title = "Travel Marketplace API",
        version = "1.0.0",
        description = "Tours, hotels, food delivery, cabs and buses over one consistent document store"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<JsonDb>,
    pub bookings: BookingService,
    pub orders: FoodOrderService,
    pub rides: RideService,
    pub admin: AdminService,
}

impl AppState {
    pub fn new(db: Arc<JsonDb>) -> Self {
        Self {
            bookings: BookingService::new(db.clone()),
            orders: FoodOrderService::new(db.clone()),
            rides: RideService::new(db.clone()),
            admin: AdminService::new(db.clone()),
            db,
        }
    }
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
pub fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Hotel and tour bookings
        .route("/api/bookings/hotel", post(bookings::create_hotel_booking_handler))
        .route("/api/bookings/tour", post(bookings::create_tour_booking_handler))
        .route("/api/bookings/:id", get(bookings::get_booking_handler))
        .route("/api/bookings/:id/status", patch(bookings::update_booking_status_handler))
        // Food
        .route("/api/food/orders", post(orders::create_food_order_handler))
        .route("/api/food/orders/:id", get(orders::get_food_order_handler))
        .route("/api/food/orders/:id/status", patch(orders::update_food_order_status_handler))
        // Cabs and buses
        .route("/api/cabs/bookings", post(rides::create_cab_booking_handler))
        .route("/api/cabs/bookings/:id/status", patch(rides::update_cab_status_handler))
        .route("/api/buses/bookings", post(rides::create_bus_booking_handler))
        .route("/api/buses/bookings/:id/status", patch(rides::update_bus_status_handler))
        // Admin
        .route("/api/admin/snapshot", get(admin::snapshot_handler))
        .route("/api/admin/metrics", get(admin::metrics_handler))
        .route("/api/admin/menu-items/:id/stock", put(admin::update_stock_handler))
        .route("/api/admin/hotels/:id/availability", put(admin::update_hotel_availability_handler))
        .route("/api/admin/tours/:id/availability", put(admin::update_tour_availability_handler))
        .route("/api/admin/settings/tax", put(admin::update_tax_settings_handler))
        .layer(cors)
        .with_state(state)
}
