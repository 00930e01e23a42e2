use std::sync::Arc;

use travel_market::config::{AppConfig, StoreBackend};
use travel_market::jsondb::{create_pool, JsonDb, MemoryStore, PgStore, RemoteStore};
use travel_market::{create_router, AppState};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Travel Marketplace API - Starting...");

    // Missing configuration is fatal and not retried
    let config = AppConfig::from_env().expect("Invalid configuration");

    let store: Arc<dyn RemoteStore> = match config.backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set in environment");

            tracing::info!("Connecting to database...");
            let pool = create_pool(database_url, config.max_connections, config.acquire_timeout)
                .await
                .expect("Failed to create database pool");

            tracing::info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Migrations completed successfully");

            Arc::new(PgStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let db = Arc::new(JsonDb::new(store, config.store_options()));

    // Fail at startup rather than on the first request if the stored document is unreadable
    if let Err(err) = db.read_data().await {
        tracing::error!(error = %err, "Initial document load failed");
        std::process::exit(1);
    }

    let app = create_router(AppState::new(db));

    let addr = config.address();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Travel Marketplace API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
