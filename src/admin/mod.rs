// Admin console: document snapshot, store metrics, stock, availability and tax rules

pub mod handlers;
pub mod models;
pub mod service;

pub use handlers::*;
pub use models::*;
pub use service::*;
