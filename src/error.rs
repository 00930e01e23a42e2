// Error handling module for the marketplace API
// Provides the crate-wide error type and its HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};
use utoipa::ToSchema;

use crate::business_rules::RuleViolation;
use crate::config::ConfigError;
use crate::document::SchemaError;
use crate::jsondb::{PersistError, StoreError};

/// Main error type for the API
/// All handlers and mutators return Result<T, AppError>
#[derive(Debug, Error)]
pub enum AppError {
    /// Operational rule rejected the change (capacity, availability, stock)
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    #[error("{0}")]
    NotFound(String),

    /// Business-level validation failure (coupons, quantities, dates)
    #[error("{0}")]
    Validation(String),

    /// Request DTO failed field validation
    #[error("request validation failed")]
    InvalidInput(#[from] validator::ValidationErrors),

    #[error("{0}")]
    InvalidTransition(String),

    /// Duplicate or contended resource, e.g. an already booked seat
    #[error("{message}")]
    Conflict { code: String, message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error("{0}")]
    Internal(String),
}

/// Consistent error response structure
///
/// `error_code` is machine-readable, `message` human-readable. Server-side
/// failures carry the raw error in `details` for operator diagnosis.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = "TOUR_OCCUPANCY_FULL")]
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
    pub timestamp: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = self.to_error_response();
        (status, Json(error_response)).into_response()
    }
}

impl AppError {
    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::NotFound(format!("{} with id {} not found", resource, id))
    }

    pub fn conflict(code: &str, message: impl Into<String>) -> Self {
        AppError::Conflict { code: code.to_string(), message: message.into() }
    }

    /// Machine-readable code for this error
    pub fn error_code(&self) -> String {
        match self {
            AppError::Rule(violation) => violation.code(),
            AppError::NotFound(_) => "NOT_FOUND".to_string(),
            AppError::Validation(_) | AppError::InvalidInput(_) => "VALIDATION_ERROR".to_string(),
            AppError::InvalidTransition(_) => "INVALID_STATUS_TRANSITION".to_string(),
            AppError::Conflict { code, .. } => code.clone(),
            AppError::Schema(_) => "SCHEMA_ERROR".to_string(),
            AppError::Configuration(_) => "CONFIGURATION_ERROR".to_string(),
            AppError::Storage(_) => "STORAGE_ERROR".to_string(),
            AppError::Persist(_) => "PARTIAL_PERSIST".to_string(),
            AppError::Internal(_) => "INTERNAL_ERROR".to_string(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Rule(violation) => violation.status_code(),
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidInput(_) | AppError::InvalidTransition(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Schema(_)
            | AppError::Configuration(_)
            | AppError::Storage(_)
            | AppError::Persist(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::InvalidInput(errors) => Some(serde_json::to_value(errors).unwrap_or_else(|_| json!({}))),
            AppError::Schema(err) => Some(json!({
                "collection": err.collection,
                "id": err.id,
                "error": err.message,
            })),
            AppError::Storage(err) => Some(json!({ "table": err.table(), "error": err.to_string() })),
            AppError::Persist(err) => Some(json!({
                "failedTable": err.failed_table,
                "committedTables": err.committed_tables,
                "pendingTables": err.pending_tables,
                "rowKeys": err.row_keys,
                "error": err.source.to_string(),
            })),
            AppError::Configuration(_) | AppError::Internal(_) => Some(json!({ "error": self.to_string() })),
            _ => None,
        }
    }

    /// Convert AppError to HTTP status code and ErrorResponse
    ///
    /// Client errors log at debug/warn, server errors at error.
    fn to_error_response(&self) -> (StatusCode, ErrorResponse) {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            error!("{}: {}", error_code, self);
        } else if status == StatusCode::CONFLICT {
            warn!("Conflict {}: {}", error_code, self);
        } else {
            debug!("Client error {}: {}", error_code, self);
        }

        let message = match self {
            AppError::Persist(_) => "Changes were only partially saved".to_string(),
            AppError::Storage(_) => "A storage error occurred".to_string(),
            AppError::Internal(_) | AppError::Configuration(_) | AppError::Schema(_) => {
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            ErrorResponse {
                error_code,
                message,
                details: self.details(),
                timestamp: Utc::now().to_rfc3339(),
            },
        )
    }
}
