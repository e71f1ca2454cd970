//! # API Error Type
//!
//! What the client receives when an operation fails.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Smart POS                              │
//! │                                                                         │
//! │  Service operation                                                      │
//! │  Result<T, ApiError>                                                    │
//! │         │                                                               │
//! │         ├── CoreError::Unauthenticated ──► UNAUTHENTICATED        401   │
//! │         ├── CoreError::Forbidden       ──► FORBIDDEN              403   │
//! │         ├── CoreError/DbError NotFound ──► NOT_FOUND              404   │
//! │         ├── validation, duplicate key,                                  │
//! │         │   bad transition, low stock  ──► BAD_USER_INPUT         400   │
//! │         └── pool, query, migration     ──► INTERNAL_SERVER_ERROR  500   │
//! │                                           (details logged, not sent)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! { "code": "NOT_FOUND", "message": "Product not found: 42" }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use smartpos_core::CoreError;
use smartpos_db::DbError;

/// API error returned from every operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No valid session (401)
    Unauthenticated,

    /// Session lacks the required role (403)
    Forbidden,

    /// Referenced entity does not exist (404)
    NotFound,

    /// Invalid field, duplicate key, invalid transition, insufficient stock (400)
    BadUserInput,

    /// Infrastructure fault (500)
    InternalServerError,
}

impl ErrorCode {
    pub const fn status(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::BadUserInput => StatusCode::BAD_REQUEST,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id.to_string()),
        )
    }

    pub fn bad_input(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BadUserInput, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthenticated, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InternalServerError, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => {
                ApiError::bad_input(format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::bad_input("Invalid reference")
            }
            err @ DbError::InsufficientStock { .. } => ApiError::bad_input(err.to_string()),
            err @ DbError::StaleState { .. } => ApiError::bad_input(err.to_string()),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::internal("Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::internal("Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::internal("Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::internal("Database transaction failed")
            }
            DbError::PoolExhausted => ApiError::internal("Database pool exhausted"),
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::internal("Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Unauthenticated => ApiError::unauthenticated("Authentication required"),
            CoreError::Forbidden => ApiError::new(ErrorCode::Forbidden, "Insufficient permissions"),
            CoreError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            CoreError::Validation(e) => ApiError::bad_input(e.to_string()),
            other => ApiError::bad_input(other.to_string()),
        }
    }
}

impl From<smartpos_core::ValidationError> for ApiError {
    fn from(err: smartpos_core::ValidationError) -> Self {
        ApiError::bad_input(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
