//! # Error Types
//!
//! Domain-specific error types for smartpos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  smartpos-core errors (this file)                                      │
//! │  ├── CoreError        - Access, lookup and business rule failures      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  smartpos-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  smartpos-api errors                                                   │
//! │  └── ApiError         - What the client sees (code + message)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                            DbError ──┴──► ApiError → HTTP response     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Each variant maps onto one client-facing kind:
/// `Unauthenticated`, `Forbidden`, `NotFound`, or bad input (everything else).
#[derive(Debug, Error)]
pub enum CoreError {
    /// No authenticated actor on the request.
    #[error("Authentication required")]
    Unauthenticated,

    /// Actor is authenticated but lacks the required role or permission.
    #[error("Insufficient permissions")]
    Forbidden,

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Insufficient stock to complete sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Coca-Cola", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Status literal is not one of the known order statuses.
    #[error("Invalid order status: {0}")]
    InvalidOrderStatus(String),

    /// Order cannot move from its current status to the requested one.
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Request is well-formed but violates a business rule.
    #[error("{0}")]
    InvalidInput(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed email, unparseable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
