//! # Validation Module
//!
//! Input validation utilities for Smart POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractor (axum Json)                                   │
//! │  └── Type validation (deserialization)                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Service (Rust)                                               │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (stock >= 0) constraints                         │
//! │  ├── UNIQUE constraints (sku, email, config key)                       │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_LINE_ITEMS, MAX_PRICE_CENTS, MAX_STOCK_LEVEL};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use smartpos_core::validation::validate_sku;
///
/// assert!(validate_sku("COKE-330").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a non-empty display name (product, supplier, user).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an e-mail address.
///
/// Deliberately shallow: one `@`, non-empty local part, a dot in the domain.
///
/// ## Example
/// ```rust
/// use smartpos_core::validation::validate_email;
///
/// assert!(validate_email("manager@pos.com").is_ok());
/// assert!(validate_email("manager").is_err());
/// assert!(validate_email("a@b").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a password chosen at registration or account creation.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }

    if password.chars().count() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
/// - At most MAX_PRICE_CENTS
///
/// ## Example
/// ```rust
/// use smartpos_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("price", 1099).is_ok());
/// assert!(validate_price_cents("price", 0).is_ok());
/// assert!(validate_price_cents("price", -100).is_err());
/// assert!(validate_price_cents("price", i64::MAX / 2).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a stock level or threshold (0 ..= MAX_STOCK_LEVEL).
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    if !(0..=MAX_STOCK_LEVEL).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_LEVEL,
        });
    }

    Ok(())
}

/// Error for a computed amount (subtotal, total) that overflows `i64` cents.
pub fn amount_out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

/// Validates pagination parameters.
pub fn validate_page(limit: i64, offset: i64) -> ValidationResult<()> {
    if !(1..=1000).contains(&limit) {
        return Err(ValidationError::OutOfRange {
            field: "limit".to_string(),
            min: 1,
            max: 1000,
        });
    }

    if offset < 0 {
        return Err(ValidationError::OutOfRange {
            field: "offset".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a sale or order.
///
/// ## Rules
/// - At least one line
/// - At most MAX_LINE_ITEMS
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
