//! # smartpos-core: Pure Business Logic for Smart POS
//!
//! This crate is the **heart** of Smart POS. It contains all business rules
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Smart POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web Client                                   │   │
//! │  │    POS Panel ──► Inventory Panel ──► Admin Panel                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP + JSON (Bearer JWT)               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    smartpos-api (axum)                          │   │
//! │  │    record_sale, approve_order, sales_analytics, etc.            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ smartpos-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  access  │ │   sale   │ │  order   │ │    analytics     │  │   │
//! │  │   │ role gate│ │ planning │ │ lifecycle│ │ sales/inventory  │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  types   │ │  money   │ │ receipt  │ │   notification   │  │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  smartpos-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Transaction, Order, User, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//! - [`catalog`] - Product and supplier create/update inputs
//! - [`access`] - Role hierarchy and access gate
//! - [`sale`] - Sale planning (stock checks, totals)
//! - [`order`] - Purchase-order lifecycle
//! - [`analytics`] - Sales and inventory aggregation
//! - [`receipt`] - Receipt assembly
//! - [`notification`] - Outbound message builders
//!
//! ## Example Usage
//!
//! ```rust
//! use smartpos_core::receipt::receipt_number;
//! use smartpos_core::money::Money;
//!
//! assert_eq!(receipt_number(42), "RCP-000042");
//!
//! let line = Money::from_cents(299).multiply_quantity(3);
//! assert_eq!(line.cents(), 897);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod analytics;
pub mod catalog;
pub mod error;
pub mod money;
pub mod notification;
pub mod order;
pub mod receipt;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use smartpos_core::Money` instead of
// `use smartpos_core::money::Money`

pub use access::Actor;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines allowed in a single sale or purchase order.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 10000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest accepted unit price or cost, in cents (10,000,000.00).
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Largest accepted stock level or low-stock threshold.
pub const MAX_STOCK_LEVEL: i64 = 1_000_000_000;

/// Default page size for transaction listings.
pub const DEFAULT_TRANSACTION_PAGE: i64 = 50;

/// Default page size for audit log listings.
pub const DEFAULT_AUDIT_PAGE: i64 = 100;
