//! # smartpos-db: Database Layer for Smart POS
//!
//! This crate provides database access for the Smart POS backend.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Smart POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Service (gate + smartpos-core planning)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   smartpos-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │ 001_schema   │  │   │
//! │  │   │ SqlitePool    │◄───│ Transaction.. │    │ 002_roles    │  │   │
//! │  │   │ Connection    │    │ OrderRepo     │    │              │  │   │
//! │  │   │ Management    │    │ AuditRepo ... │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │                     ./smartpos.db                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smartpos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./smartpos.db")).await?;
//!
//! let low = db.products().low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::{AuditRepository, NewAuditEntry};
pub use repository::config::ConfigRepository;
pub use repository::notification::NotificationOutboxRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
pub use repository::role::RoleRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::transaction::{RecordedSale, TransactionRepository};
pub use repository::user::{NewUser, UserRepository};
