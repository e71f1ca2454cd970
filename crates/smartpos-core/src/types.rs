//! # Domain Types
//!
//! Core domain types used throughout Smart POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐   ┌──────────────┐   ┌────────────────────────┐      │
//! │  │    User      │──►│    Role      │   │     Supplier           │      │
//! │  │  email       │   │  RoleName    │   │  contact, email        │      │
//! │  │  name        │   │  permissions │   └──────────┬─────────────┘      │
//! │  └──────┬───────┘   └──────────────┘              │ supplies          │
//! │         │ rings up                                ▼                   │
//! │  ┌──────▼───────┐   ┌──────────────┐   ┌────────────────────────┐      │
//! │  │ Transaction  │──►│TransactionItm│──►│      Product           │      │
//! │  │ total_cents  │   │ qty × price  │   │  stock, threshold      │      │
//! │  └──────────────┘   └──────────────┘   └──────────▲─────────────┘      │
//! │                                                   │ restocks          │
//! │  ┌──────────────┐   ┌──────────────┐              │                   │
//! │  │    Order     │──►│  OrderItem   │──────────────┘                   │
//! │  │ OrderStatus  │   │ qty × unit   │                                  │
//! │  └──────────────┘   └──────────────┘                                  │
//! │                                                                         │
//! │  AuditLog (append-only)    SystemConfig (key/value)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every entity is keyed by a SQLite integer id. Business keys (`sku`,
//! `email`, config `key`) are unique but may change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Roles
// =============================================================================

/// The three staff roles, ordered by privilege.
///
/// ## Hierarchy
/// ```text
/// Cashier (1)  <  Manager (2)  <  Admin (3)
/// ```
/// The derived `Ord` follows declaration order, so `role >= RoleName::Manager`
/// is the minimum-role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Cashier,
    Manager,
    Admin,
}

impl RoleName {
    /// All roles, lowest privilege first.
    pub const ALL: [RoleName; 3] = [RoleName::Cashier, RoleName::Manager, RoleName::Admin];

    /// Numeric level in the hierarchy (cashier = 1).
    pub const fn level(&self) -> u8 {
        match self {
            RoleName::Cashier => 1,
            RoleName::Manager => 2,
            RoleName::Admin => 3,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            RoleName::Cashier => "cashier",
            RoleName::Manager => "manager",
            RoleName::Admin => "admin",
        }
    }

    /// Permissions granted to a freshly created role of this kind.
    ///
    /// Each role inherits everything the role below it can do.
    pub fn default_permissions(&self) -> Vec<String> {
        let cashier = [
            permissions::PRODUCTS_READ,
            permissions::SALES_CREATE,
            permissions::TRANSACTIONS_READ,
            permissions::RECEIPTS_SEND,
            permissions::ORDERS_CREATE,
        ];
        let manager = [
            permissions::INVENTORY_WRITE,
            permissions::SUPPLIERS_MANAGE,
            permissions::ORDERS_APPROVE,
            permissions::ANALYTICS_READ,
            permissions::CONFIG_READ,
        ];
        let admin = [
            permissions::USERS_MANAGE,
            permissions::ROLES_MANAGE,
            permissions::AUDIT_READ,
            permissions::CONFIG_WRITE,
        ];

        let granted: Vec<&str> = match self {
            RoleName::Cashier => cashier.to_vec(),
            RoleName::Manager => cashier.iter().chain(manager.iter()).copied().collect(),
            RoleName::Admin => cashier
                .iter()
                .chain(manager.iter())
                .chain(admin.iter())
                .copied()
                .collect(),
        };

        granted.into_iter().map(String::from).collect()
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cashier" => Ok(RoleName::Cashier),
            "manager" => Ok(RoleName::Manager),
            "admin" => Ok(RoleName::Admin),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: RoleName::ALL.iter().map(|r| r.to_string()).collect(),
            }),
        }
    }
}

/// Permission strings carried by roles.
pub mod permissions {
    pub const PRODUCTS_READ: &str = "products:read";
    pub const SALES_CREATE: &str = "sales:create";
    pub const TRANSACTIONS_READ: &str = "transactions:read";
    pub const RECEIPTS_SEND: &str = "receipts:send";
    pub const ORDERS_CREATE: &str = "orders:create";
    pub const INVENTORY_WRITE: &str = "inventory:write";
    pub const SUPPLIERS_MANAGE: &str = "suppliers:manage";
    pub const ORDERS_APPROVE: &str = "orders:approve";
    pub const ANALYTICS_READ: &str = "analytics:read";
    pub const CONFIG_READ: &str = "config:read";
    pub const USERS_MANAGE: &str = "users:manage";
    pub const ROLES_MANAGE: &str = "roles:manage";
    pub const AUDIT_READ: &str = "audit:read";
    pub const CONFIG_WRITE: &str = "config:write";
}

/// A named role with its permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Role {
    pub id: i64,
    pub name: RoleName,
    /// Ordered, duplicate-free permission strings.
    pub permissions: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Role {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

// =============================================================================
// User
// =============================================================================

/// A staff account. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Supplier
// =============================================================================

/// A vendor that products are reordered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    /// Contact person.
    pub contact: String,
    /// Purchase orders are e-mailed here.
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: i64,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub description: Option<String>,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Purchase cost in cents (inventory valuation).
    pub cost_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// At or below this level the product is "low stock".
    pub low_stock_threshold: i64,

    pub supplier_id: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// `stock ≤ low_stock_threshold`.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }

    /// Value of the units on hand at cost.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.cost().multiply_quantity(self.stock)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash payment.
    #[default]
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Mobile wallet / UPI.
    Mobile,
}

// =============================================================================
// Transaction
// =============================================================================

/// A completed sale. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: i64,
    /// Cashier who rang up the sale.
    pub user_id: i64,
    /// Σ item subtotals.
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_mobile: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Loaded separately from `transaction_items`.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<TransactionItem>,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line in a transaction.
/// Uses snapshot pattern to freeze product identity at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionItem {
    pub id: i64,
    pub transaction_id: i64,
    pub product_id: i64,
    /// SKU at time of sale (frozen).
    pub sku_snapshot: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale.
    pub price_cents: i64,
    /// price × quantity.
    pub subtotal_cents: i64,
}

impl TransactionItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Purchase Orders
// =============================================================================

/// Lifecycle state of a purchase order.
///
/// ```text
/// pending ──► approved ──► sent ──► received
/// ```
/// Transition rules live in [`crate::order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Sent,
    Received,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A purchase order placed with a supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: i64,
    pub supplier_id: i64,
    pub status: OrderStatus,
    /// Fixed at creation.
    pub total_cents: i64,
    pub approved_by: Option<i64>,
    #[ts(as = "Option<String>")]
    pub approved_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<OrderItem>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

// =============================================================================
// Audit Log
// =============================================================================

/// What an audited operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    UpdateStock,
    Approve,
    UpdateStatus,
    CreateUser,
    UpdateRole,
    DeleteUser,
    CreateRole,
    SetConfig,
    Register,
    Login,
}

/// Which kind of entity an audit entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "PascalCase"))]
#[ts(export)]
pub enum AuditEntity {
    Transaction,
    Order,
    Product,
    Supplier,
    User,
    Role,
    SystemConfig,
}

impl FromStr for AuditEntity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Transaction" => Ok(AuditEntity::Transaction),
            "Order" => Ok(AuditEntity::Order),
            "Product" => Ok(AuditEntity::Product),
            "Supplier" => Ok(AuditEntity::Supplier),
            "User" => Ok(AuditEntity::User),
            "Role" => Ok(AuditEntity::Role),
            "SystemConfig" => Ok(AuditEntity::SystemConfig),
            _ => Err(ValidationError::NotAllowed {
                field: "entity".to_string(),
                allowed: [
                    "Transaction",
                    "Order",
                    "Product",
                    "Supplier",
                    "User",
                    "Role",
                    "SystemConfig",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            }),
        }
    }
}

/// An append-only record of a state-changing operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AuditLog {
    pub id: i64,
    /// Actor who performed the operation.
    pub user_id: i64,
    pub action: AuditAction,
    pub entity: AuditEntity,
    pub entity_id: Option<i64>,
    /// Serialized JSON document describing the change.
    pub changes: Option<String>,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// System Configuration
// =============================================================================

/// The store-wide settings an admin may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKey {
    StoreName,
    StoreAddress,
    TaxRate,
    Currency,
    ReceiptFooter,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::StoreName,
        ConfigKey::StoreAddress,
        ConfigKey::TaxRate,
        ConfigKey::Currency,
        ConfigKey::ReceiptFooter,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::StoreName => "store_name",
            ConfigKey::StoreAddress => "store_address",
            ConfigKey::TaxRate => "tax_rate",
            ConfigKey::Currency => "currency",
            ConfigKey::ReceiptFooter => "receipt_footer",
        }
    }

    /// Value used when the key has never been set.
    pub const fn default_value(&self) -> &'static str {
        match self {
            ConfigKey::StoreName => "Smart POS Demo Store",
            ConfigKey::StoreAddress => "123 Main Street, Business District, City, State 12345",
            ConfigKey::TaxRate => "8.5",
            ConfigKey::Currency => "USD",
            ConfigKey::ReceiptFooter => "Thank you for your business!",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "key".to_string(),
                allowed: ConfigKey::ALL.iter().map(|k| k.to_string()).collect(),
            })
    }
}

/// A persisted configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SystemConfig {
    pub id: i64,
    pub key: String,
    pub value: String,
    /// Admin who last wrote the value.
    pub updated_by: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Notification Outbox
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    LowStock,
    OrderApproval,
    Receipt,
}

/// A queued outbound e-mail, drained by the mail relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct NotificationEntry {
    pub id: i64,
    pub kind: NotificationKind,
    pub recipient: String,
    pub cc: Option<String>,
    pub subject: String,
    pub body: String,
    /// Number of delivery attempts.
    pub attempts: i64,
    pub last_error: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub sent_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
