//! # Repository Module
//!
//! Database repository implementations for Smart POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Service                                                               │
//! │       │                                                                 │
//! │       │  db.products().low_stock()                                     │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list(&self)                                                       │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── create(&self, input)                                              │
//! │  └── update(&self, product)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Staff accounts and credentials
//! - [`RoleRepository`](role::RoleRepository) - Roles and permission sets
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and stock
//! - [`SupplierRepository`](supplier::SupplierRepository) - Supplier CRUD
//! - [`TransactionRepository`](transaction::TransactionRepository) - Atomic sales
//! - [`OrderRepository`](order::OrderRepository) - Purchase orders and restocking
//! - [`AuditRepository`](audit::AuditRepository) - Append-only audit trail
//! - [`ConfigRepository`](config::ConfigRepository) - Store settings
//! - [`NotificationOutboxRepository`](notification::NotificationOutboxRepository) - Mail queue

pub mod audit;
pub mod config;
pub mod notification;
pub mod order;
pub mod product;
pub mod role;
pub mod supplier;
pub mod transaction;
pub mod user;

/// Shared fixtures for repository tests.
#[cfg(test)]
pub(crate) mod test_support {
    use smartpos_core::catalog::{NewProduct, NewSupplier};
    use smartpos_core::{Product, RoleName, Supplier, User};

    use crate::repository::user::NewUser;
    use crate::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn supplier(db: &Database, name: &str) -> Supplier {
        db.suppliers()
            .create(&NewSupplier {
                name: name.to_string(),
                contact: "John Smith".to_string(),
                email: "john@techworld.com".to_string(),
                phone: "+1-555-0101".to_string(),
                address: None,
            })
            .await
            .unwrap()
    }

    pub async fn product(db: &Database, supplier_id: i64, sku: &str, stock: i64) -> Product {
        db.products()
            .create(&NewProduct {
                name: format!("Product {}", sku),
                sku: sku.to_string(),
                description: None,
                price_cents: 1000,
                cost_cents: 600,
                stock,
                low_stock_threshold: 5,
                supplier_id,
            })
            .await
            .unwrap()
    }

    pub async fn user(db: &Database, email: &str, role: RoleName) -> User {
        let role = db.roles().get_by_name(role).await.unwrap().unwrap();
        db.users()
            .create(&NewUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                name: "Test User".to_string(),
                role_id: role.id,
            })
            .await
            .unwrap()
    }
}
