//! Service operations.
//!
//! Each operation takes the shared [`AppState`], the request's actor and its
//! input, runs exactly one access gate, and only then touches data:
//!
//! ```text
//! route handler ──► service op ──► require_* ──► core rules ──► repositories
//!                                                                   │
//!                              audit (logged on failure) ◄──────────┤
//!                              notify (logged on failure) ◄─────────┘
//! ```

pub mod admin;
pub mod analytics;
pub mod auth;
pub mod inventory;
pub mod orders;
pub mod pos;

use serde::{Deserialize, Serialize};
use smartpos_db::NewAuditEntry;
use tracing::error;

use crate::AppState;

/// Outcome of an operation that has nothing else to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
}

impl OperationResult {
    pub fn ok(message: impl Into<String>) -> Self {
        OperationResult {
            success: true,
            message: message.into(),
        }
    }
}

/// `limit`/`offset` paging parameters; absent values take the listing's default.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Appends an audit entry. Failures are logged and never reach the caller.
pub(crate) async fn audit(state: &AppState, entry: NewAuditEntry) {
    if let Err(e) = state.db.audit_logs().record(&entry).await {
        error!(
            error = %e,
            user_id = entry.user_id,
            action = ?entry.action,
            entity = ?entry.entity,
            "Failed to write audit log"
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use smartpos_core::catalog::{NewProduct, NewSupplier};
    use smartpos_core::{Actor, Product, RoleName, Supplier, User};
    use smartpos_db::{Database, DbConfig, NewUser};

    use crate::auth::JwtManager;
    use crate::config::ApiConfig;
    use crate::notify::testing::RecordingNotifier;
    use crate::AppState;

    pub const MANAGER_EMAIL: &str = "manager@pos.com";

    /// State over a fresh in-memory database with a recording notifier.
    pub async fn state() -> (AppState, Arc<RecordingNotifier>) {
        state_with(ApiConfig {
            manager_email: Some(MANAGER_EMAIL.to_string()),
            ..ApiConfig::default()
        })
        .await
    }

    pub async fn state_with(config: ApiConfig) -> (AppState, Arc<RecordingNotifier>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState {
            db,
            jwt: Arc::new(JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs)),
            notifier: notifier.clone(),
            config: Arc::new(config),
        };
        (state, notifier)
    }

    pub async fn user(state: &AppState, email: &str, role: RoleName) -> User {
        let role = state.db.roles().get_by_name(role).await.unwrap().unwrap();
        state
            .db
            .users()
            .create(&NewUser {
                email: email.to_string(),
                password_hash: crate::auth::hash_password("secret123").unwrap(),
                name: format!("{} User", role.name),
                role_id: role.id,
            })
            .await
            .unwrap()
    }

    pub async fn actor(state: &AppState, email: &str, role: RoleName) -> Actor {
        Actor::from(user(state, email, role).await)
    }

    pub async fn supplier(state: &AppState, name: &str) -> Supplier {
        state
            .db
            .suppliers()
            .create(&NewSupplier {
                name: name.to_string(),
                contact: "Jane Doe".to_string(),
                email: format!("orders@{}.com", name.to_lowercase().replace(' ', "")),
                phone: "+1-555-0100".to_string(),
                address: None,
            })
            .await
            .unwrap()
    }

    pub async fn product(
        state: &AppState,
        supplier_id: i64,
        sku: &str,
        stock: i64,
        threshold: i64,
    ) -> Product {
        state
            .db
            .products()
            .create(&NewProduct {
                name: format!("Product {}", sku),
                sku: sku.to_string(),
                description: None,
                price_cents: 1000,
                cost_cents: 600,
                stock,
                low_stock_threshold: threshold,
                supplier_id,
            })
            .await
            .unwrap()
    }
}
