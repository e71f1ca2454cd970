//! # SmartPOS API
//!
//! HTTP JSON server for the point-of-sale and inventory backend.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         API Request Flow                                │
//! │                                                                         │
//! │  HTTP request                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  routes (axum handlers)                                                 │
//! │       │   Session extractor: bearer token ──► User (re-read from db)    │
//! │       ▼                                                                 │
//! │  services::{auth, pos, inventory, orders, analytics, admin}             │
//! │       │   access gate ──► core planning ──► repository ──► audit        │
//! │       ▼                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────────┐  │
//! │  │ smartpos-db  │  │ smartpos-core│  │  Notifier                    │  │
//! │  │ (SQLite)     │  │ (pure logic) │  │  outbox │ log                │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────────────────┘  │
//! │                                                                         │
//! │  Errors of every layer end up as ApiError {code, message}.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Every key can be set with a `SMARTPOS_`
//! environment variable, e.g. `SMARTPOS_JWT_SECRET`.

pub mod auth;
pub mod config;
pub mod error;
pub mod notify;
pub mod routes;
pub mod services;

use std::sync::Arc;

use smartpos_db::Database;

pub use auth::{JwtManager, Session};
pub use config::{ApiConfig, NotifierKind};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use notify::{relay_pending, LogNotifier, Notifier, OutboxNotifier, RelayReport};
pub use routes::app;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let notifier: Arc<dyn Notifier> = match config.notifier {
            NotifierKind::Outbox => Arc::new(OutboxNotifier::new(db.notifications())),
            NotifierKind::Log => Arc::new(LogNotifier),
        };

        AppState {
            jwt: Arc::new(JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs)),
            db,
            notifier,
            config: Arc::new(config),
        }
    }
}
