//! # SmartPOS API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        API Server                                       │
//! │                                                                         │
//! │  Web client ───► HTTP (4000) ───► Services ───► SQLite                 │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                              Notification outbox                        │
//! │                               (mail relay)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use smartpos_api::{app, ApiConfig, AppState};
use smartpos_db::{Database, DbConfig};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,smartpos=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting SmartPOS API server...");

    let config = ApiConfig::load().context("loading configuration")?;
    if config.uses_dev_secret() {
        warn!("SMARTPOS_JWT_SECRET is not set, using the development secret");
    }
    info!(
        port = config.port,
        database = %config.database_path,
        notifier = ?config.notifier,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.database_path))
        .await
        .context("opening database")?;
    info!("Database ready");

    let cors = cors_layer(config.frontend_url.as_deref())?;
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    let state = AppState::new(db.clone(), config);
    let router = app(state).layer(TraceLayer::new_for_http()).layer(cors);

    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn cors_layer(frontend_url: Option<&str>) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Ok(match frontend_url {
        Some(url) => {
            let origin: HeaderValue = url.parse().with_context(|| format!("invalid frontend url {}", url))?;
            layer.allow_origin(origin)
        }
        None => layer.allow_origin(Any),
    })
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
