//! # HTTP Routes
//!
//! Thin axum handlers: each one resolves the [`Session`], forwards to a
//! service operation and wraps the result in `Json`.
//!
//! ```text
//! /health                                   GET
//! /api/auth/{register,login,me}             POST, POST, GET
//! /api/products[/{id}[/stock]]              inventory
//! /api/products/low-stock                   GET
//! /api/suppliers[/{id}]                     inventory
//! /api/transactions[/{id}[/receipt[/email]]] point of sale
//! /api/orders[/{id}[/approve|/status]]      purchase orders
//! /api/analytics/{sales,inventory}          GET
//! /api/users, /api/roles, /api/audit-logs   administration
//! /api/config[/{key}]                       system settings
//! ```

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use smartpos_core::analytics::{InventoryAnalytics, SalesAnalytics};
use smartpos_core::catalog::{NewProduct, NewSupplier, ProductUpdate, SupplierUpdate};
use smartpos_core::order::OrderRequest;
use smartpos_core::receipt::Receipt;
use smartpos_core::sale::SaleRequest;
use smartpos_core::{AuditLog, Order, Product, Role, Supplier, SystemConfig, Transaction, User};

use crate::auth::Session;
use crate::error::ApiResult;
use crate::services::admin::{
    self, AuditQuery, CreateRoleInput, CreateUserInput, SetConfigInput, UpdateRoleInput,
};
use crate::services::analytics::{self, DateRangeQuery};
use crate::services::auth::{self as auth_service, AuthPayload, LoginInput, RegisterInput};
use crate::services::inventory::{self, SupplierDetail};
use crate::services::orders::{self, OrderListQuery, StatusInput};
use crate::services::pos::{self, ReceiptEmailInput};
use crate::services::{OperationResult, PageQuery};
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct StockInput {
    pub stock: i64,
}

/// Builds the full router over `state`.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        // Auth
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        // Inventory
        .route("/products", get(list_products).post(create_product))
        .route("/products/low-stock", get(low_stock_products))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/{id}/stock", put(update_stock))
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/{id}",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
        // Point of sale
        .route("/transactions", get(list_transactions).post(record_sale))
        .route("/transactions/{id}", get(get_transaction))
        .route("/transactions/{id}/receipt", get(generate_receipt))
        .route("/transactions/{id}/receipt/email", post(send_receipt_email))
        // Purchase orders
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/approve", post(approve_order))
        .route("/orders/{id}/status", put(update_order_status))
        // Analytics
        .route("/analytics/sales", get(sales_analytics))
        .route("/analytics/inventory", get(inventory_analytics))
        // Administration
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/{id}/role", put(update_user_role))
        .route("/roles", get(list_roles).post(create_role))
        .route("/audit-logs", get(audit_logs))
        .route("/config", get(list_system_configs))
        .route("/config/{key}", get(get_system_config).put(set_system_config));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Auth
// =============================================================================

async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<Json<AuthPayload>> {
    auth_service::register(&state, input).await.map(Json)
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> ApiResult<Json<AuthPayload>> {
    auth_service::login(&state, input).await.map(Json)
}

async fn me(session: Session) -> Json<Option<User>> {
    Json(auth_service::current_user(session))
}

// =============================================================================
// Inventory
// =============================================================================

async fn list_products(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Product>>> {
    inventory::list_products(&state, session.actor().as_ref()).await.map(Json)
}

async fn low_stock_products(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Product>>> {
    inventory::low_stock_products(&state, session.actor().as_ref()).await.map(Json)
}

async fn get_product(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<Product>> {
    inventory::get_product(&state, session.actor().as_ref(), id).await.map(Json)
}

async fn create_product(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<NewProduct>,
) -> ApiResult<Json<Product>> {
    inventory::create_product(&state, session.actor().as_ref(), input).await.map(Json)
}

async fn update_product(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(update): Json<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    inventory::update_product(&state, session.actor().as_ref(), id, update).await.map(Json)
}

async fn delete_product(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<OperationResult>> {
    inventory::delete_product(&state, session.actor().as_ref(), id).await.map(Json)
}

async fn update_stock(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(input): Json<StockInput>,
) -> ApiResult<Json<Product>> {
    inventory::update_stock(&state, session.actor().as_ref(), id, input.stock).await.map(Json)
}

async fn list_suppliers(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Supplier>>> {
    inventory::list_suppliers(&state, session.actor().as_ref()).await.map(Json)
}

async fn get_supplier(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<SupplierDetail>> {
    inventory::get_supplier(&state, session.actor().as_ref(), id).await.map(Json)
}

async fn create_supplier(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<NewSupplier>,
) -> ApiResult<Json<Supplier>> {
    inventory::create_supplier(&state, session.actor().as_ref(), input).await.map(Json)
}

async fn update_supplier(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(update): Json<SupplierUpdate>,
) -> ApiResult<Json<Supplier>> {
    inventory::update_supplier(&state, session.actor().as_ref(), id, update).await.map(Json)
}

async fn delete_supplier(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<OperationResult>> {
    inventory::delete_supplier(&state, session.actor().as_ref(), id).await.map(Json)
}

// =============================================================================
// Point of Sale
// =============================================================================

async fn record_sale(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SaleRequest>,
) -> ApiResult<Json<Transaction>> {
    pos::record_sale(&state, session.actor().as_ref(), request).await.map(Json)
}

async fn list_transactions(
    State(state): State<AppState>,
    session: Session,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<Vec<Transaction>>> {
    pos::list_transactions(&state, session.actor().as_ref(), page).await.map(Json)
}

async fn get_transaction(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<Transaction>> {
    pos::get_transaction(&state, session.actor().as_ref(), id).await.map(Json)
}

async fn generate_receipt(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<Receipt>> {
    pos::generate_receipt(&state, session.actor().as_ref(), id).await.map(Json)
}

async fn send_receipt_email(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(input): Json<ReceiptEmailInput>,
) -> ApiResult<Json<OperationResult>> {
    pos::send_receipt_email(&state, session.actor().as_ref(), id, input).await.map(Json)
}

// =============================================================================
// Purchase Orders
// =============================================================================

async fn create_order(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<OrderRequest>,
) -> ApiResult<Json<Order>> {
    orders::create_order(&state, session.actor().as_ref(), request).await.map(Json)
}

async fn list_orders(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Json<Vec<Order>>> {
    orders::list_orders(&state, session.actor().as_ref(), query).await.map(Json)
}

async fn get_order(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<Order>> {
    orders::get_order(&state, session.actor().as_ref(), id).await.map(Json)
}

async fn approve_order(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<Order>> {
    orders::approve_order(&state, session.actor().as_ref(), id).await.map(Json)
}

async fn update_order_status(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Json<Order>> {
    orders::update_order_status(&state, session.actor().as_ref(), id, input).await.map(Json)
}

// =============================================================================
// Analytics
// =============================================================================

async fn sales_analytics(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<DateRangeQuery>,
) -> ApiResult<Json<SalesAnalytics>> {
    analytics::sales_analytics(&state, session.actor().as_ref(), query).await.map(Json)
}

async fn inventory_analytics(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<InventoryAnalytics>> {
    analytics::inventory_analytics(&state, session.actor().as_ref()).await.map(Json)
}

// =============================================================================
// Administration
// =============================================================================

async fn list_users(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<User>>> {
    admin::list_users(&state, session.actor().as_ref()).await.map(Json)
}

async fn get_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    admin::get_user(&state, session.actor().as_ref(), id).await.map(Json)
}

async fn create_user(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<CreateUserInput>,
) -> ApiResult<Json<User>> {
    admin::create_user(&state, session.actor().as_ref(), input).await.map(Json)
}

async fn update_user_role(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Json(input): Json<UpdateRoleInput>,
) -> ApiResult<Json<User>> {
    admin::update_user_role(&state, session.actor().as_ref(), id, input).await.map(Json)
}

async fn delete_user(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> ApiResult<Json<OperationResult>> {
    admin::delete_user(&state, session.actor().as_ref(), id).await.map(Json)
}

async fn list_roles(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Role>>> {
    admin::list_roles(&state, session.actor().as_ref()).await.map(Json)
}

async fn create_role(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<CreateRoleInput>,
) -> ApiResult<Json<Role>> {
    admin::create_role(&state, session.actor().as_ref(), input).await.map(Json)
}

async fn audit_logs(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<AuditQuery>,
) -> ApiResult<Json<Vec<AuditLog>>> {
    admin::audit_logs(&state, session.actor().as_ref(), query).await.map(Json)
}

async fn list_system_configs(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<SystemConfig>>> {
    admin::list_system_configs(&state, session.actor().as_ref()).await.map(Json)
}

async fn get_system_config(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
) -> ApiResult<Json<Option<SystemConfig>>> {
    admin::get_system_config(&state, session.actor().as_ref(), &key).await.map(Json)
}

async fn set_system_config(
    State(state): State<AppState>,
    session: Session,
    Path(key): Path<String>,
    Json(input): Json<SetConfigInput>,
) -> ApiResult<Json<SystemConfig>> {
    admin::set_system_config(&state, session.actor().as_ref(), &key, input).await.map(Json)
}
