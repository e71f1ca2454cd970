//! # Point of Sale Operations
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_sale(request)                                                   │
//! │                                                                         │
//! │  1. require_auth                                                        │
//! │  2. load every referenced product                                       │
//! │  3. plan_sale      ── NotFound / InsufficientStock, nothing written     │
//! │  4. record_sale    ── ONE SQL TRANSACTION:                              │
//! │                       insert transaction + items,                       │
//! │                       guarded stock decrement per product               │
//! │  5. low-stock alert for each touched product at/below threshold         │
//! │  6. audit CREATE {total, itemCount}                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 5 and 6 run after commit and cannot fail the sale.

use serde::Deserialize;
use serde_json::json;
use smartpos_core::access::require_auth;
use smartpos_core::notification::{low_stock_alert, receipt_message};
use smartpos_core::receipt::{Receipt, StoreSettings};
use smartpos_core::sale::{plan_sale, SaleRequest};
use smartpos_core::validation::{validate_email, validate_page};
use smartpos_core::{
    Actor, AuditAction, AuditEntity, Product, RoleName, Transaction, DEFAULT_TRANSACTION_PAGE,
};
use smartpos_db::NewAuditEntry;
use tracing::{info, warn};

use super::{audit, OperationResult, PageQuery};
use crate::error::{ApiError, ApiResult};
use crate::notify::dispatch;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptEmailInput {
    pub customer_email: String,
}

pub async fn record_sale(
    state: &AppState,
    actor: Option<&Actor>,
    request: SaleRequest,
) -> ApiResult<Transaction> {
    let actor = require_auth(actor)?;
    request.validate()?;

    let ids: Vec<i64> = request.items.iter().map(|line| line.product_id).collect();
    let products = state.db.products().get_many(&ids).await?;
    let plan = plan_sale(&request, &products)?;

    let recorded = state
        .db
        .transactions()
        .record_sale(actor.user_id, &request, &plan)
        .await?;
    let transaction = recorded.transaction;

    for product in recorded.touched_products.iter().filter(|p| p.is_low_stock()) {
        alert_low_stock(state, product).await;
    }

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::Create, AuditEntity::Transaction)
            .entity_id(transaction.id)
            .changes(json!({
                "total": transaction.total_cents,
                "itemCount": transaction.items.len(),
            })),
    )
    .await;

    info!(
        transaction_id = transaction.id,
        user_id = actor.user_id,
        total = %transaction.total(),
        items = transaction.items.len(),
        "Sale completed"
    );

    Ok(transaction)
}

async fn alert_low_stock(state: &AppState, product: &Product) {
    let Some(manager_email) = state.config.manager_email.as_deref() else {
        warn!(
            product_id = product.id,
            stock = product.stock,
            "Product is low on stock but no manager e-mail is configured"
        );
        return;
    };

    let supplier = match state.db.suppliers().get_by_id(product.supplier_id).await {
        Ok(supplier) => supplier,
        Err(e) => {
            warn!(error = %e, supplier_id = product.supplier_id, "Could not load supplier for alert");
            None
        }
    };

    let message = low_stock_alert(product, supplier.as_ref(), manager_email);
    dispatch(state.notifier.as_ref(), &message).await;
}

/// Transactions newest first. Cashiers only see their own.
pub async fn list_transactions(
    state: &AppState,
    actor: Option<&Actor>,
    page: PageQuery,
) -> ApiResult<Vec<Transaction>> {
    let actor = require_auth(actor)?;

    let limit = page.limit.unwrap_or(DEFAULT_TRANSACTION_PAGE);
    let offset = page.offset.unwrap_or(0);
    validate_page(limit, offset)?;

    let user_filter = (actor.role == RoleName::Cashier).then_some(actor.user_id);
    Ok(state.db.transactions().list(user_filter, limit, offset).await?)
}

pub async fn get_transaction(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
) -> ApiResult<Transaction> {
    let actor = require_auth(actor)?;
    load_visible_transaction(state, actor, id).await
}

/// Any signed-in user may print a receipt, including for a colleague's sale.
pub async fn generate_receipt(
    state: &AppState,
    actor: Option<&Actor>,
    transaction_id: i64,
) -> ApiResult<Receipt> {
    require_auth(actor)?;
    build_receipt(state, transaction_id).await
}

/// Queues a plain-text copy of the receipt to `customer_email`.
///
/// Unlike sale alerts, a delivery failure is returned to the caller.
pub async fn send_receipt_email(
    state: &AppState,
    actor: Option<&Actor>,
    transaction_id: i64,
    input: ReceiptEmailInput,
) -> ApiResult<OperationResult> {
    require_auth(actor)?;
    let email = input.customer_email.trim();
    validate_email(email)?;

    let receipt = build_receipt(state, transaction_id).await?;
    let message = receipt_message(&receipt, email);

    state.notifier.send(&message).await.map_err(|e| {
        warn!(error = %e, transaction_id, "Receipt e-mail failed");
        ApiError::internal("Failed to send receipt e-mail")
    })?;

    info!(transaction_id, receipt = %receipt.receipt_number, "Receipt e-mailed");
    Ok(OperationResult::ok(format!("Receipt sent to {}", email)))
}

async fn build_receipt(state: &AppState, transaction_id: i64) -> ApiResult<Receipt> {
    let transaction = state
        .db
        .transactions()
        .get_by_id(transaction_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction", transaction_id))?;
    let settings = StoreSettings::from_entries(&state.db.configs().list().await?);
    Ok(Receipt::build(transaction, &settings))
}

async fn load_visible_transaction(
    state: &AppState,
    actor: &Actor,
    id: i64,
) -> ApiResult<Transaction> {
    let transaction = state
        .db
        .transactions()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction", id))?;

    if actor.role == RoleName::Cashier && transaction.user_id != actor.user_id {
        return Err(smartpos_core::CoreError::Forbidden.into());
    }

    Ok(transaction)
}
