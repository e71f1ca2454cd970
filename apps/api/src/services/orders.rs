//! # Purchase Order Operations
//!
//! ```text
//! pending ──approve──► approved ──► sent ──► received (+stock)
//! ```
//!
//! `approve_order` and `update_order_status` share one path: the requested
//! status is checked with [`OrderStatus::transition_to`] and then applied
//! with a guarded update that fails if another request moved the order
//! first.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::json;
use smartpos_core::access::require_min_role;
use smartpos_core::notification::order_approval;
use smartpos_core::order::{plan_order, OrderRequest};
use smartpos_core::{Actor, AuditAction, AuditEntity, ConfigKey, Order, OrderStatus, RoleName};
use smartpos_db::NewAuditEntry;
use tracing::{info, warn};

use super::audit;
use crate::error::{ApiError, ApiResult};
use crate::notify::dispatch;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct StatusInput {
    pub status: String,
}

/// `?status=` filter for the order list. Empty means every status.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn create_order(
    state: &AppState,
    actor: Option<&Actor>,
    request: OrderRequest,
) -> ApiResult<Order> {
    let actor = require_min_role(actor, RoleName::Cashier)?;

    state
        .db
        .suppliers()
        .get_by_id(request.supplier_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Supplier", request.supplier_id))?;

    let ids: Vec<i64> = request.items.iter().map(|line| line.product_id).collect();
    let products = state.db.products().get_many(&ids).await?;
    let plan = plan_order(&request, &products)?;

    let order = state.db.orders().create(&plan).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::Create, AuditEntity::Order)
            .entity_id(order.id)
            .changes(json!({
                "supplierId": order.supplier_id,
                "total": order.total_cents,
                "itemCount": order.items.len(),
            })),
    )
    .await;

    Ok(order)
}

pub async fn list_orders(
    state: &AppState,
    actor: Option<&Actor>,
    query: OrderListQuery,
) -> ApiResult<Vec<Order>> {
    require_min_role(actor, RoleName::Manager)?;
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()?;

    Ok(state.db.orders().list(status).await?)
}

pub async fn get_order(state: &AppState, actor: Option<&Actor>, id: i64) -> ApiResult<Order> {
    require_min_role(actor, RoleName::Manager)?;
    load_order(state, id).await
}

/// Approves a pending order and sends it to the supplier.
pub async fn approve_order(state: &AppState, actor: Option<&Actor>, id: i64) -> ApiResult<Order> {
    let actor = require_min_role(actor, RoleName::Manager)?;
    let order = transition(state, actor, id, OrderStatus::Approved).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::Approve, AuditEntity::Order).entity_id(id),
    )
    .await;

    Ok(order)
}

/// Moves an order to `status`, which must be the immediate successor of its
/// current status.
pub async fn update_order_status(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
    input: StatusInput,
) -> ApiResult<Order> {
    let actor = require_min_role(actor, RoleName::Manager)?;
    let to: OrderStatus = input.status.parse()?;
    let order = transition(state, actor, id, to).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::UpdateStatus, AuditEntity::Order)
            .entity_id(id)
            .changes(json!({ "newStatus": to })),
    )
    .await;

    Ok(order)
}

async fn transition(state: &AppState, actor: &Actor, id: i64, to: OrderStatus) -> ApiResult<Order> {
    let current = load_order(state, id).await?;
    let to = current.status.transition_to(id, to)?;

    let order = state
        .db
        .orders()
        .apply_transition(id, current.status, to, actor.user_id)
        .await?;

    info!(order_id = id, from = %current.status, to = %to, user_id = actor.user_id, "Order status changed");

    if to.records_approval() {
        notify_supplier(state, &order).await;
    }

    Ok(order)
}

async fn notify_supplier(state: &AppState, order: &Order) {
    let supplier = match state.db.suppliers().get_by_id(order.supplier_id).await {
        Ok(Some(supplier)) => supplier,
        Ok(None) => {
            warn!(order_id = order.id, supplier_id = order.supplier_id, "Order supplier missing, not notified");
            return;
        }
        Err(e) => {
            warn!(error = %e, order_id = order.id, "Could not load supplier, not notified");
            return;
        }
    };

    let ids: Vec<i64> = order.items.iter().map(|item| item.product_id).collect();
    let names: HashMap<i64, String> = match state.db.products().get_many(&ids).await {
        Ok(products) => products.into_iter().map(|(id, p)| (id, p.name)).collect(),
        Err(e) => {
            warn!(error = %e, order_id = order.id, "Could not load product names for order e-mail");
            HashMap::new()
        }
    };

    let currency = match state.db.configs().get(ConfigKey::Currency).await {
        Ok(Some(entry)) => entry.value,
        _ => ConfigKey::Currency.default_value().to_string(),
    };

    let message = order_approval(
        order,
        &supplier,
        &names,
        state.config.manager_email.as_deref(),
        &currency,
    );
    dispatch(state.notifier.as_ref(), &message).await;
}

async fn load_order(state: &AppState, id: i64) -> ApiResult<Order> {
    state
        .db
        .orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::{actor, product, state, supplier, MANAGER_EMAIL};
    use smartpos_core::order::OrderLine;
    use smartpos_core::NotificationKind;

    fn status(s: &str) -> StatusInput {
        StatusInput {
            status: s.to_string(),
        }
    }

    struct Fixture {
        state: AppState,
        notifier: std::sync::Arc<crate::notify::testing::RecordingNotifier>,
        manager: Actor,
        order: Order,
        mouse: i64,
        cable: i64,
    }

    async fn fixture() -> Fixture {
        let (state, notifier) = state().await;
        let cashier = actor(&state, "cashier@pos.com", RoleName::Cashier).await;
        let manager = actor(&state, "manager@pos.com", RoleName::Manager).await;
        let vendor = supplier(&state, "TechWorld").await;
        let mouse = product(&state, vendor.id, "TECH-001", 2, 5).await.id;
        let cable = product(&state, vendor.id, "TECH-002", 0, 5).await.id;

        let order = create_order(
            &state,
            Some(&cashier),
            OrderRequest {
                supplier_id: vendor.id,
                items: vec![
                    OrderLine { product_id: mouse, quantity: 10, unit_price_cents: 1500 },
                    OrderLine { product_id: cable, quantity: 20, unit_price_cents: 650 },
                ],
            },
        )
        .await
        .unwrap();

        Fixture { state, notifier, manager, order, mouse, cable }
    }

    #[tokio::test]
    async fn test_create_order_is_pending() {
        let f = fixture().await;
        assert_eq!(f.order.status, OrderStatus::Pending);
        assert_eq!(f.order.total_cents, 10 * 1500 + 20 * 650);

        let err = list_orders(&f.state, None, OrderListQuery::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }

    #[tokio::test]
    async fn test_list_orders_by_status() {
        let f = fixture().await;
        let by = |s: &str| OrderListQuery {
            status: Some(s.to_string()),
        };

        let pending = list_orders(&f.state, Some(&f.manager), by("pending")).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, f.order.id);

        approve_order(&f.state, Some(&f.manager), f.order.id).await.unwrap();
        assert!(list_orders(&f.state, Some(&f.manager), by("pending")).await.unwrap().is_empty());
        assert_eq!(list_orders(&f.state, Some(&f.manager), by("approved")).await.unwrap().len(), 1);
        assert_eq!(list_orders(&f.state, Some(&f.manager), by("")).await.unwrap().len(), 1);

        let err = list_orders(&f.state, Some(&f.manager), by("shipped")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);
    }

    #[tokio::test]
    async fn test_create_order_unknown_supplier() {
        let f = fixture().await;
        let err = create_order(
            &f.state,
            Some(&f.manager),
            OrderRequest {
                supplier_id: 999,
                items: vec![OrderLine { product_id: f.mouse, quantity: 1, unit_price_cents: 1 }],
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_approve_notifies_supplier_with_manager_cc() {
        let f = fixture().await;
        let approved = approve_order(&f.state, Some(&f.manager), f.order.id).await.unwrap();

        assert_eq!(approved.status, OrderStatus::Approved);
        assert_eq!(approved.approved_by, Some(f.manager.user_id));
        assert!(approved.approved_at.is_some());

        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].kind, NotificationKind::OrderApproval);
        assert_eq!(sent[0].cc.as_deref(), Some(MANAGER_EMAIL));
        assert!(sent[0].body.contains("Product TECH-001"));

        let err = approve_order(&f.state, Some(&f.manager), f.order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);
    }

    #[tokio::test]
    async fn test_cashier_cannot_approve() {
        let f = fixture().await;
        let cashier = actor(&f.state, "other@pos.com", RoleName::Cashier).await;
        let err = approve_order(&f.state, Some(&cashier), f.order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_receive_restocks_every_item() {
        let f = fixture().await;
        let id = f.order.id;

        update_order_status(&f.state, Some(&f.manager), id, status("approved")).await.unwrap();
        update_order_status(&f.state, Some(&f.manager), id, status("sent")).await.unwrap();
        let received = update_order_status(&f.state, Some(&f.manager), id, status("received"))
            .await
            .unwrap();

        assert_eq!(received.status, OrderStatus::Received);
        assert_eq!(received.total_cents, f.order.total_cents);
        let stock = f.state.db.products().get_many(&[f.mouse, f.cable]).await.unwrap();
        assert_eq!(stock[&f.mouse].stock, 12);
        assert_eq!(stock[&f.cable].stock, 20);
    }

    #[tokio::test]
    async fn test_skipping_states_is_rejected_without_restock() {
        let f = fixture().await;

        let err = update_order_status(&f.state, Some(&f.manager), f.order.id, status("received"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);

        let err = update_order_status(&f.state, Some(&f.manager), f.order.id, status("shipped"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);

        let stock = f.state.db.products().get_many(&[f.mouse]).await.unwrap();
        assert_eq!(stock[&f.mouse].stock, 2);
        let order = get_order(&f.state, Some(&f.manager), f.order.id).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_status_update_to_approved_records_approver() {
        let f = fixture().await;
        let order = update_order_status(&f.state, Some(&f.manager), f.order.id, status("approved"))
            .await
            .unwrap();
        assert_eq!(order.approved_by, Some(f.manager.user_id));

        let logs = f.state.db.audit_logs().list(Some(AuditEntity::Order), 10, 0).await.unwrap();
        assert_eq!(logs[0].action, AuditAction::UpdateStatus);
        let changes: serde_json::Value = serde_json::from_str(logs[0].changes.as_deref().unwrap()).unwrap();
        assert_eq!(changes["newStatus"], "approved");
    }
}
