//! # Inventory Operations
//!
//! Products and suppliers.
//!
//! | Operation                          | Gate          |
//! |------------------------------------|---------------|
//! | list_products, get_product         | cashier+      |
//! | everything else                    | manager+      |

use serde::Serialize;
use serde_json::json;
use smartpos_core::access::require_min_role;
use smartpos_core::catalog::{NewProduct, NewSupplier, ProductUpdate, SupplierUpdate};
use smartpos_core::validation::validate_stock_level;
use smartpos_core::{Actor, AuditAction, AuditEntity, Product, RoleName, Supplier};
use smartpos_db::NewAuditEntry;
use tracing::info;

use super::{audit, OperationResult};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// A supplier together with the products it provides.
#[derive(Debug, Clone, Serialize)]
pub struct SupplierDetail {
    #[serde(flatten)]
    pub supplier: Supplier,
    pub products: Vec<Product>,
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(state: &AppState, actor: Option<&Actor>) -> ApiResult<Vec<Product>> {
    require_min_role(actor, RoleName::Cashier)?;
    Ok(state.db.products().list().await?)
}

pub async fn get_product(state: &AppState, actor: Option<&Actor>, id: i64) -> ApiResult<Product> {
    require_min_role(actor, RoleName::Cashier)?;
    state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

/// Products at or below their threshold, emptiest first.
pub async fn low_stock_products(state: &AppState, actor: Option<&Actor>) -> ApiResult<Vec<Product>> {
    require_min_role(actor, RoleName::Manager)?;
    Ok(state.db.products().low_stock().await?)
}

pub async fn create_product(
    state: &AppState,
    actor: Option<&Actor>,
    input: NewProduct,
) -> ApiResult<Product> {
    let actor = require_min_role(actor, RoleName::Manager)?;
    input.validate()?;
    ensure_supplier(state, input.supplier_id).await?;

    let product = state.db.products().create(&input).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::Create, AuditEntity::Product)
            .entity_id(product.id)
            .changes(json!({ "sku": product.sku, "name": product.name })),
    )
    .await;

    info!(product_id = product.id, sku = %product.sku, "Product created");
    Ok(product)
}

pub async fn update_product(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
    update: ProductUpdate,
) -> ApiResult<Product> {
    let actor = require_min_role(actor, RoleName::Manager)?;
    update.validate()?;

    let mut product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    if let Some(supplier_id) = update.supplier_id {
        ensure_supplier(state, supplier_id).await?;
    }

    update.apply_to(&mut product);
    let product = state.db.products().update(&product).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::Update, AuditEntity::Product)
            .entity_id(id)
            .changes(serde_json::to_value(&update).unwrap_or_default()),
    )
    .await;

    Ok(product)
}

pub async fn delete_product(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
) -> ApiResult<OperationResult> {
    let actor = require_min_role(actor, RoleName::Manager)?;
    state.db.products().delete(id).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::Delete, AuditEntity::Product).entity_id(id),
    )
    .await;

    info!(product_id = id, "Product deleted");
    Ok(OperationResult::ok("Product deleted"))
}

/// Sets the absolute stock level of a product.
pub async fn update_stock(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
    stock: i64,
) -> ApiResult<Product> {
    let actor = require_min_role(actor, RoleName::Manager)?;
    validate_stock_level("stock", stock)?;

    let previous = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    let product = state.db.products().set_stock(id, stock).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::UpdateStock, AuditEntity::Product)
            .entity_id(id)
            .changes(json!({ "previous": previous.stock, "stock": stock })),
    )
    .await;

    info!(product_id = id, from = previous.stock, to = stock, "Stock adjusted");
    Ok(product)
}

// =============================================================================
// Suppliers
// =============================================================================

pub async fn list_suppliers(state: &AppState, actor: Option<&Actor>) -> ApiResult<Vec<Supplier>> {
    require_min_role(actor, RoleName::Manager)?;
    Ok(state.db.suppliers().list().await?)
}

pub async fn get_supplier(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
) -> ApiResult<SupplierDetail> {
    require_min_role(actor, RoleName::Manager)?;

    let supplier = state
        .db
        .suppliers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Supplier", id))?;
    let products = state.db.products().list_by_supplier(id).await?;

    Ok(SupplierDetail { supplier, products })
}

pub async fn create_supplier(
    state: &AppState,
    actor: Option<&Actor>,
    input: NewSupplier,
) -> ApiResult<Supplier> {
    let actor = require_min_role(actor, RoleName::Manager)?;
    input.validate()?;

    let supplier = state.db.suppliers().create(&input).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::Create, AuditEntity::Supplier)
            .entity_id(supplier.id)
            .changes(json!({ "name": supplier.name })),
    )
    .await;

    Ok(supplier)
}

pub async fn update_supplier(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
    update: SupplierUpdate,
) -> ApiResult<Supplier> {
    let actor = require_min_role(actor, RoleName::Manager)?;
    update.validate()?;

    let mut supplier = state
        .db
        .suppliers()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Supplier", id))?;

    update.apply_to(&mut supplier);
    let supplier = state.db.suppliers().update(&supplier).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::Update, AuditEntity::Supplier)
            .entity_id(id)
            .changes(serde_json::to_value(&update).unwrap_or_default()),
    )
    .await;

    Ok(supplier)
}

/// Deletes a supplier. Suppliers that still have products are refused.
pub async fn delete_supplier(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
) -> ApiResult<OperationResult> {
    let actor = require_min_role(actor, RoleName::Manager)?;
    state.db.suppliers().delete(id).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::Delete, AuditEntity::Supplier).entity_id(id),
    )
    .await;

    Ok(OperationResult::ok("Supplier deleted"))
}

async fn ensure_supplier(state: &AppState, id: i64) -> ApiResult<()> {
    match state.db.suppliers().get_by_id(id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found("Supplier", id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::{actor, product, state, supplier};

    fn new_product(supplier_id: i64, sku: &str) -> NewProduct {
        NewProduct {
            name: "Wireless Mouse".to_string(),
            sku: sku.to_string(),
            description: None,
            price_cents: 2999,
            cost_cents: 1500,
            stock: 45,
            low_stock_threshold: 10,
            supplier_id,
        }
    }

    #[tokio::test]
    async fn test_cashier_reads_but_cannot_write() {
        let (state, _) = state().await;
        let cashier = actor(&state, "cashier@pos.com", RoleName::Cashier).await;
        let vendor = supplier(&state, "TechWorld").await;
        product(&state, vendor.id, "TECH-001", 5, 2).await;

        assert_eq!(list_products(&state, Some(&cashier)).await.unwrap().len(), 1);

        let err = create_product(&state, Some(&cashier), new_product(vendor.id, "TECH-002"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = low_stock_products(&state, Some(&cashier)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let err = list_products(&state, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
    }

    #[tokio::test]
    async fn test_create_product_checks_supplier_and_sku() {
        let (state, _) = state().await;
        let manager = actor(&state, "manager@pos.com", RoleName::Manager).await;
        let vendor = supplier(&state, "TechWorld").await;

        let err = create_product(&state, Some(&manager), new_product(999, "TECH-001"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        create_product(&state, Some(&manager), new_product(vendor.id, "TECH-001"))
            .await
            .unwrap();
        let err = create_product(&state, Some(&manager), new_product(vendor.id, "TECH-001"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);

        let err = create_product(
            &state,
            Some(&manager),
            NewProduct {
                price_cents: -1,
                ..new_product(vendor.id, "TECH-009")
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);
    }

    #[tokio::test]
    async fn test_update_product_is_partial_and_audited() {
        let (state, _) = state().await;
        let manager = actor(&state, "manager@pos.com", RoleName::Manager).await;
        let vendor = supplier(&state, "TechWorld").await;
        let existing = product(&state, vendor.id, "TECH-001", 5, 2).await;

        let updated = update_product(
            &state,
            Some(&manager),
            existing.id,
            ProductUpdate {
                price_cents: Some(3499),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.price_cents, 3499);
        assert_eq!(updated.name, existing.name);
        assert_eq!(updated.stock, existing.stock);

        let logs = state
            .db
            .audit_logs()
            .list(Some(AuditEntity::Product), 10, 0)
            .await
            .unwrap();
        assert_eq!(logs[0].action, AuditAction::Update);
    }

    #[tokio::test]
    async fn test_update_stock_sets_absolute_level() {
        let (state, _) = state().await;
        let manager = actor(&state, "manager@pos.com", RoleName::Manager).await;
        let vendor = supplier(&state, "TechWorld").await;
        let existing = product(&state, vendor.id, "TECH-001", 5, 2).await;

        let updated = update_stock(&state, Some(&manager), existing.id, 40).await.unwrap();
        assert_eq!(updated.stock, 40);

        let err = update_stock(&state, Some(&manager), existing.id, -1)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);

        let err = update_stock(&state, Some(&manager), 999, 1).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_supplier_detail_and_guarded_delete() {
        let (state, _) = state().await;
        let manager = actor(&state, "manager@pos.com", RoleName::Manager).await;
        let vendor = supplier(&state, "TechWorld").await;
        let item = product(&state, vendor.id, "TECH-001", 5, 2).await;

        let detail = get_supplier(&state, Some(&manager), vendor.id).await.unwrap();
        assert_eq!(detail.products.len(), 1);

        let err = delete_supplier(&state, Some(&manager), vendor.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);

        delete_product(&state, Some(&manager), item.id).await.unwrap();
        let result = delete_supplier(&state, Some(&manager), vendor.id).await.unwrap();
        assert!(result.success);
    }
}
