//! # Order Repository
//!
//! Purchase orders placed with suppliers.
//!
//! ## Status Changes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  apply_transition(order, from → to)          ONE SQL TRANSACTION        │
//! │                                                                         │
//! │  UPDATE orders SET status = :to ... WHERE id = :id AND status = :from   │
//! │       │                                                                 │
//! │       ├── 0 rows → ROLLBACK, StaleState (someone else moved it)         │
//! │       │                                                                 │
//! │       ├── to = approved  → approved_by / approved_at set in same UPDATE │
//! │       │                                                                 │
//! │       └── to = received  → UPDATE products SET stock = stock + qty      │
//! │                            for every order item                         │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Whether `from → to` is allowed at all is decided by
//! [`OrderStatus::transition_to`] before this repository is called.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use smartpos_core::order::OrderPlan;
use smartpos_core::{Order, OrderItem, OrderStatus};

const ORDER_COLUMNS: &str =
    "id, supplier_id, status, total_cents, approved_by, approved_at, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, unit_price_cents, subtotal_cents";

/// Repository for purchase order operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a pending order with its items.
    pub async fn create(&self, plan: &OrderPlan) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO orders (supplier_id, status, total_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
        )
        .bind(plan.supplier_id)
        .bind(OrderStatus::Pending)
        .bind(plan.total_cents)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let order_id = result.last_insert_rowid();

        for line in &plan.lines {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, unit_price_cents, subtotal_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(line.subtotal_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id,
            supplier_id = plan.supplier_id,
            total_cents = plan.total_cents,
            "Purchase order created"
        );

        self.get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }

    /// Gets an order with its items.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match order {
            Some(o) => Ok(self.attach_items(vec![o]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Orders newest first, optionally only those in `status`.
    pub async fn list(&self, status: Option<OrderStatus>) -> DbResult<Vec<Order>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM orders", ORDER_COLUMNS));
        if let Some(status) = status {
            builder.push(" WHERE status = ").push_bind(status);
        }
        builder.push(" ORDER BY created_at DESC, id DESC");

        let orders = builder
            .build_query_as::<Order>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(orders).await
    }

    /// Moves an order from `from` to `to`, recording the approver and
    /// restocking as the target state requires.
    ///
    /// ## Errors
    /// * `DbError::StaleState` - the stored status is no longer `from`
    pub async fn apply_transition(
        &self,
        order_id: i64,
        from: OrderStatus,
        to: OrderStatus,
        actor_id: i64,
    ) -> DbResult<Order> {
        let now = Utc::now();
        debug!(order_id, %from, %to, "Applying order transition");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let updated = if to.records_approval() {
            sqlx::query(
                r#"
                UPDATE orders SET
                    status = ?3,
                    approved_by = ?4,
                    approved_at = ?5,
                    updated_at = ?5
                WHERE id = ?1 AND status = ?2
                "#,
            )
            .bind(order_id)
            .bind(from)
            .bind(to)
            .bind(actor_id)
            .bind(now)
            .execute(&mut *tx)
            .await?
        } else {
            sqlx::query("UPDATE orders SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2")
                .bind(order_id)
                .bind(from)
                .bind(to)
                .bind(now)
                .execute(&mut *tx)
                .await?
        };

        if updated.rows_affected() == 0 {
            warn!(order_id, expected = %from, "Order status changed concurrently");
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            return Err(DbError::StaleState {
                entity: "Order".to_string(),
                id: order_id,
            });
        }

        if to.restocks() {
            let sql = format!("SELECT {} FROM order_items WHERE order_id = ?1", ITEM_COLUMNS);
            let items = sqlx::query_as::<_, OrderItem>(&sql)
                .bind(order_id)
                .fetch_all(&mut *tx)
                .await?;

            for item in &items {
                sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(item.product_id)
                    .bind(item.quantity)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
            }

            info!(order_id, items = items.len(), "Order received, stock replenished");
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        self.get_by_id(order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))
    }

    async fn attach_items(&self, mut orders: Vec<Order>) -> DbResult<Vec<Order>> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM order_items WHERE order_id IN (",
            ITEM_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for o in &orders {
            separated.push_bind(o.id);
        }
        separated.push_unseparated(") ORDER BY id ASC");

        let items = builder
            .build_query_as::<OrderItem>()
            .fetch_all(&self.pool)
            .await?;

        let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
        for item in items {
            by_order.entry(item.order_id).or_default().push(item);
        }
        for o in &mut orders {
            o.items = by_order.remove(&o.id).unwrap_or_default();
        }

        Ok(orders)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, product, supplier, user};
    use smartpos_core::order::{plan_order, OrderLine, OrderRequest};
    use smartpos_core::RoleName;

    async fn pending_order(db: &crate::Database) -> (Order, i64, i64) {
        let vendor = supplier(db, "TechWorld Distributors").await;
        let mouse = product(db, vendor.id, "TECH-001", 2).await;
        let cable = product(db, vendor.id, "TECH-002", 0).await;

        let request = OrderRequest {
            supplier_id: vendor.id,
            items: vec![
                OrderLine { product_id: mouse.id, quantity: 10, unit_price_cents: 1500 },
                OrderLine { product_id: cable.id, quantity: 20, unit_price_cents: 650 },
            ],
        };
        let products = db.products().get_many(&[mouse.id, cable.id]).await.unwrap();
        let plan = plan_order(&request, &products).unwrap();

        (db.orders().create(&plan).await.unwrap(), mouse.id, cable.id)
    }

    #[tokio::test]
    async fn test_create_order() {
        let db = database().await;
        let (order, mouse, _) = pending_order(&db).await;

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_cents, 10 * 1500 + 20 * 650);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].product_id, mouse);
        assert!(order.approved_by.is_none());

        assert_eq!(db.orders().list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let db = database().await;
        let manager = user(&db, "manager@pos.com", RoleName::Manager).await;
        let (first, _, _) = pending_order(&db).await;
        let vendor = supplier(&db, "Office Supply Co").await;
        let pen = product(&db, vendor.id, "OFF-001", 0).await;
        let request = OrderRequest {
            supplier_id: vendor.id,
            items: vec![OrderLine { product_id: pen.id, quantity: 5, unit_price_cents: 100 }],
        };
        let products = db.products().get_many(&[pen.id]).await.unwrap();
        let second = db.orders().create(&plan_order(&request, &products).unwrap()).await.unwrap();

        db.orders()
            .apply_transition(first.id, OrderStatus::Pending, OrderStatus::Approved, manager.id)
            .await
            .unwrap();

        let pending = db.orders().list(Some(OrderStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);
        assert_eq!(pending[0].items.len(), 1);

        let approved = db.orders().list(Some(OrderStatus::Approved)).await.unwrap();
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, first.id);

        assert!(db.orders().list(Some(OrderStatus::Received)).await.unwrap().is_empty());
        assert_eq!(db.orders().list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_approval_records_approver() {
        let db = database().await;
        let manager = user(&db, "manager@pos.com", RoleName::Manager).await;
        let (order, _, _) = pending_order(&db).await;

        let approved = db
            .orders()
            .apply_transition(order.id, OrderStatus::Pending, OrderStatus::Approved, manager.id)
            .await
            .unwrap();

        assert_eq!(approved.status, OrderStatus::Approved);
        assert_eq!(approved.approved_by, Some(manager.id));
        assert!(approved.approved_at.is_some());
        assert_eq!(approved.total_cents, order.total_cents);
    }

    #[tokio::test]
    async fn test_receive_restocks_products() {
        let db = database().await;
        let manager = user(&db, "manager@pos.com", RoleName::Manager).await;
        let (order, mouse, cable) = pending_order(&db).await;

        let repo = db.orders();
        repo.apply_transition(order.id, OrderStatus::Pending, OrderStatus::Approved, manager.id)
            .await
            .unwrap();
        repo.apply_transition(order.id, OrderStatus::Approved, OrderStatus::Sent, manager.id)
            .await
            .unwrap();
        let received = repo
            .apply_transition(order.id, OrderStatus::Sent, OrderStatus::Received, manager.id)
            .await
            .unwrap();

        assert_eq!(received.status, OrderStatus::Received);
        let stock = db.products().get_many(&[mouse, cable]).await.unwrap();
        assert_eq!(stock[&mouse].stock, 12);
        assert_eq!(stock[&cable].stock, 20);
    }

    #[tokio::test]
    async fn test_stale_transition_changes_nothing() {
        let db = database().await;
        let manager = user(&db, "manager@pos.com", RoleName::Manager).await;
        let (order, mouse, _) = pending_order(&db).await;

        let err = db
            .orders()
            .apply_transition(order.id, OrderStatus::Sent, OrderStatus::Received, manager.id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::StaleState { id, .. } if id == order.id));

        let unchanged = db.orders().get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(unchanged.status, OrderStatus::Pending);
        let product = db.products().get_by_id(mouse).await.unwrap().unwrap();
        assert_eq!(product.stock, 2);
    }
}
