//! # Transaction Repository
//!
//! Sales transactions and their line items.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   record_sale (ONE SQL TRANSACTION)                     │
//! │                                                                         │
//! │  1. INSERT INTO transactions (...)                 → transaction id     │
//! │                                                                         │
//! │  2. INSERT INTO transaction_items (...)            × each planned line  │
//! │     (sku/name snapshots frozen here)                                    │
//! │                                                                         │
//! │  3. UPDATE products SET stock = stock - :qty                            │
//! │     WHERE id = :id AND stock >= :qty               × each product       │
//! │         │                                                               │
//! │         ├── 1 row  → continue                                           │
//! │         └── 0 rows → ROLLBACK, InsufficientStock                        │
//! │                                                                         │
//! │  4. COMMIT                                                              │
//! │                                                                         │
//! │  A concurrent sale can never drive stock below zero: the planner's      │
//! │  check is advisory, the guarded UPDATE is authoritative.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use smartpos_core::analytics::DateRange;
use smartpos_core::sale::{SalePlan, SaleRequest};
use smartpos_core::{Product, Transaction, TransactionItem};

const TRANSACTION_COLUMNS: &str = "id, user_id, total_cents, payment_method, customer_name, \
     customer_email, customer_mobile, created_at";

const ITEM_COLUMNS: &str = "id, transaction_id, product_id, sku_snapshot, name_snapshot, \
     quantity, price_cents, subtotal_cents";

/// Result of a committed sale.
#[derive(Debug, Clone)]
pub struct RecordedSale {
    pub transaction: Transaction,
    /// Every product whose stock the sale decremented, re-read after commit.
    pub touched_products: Vec<Product>,
}

/// Repository for sales transaction operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Persists a planned sale and decrements stock atomically.
    ///
    /// ## Returns
    /// * `Ok(RecordedSale)` - committed transaction with items
    /// * `Err(DbError::InsufficientStock)` - a guarded decrement lost a race;
    ///   nothing was written
    pub async fn record_sale(
        &self,
        user_id: i64,
        request: &SaleRequest,
        plan: &SalePlan,
    ) -> DbResult<RecordedSale> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO transactions (
                user_id, total_cents, payment_method,
                customer_name, customer_email, customer_mobile, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(user_id)
        .bind(plan.total_cents)
        .bind(request.payment_method)
        .bind(&request.customer_name)
        .bind(&request.customer_email)
        .bind(&request.customer_mobile)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let transaction_id = result.last_insert_rowid();
        debug!(transaction_id, lines = plan.lines.len(), "Inserting transaction items");

        for line in &plan.lines {
            sqlx::query(
                r#"
                INSERT INTO transaction_items (
                    transaction_id, product_id, sku_snapshot, name_snapshot,
                    quantity, price_cents, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(transaction_id)
            .bind(line.product_id)
            .bind(&line.sku)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.price_cents)
            .bind(line.subtotal_cents)
            .execute(&mut *tx)
            .await?;
        }

        let demand = plan.demand();
        for &(product_id, quantity) in &demand {
            let updated = sqlx::query(
                r#"
                UPDATE products SET
                    stock = stock - ?2,
                    updated_at = ?3
                WHERE id = ?1 AND stock >= ?2
                "#,
            )
            .bind(product_id)
            .bind(quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                warn!(product_id, requested = quantity, "Stock changed under sale, rolling back");
                tx.rollback()
                    .await
                    .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
                return Err(DbError::InsufficientStock {
                    product_id,
                    requested: quantity,
                });
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            transaction_id,
            user_id,
            total_cents = plan.total_cents,
            "Sale recorded"
        );

        let transaction = self
            .get_by_id(transaction_id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", transaction_id))?;

        let ids: Vec<i64> = demand.iter().map(|(id, _)| *id).collect();
        let mut products = self.products_by_id(&ids).await?;
        let touched_products = ids.iter().filter_map(|id| products.remove(id)).collect();

        Ok(RecordedSale {
            transaction,
            touched_products,
        })
    }

    /// Gets a transaction with its items.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLUMNS);
        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match transaction {
            Some(t) => Ok(self.attach_items(vec![t]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Lists transactions newest first, optionally only one cashier's.
    pub async fn list(
        &self,
        user_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Transaction>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM transactions", TRANSACTION_COLUMNS));
        if let Some(user_id) = user_id {
            builder.push(" WHERE user_id = ").push_bind(user_id);
        }
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let transactions = builder
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(transactions).await
    }

    /// All transactions inside `range`, oldest first, with items.
    pub async fn list_in_range(&self, range: &DateRange) -> DbResult<Vec<Transaction>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM transactions WHERE 1 = 1",
            TRANSACTION_COLUMNS
        ));
        if let Some(start) = range.start {
            builder.push(" AND created_at >= ").push_bind(start);
        }
        if let Some(end) = range.end {
            builder.push(" AND created_at <= ").push_bind(end);
        }
        builder.push(" ORDER BY created_at ASC, id ASC");

        let transactions = builder
            .build_query_as::<Transaction>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_items(transactions).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Loads items for all given transactions in one query.
    async fn attach_items(&self, mut transactions: Vec<Transaction>) -> DbResult<Vec<Transaction>> {
        if transactions.is_empty() {
            return Ok(transactions);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM transaction_items WHERE transaction_id IN (",
            ITEM_COLUMNS
        ));
        let mut separated = builder.separated(", ");
        for t in &transactions {
            separated.push_bind(t.id);
        }
        separated.push_unseparated(") ORDER BY id ASC");

        let items = builder
            .build_query_as::<TransactionItem>()
            .fetch_all(&self.pool)
            .await?;

        let mut by_transaction: HashMap<i64, Vec<TransactionItem>> = HashMap::new();
        for item in items {
            by_transaction.entry(item.transaction_id).or_default().push(item);
        }
        for t in &mut transactions {
            t.items = by_transaction.remove(&t.id).unwrap_or_default();
        }

        Ok(transactions)
    }

    async fn products_by_id(&self, ids: &[i64]) -> DbResult<HashMap<i64, Product>> {
        crate::repository::product::ProductRepository::new(self.pool.clone())
            .get_many(ids)
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, product, supplier, user};
    use smartpos_core::sale::{plan_sale, SaleLine};
    use smartpos_core::{PaymentMethod, RoleName};

    fn request(lines: &[(i64, i64)]) -> SaleRequest {
        SaleRequest {
            items: lines
                .iter()
                .map(|(product_id, quantity)| SaleLine {
                    product_id: *product_id,
                    quantity: *quantity,
                    price_cents: 1000,
                })
                .collect(),
            payment_method: PaymentMethod::Card,
            customer_name: Some("Jane".to_string()),
            customer_email: None,
            customer_mobile: None,
        }
    }

    #[tokio::test]
    async fn test_record_sale_decrements_stock() {
        let db = database().await;
        let cashier = user(&db, "cashier@pos.com", RoleName::Cashier).await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        let mouse = product(&db, vendor.id, "TECH-001", 10).await;
        let cable = product(&db, vendor.id, "TECH-002", 3).await;

        let req = request(&[(mouse.id, 2), (cable.id, 1), (mouse.id, 1)]);
        let products = db.products().get_many(&[mouse.id, cable.id]).await.unwrap();
        let plan = plan_sale(&req, &products).unwrap();

        let recorded = db
            .transactions()
            .record_sale(cashier.id, &req, &plan)
            .await
            .unwrap();

        let t = &recorded.transaction;
        assert_eq!(t.total_cents, 4000);
        assert_eq!(t.payment_method, PaymentMethod::Card);
        assert_eq!(t.items.len(), 3);
        assert_eq!(t.items[0].sku_snapshot, "TECH-001");

        let stock: Vec<(i64, i64)> = recorded
            .touched_products
            .iter()
            .map(|p| (p.id, p.stock))
            .collect();
        assert_eq!(stock, vec![(mouse.id, 7), (cable.id, 2)]);
    }

    #[tokio::test]
    async fn test_guarded_decrement_rolls_back() {
        let db = database().await;
        let cashier = user(&db, "cashier@pos.com", RoleName::Cashier).await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        let mouse = product(&db, vendor.id, "TECH-001", 5).await;

        let req = request(&[(mouse.id, 4)]);
        let products = db.products().get_many(&[mouse.id]).await.unwrap();
        let plan = plan_sale(&req, &products).unwrap();

        // Another terminal sells first; the plan is now stale.
        db.products().set_stock(mouse.id, 2).await.unwrap();

        let err = db
            .transactions()
            .record_sale(cashier.id, &req, &plan)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::InsufficientStock { product_id, requested: 4 } if product_id == mouse.id
        ));

        assert_eq!(db.transactions().count().await.unwrap(), 0);
        let after = db.products().get_by_id(mouse.id).await.unwrap().unwrap();
        assert_eq!(after.stock, 2);
    }

    #[tokio::test]
    async fn test_list_filters_by_user_and_pages() {
        let db = database().await;
        let alice = user(&db, "alice@pos.com", RoleName::Cashier).await;
        let bob = user(&db, "bob@pos.com", RoleName::Cashier).await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        let item = product(&db, vendor.id, "TECH-001", 100).await;

        let repo = db.transactions();
        let mut alice_ids = Vec::new();
        for cashier in [&alice, &bob, &alice] {
            let req = request(&[(item.id, 1)]);
            let products = db.products().get_many(&[item.id]).await.unwrap();
            let plan = plan_sale(&req, &products).unwrap();
            let recorded = repo.record_sale(cashier.id, &req, &plan).await.unwrap();
            if cashier.id == alice.id {
                alice_ids.push(recorded.transaction.id);
            }
        }

        let all = repo.list(None, 50, 0).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].id > all[1].id);
        assert!(all.iter().all(|t| t.items.len() == 1));

        let mine: Vec<i64> = repo
            .list(Some(alice.id), 50, 0)
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        alice_ids.reverse();
        assert_eq!(mine, alice_ids);

        assert_eq!(repo.list(None, 1, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_in_range() {
        let db = database().await;
        let cashier = user(&db, "cashier@pos.com", RoleName::Cashier).await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        let item = product(&db, vendor.id, "TECH-001", 100).await;

        let req = request(&[(item.id, 1)]);
        let products = db.products().get_many(&[item.id]).await.unwrap();
        let plan = plan_sale(&req, &products).unwrap();
        db.transactions()
            .record_sale(cashier.id, &req, &plan)
            .await
            .unwrap();

        let everything = DateRange::parse(None, None).unwrap();
        assert_eq!(db.transactions().list_in_range(&everything).await.unwrap().len(), 1);

        let past = DateRange::parse(Some("2020-01-01"), Some("2020-12-31")).unwrap();
        assert!(db.transactions().list_in_range(&past).await.unwrap().is_empty());
    }
}
