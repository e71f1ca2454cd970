//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Who changes products.stock?                                            │
//! │                                                                         │
//! │  set_stock()          manager override, absolute value                  │
//! │  record_sale()        guarded decrement   (transaction.rs)              │
//! │  apply_transition()   increment on receipt (order.rs)                   │
//! │                                                                         │
//! │  The CHECK (stock >= 0) constraint backs all three.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use smartpos_core::catalog::NewProduct;
use smartpos_core::Product;

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, sku, description, price_cents, cost_cents, \
     stock, low_stock_threshold, supplier_id, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {} FROM products ORDER BY name ASC, id ASC", PRODUCT_COLUMNS);
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Loads the given products keyed by id. Missing ids are simply absent.
    pub async fn get_many(&self, ids: &[i64]) -> DbResult<HashMap<i64, Product>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM products WHERE id IN (", PRODUCT_COLUMNS));
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let products = builder
            .build_query_as::<Product>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products.into_iter().map(|p| (p.id, p)).collect())
    }

    /// Products at or below their reorder threshold, emptiest first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE stock <= low_stock_threshold ORDER BY stock ASC, id ASC",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    pub async fn list_by_supplier(&self, supplier_id: i64) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE supplier_id = ?1 ORDER BY name ASC, id ASC",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(supplier_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a product. Duplicate SKUs and unknown suppliers are rejected by
    /// the schema.
    pub async fn create(&self, input: &NewProduct) -> DbResult<Product> {
        let sku = input.sku.trim();
        debug!(sku = %sku, "Creating product");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO products (
                name, sku, description, price_cents, cost_cents,
                stock, low_stock_threshold, supplier_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(input.name.trim())
        .bind(sku)
        .bind(&input.description)
        .bind(input.price_cents)
        .bind(input.cost_cents)
        .bind(input.stock)
        .bind(input.low_stock_threshold)
        .bind(input.supplier_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(sku))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Writes every editable column of `product` back and bumps `updated_at`.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(product_id = product.id, sku = %product.sku, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                sku = ?3,
                description = ?4,
                price_cents = ?5,
                cost_cents = ?6,
                stock = ?7,
                low_stock_threshold = ?8,
                supplier_id = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(product.supplier_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(product.sku.as_str()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        self.get_by_id(product.id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product.id))
    }

    /// Sets the absolute stock level.
    pub async fn set_stock(&self, id: i64, stock: i64) -> DbResult<Product> {
        debug!(product_id = id, stock, "Setting stock");

        let result = sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(stock)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product. Products referenced by sales or orders fail with
    /// [`DbError::ForeignKeyViolation`].
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(product_id = id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{database, product, supplier};

    #[tokio::test]
    async fn test_create_and_get() {
        let db = database().await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        let created = product(&db, vendor.id, "TECH-001", 45).await;

        let fetched = db.products().get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.sku, "TECH-001");
        assert_eq!(fetched.supplier_id, vendor.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_reports_value() {
        let db = database().await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        product(&db, vendor.id, "TECH-001", 45).await;

        let err = db
            .products()
            .create(&NewProduct {
                name: "Copy".to_string(),
                sku: "TECH-001".to_string(),
                description: None,
                price_cents: 100,
                cost_cents: 50,
                stock: 1,
                low_stock_threshold: 0,
                supplier_id: vendor.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "TECH-001"));
    }

    #[tokio::test]
    async fn test_unknown_supplier_is_rejected() {
        let db = database().await;
        let err = db
            .products()
            .create(&NewProduct {
                name: "Orphan".to_string(),
                sku: "ORPH-1".to_string(),
                description: None,
                price_cents: 100,
                cost_cents: 50,
                stock: 1,
                low_stock_threshold: 0,
                supplier_id: 42,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_sorted_by_stock() {
        let db = database().await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        product(&db, vendor.id, "A", 50).await;
        let three = product(&db, vendor.id, "B", 3).await;
        let five = product(&db, vendor.id, "C", 5).await;
        let zero = product(&db, vendor.id, "D", 0).await;

        let ids: Vec<i64> = db
            .products()
            .low_stock()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![zero.id, three.id, five.id]);
    }

    #[tokio::test]
    async fn test_get_many_skips_missing() {
        let db = database().await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        let a = product(&db, vendor.id, "A", 1).await;
        let b = product(&db, vendor.id, "B", 1).await;

        let found = db.products().get_many(&[a.id, b.id, 999]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.contains_key(&a.id));
        assert!(db.products().get_many(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_stock_rejects_negative() {
        let db = database().await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        let item = product(&db, vendor.id, "A", 10).await;

        let updated = db.products().set_stock(item.id, 2).await.unwrap();
        assert_eq!(updated.stock, 2);
        assert!(updated.is_low_stock());

        assert!(db.products().set_stock(item.id, -1).await.is_err());
        assert!(matches!(
            db.products().set_stock(999, 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_and_list_by_supplier() {
        let db = database().await;
        let vendor = supplier(&db, "TechWorld Distributors").await;
        let other = supplier(&db, "Budget Wholesale").await;
        let a = product(&db, vendor.id, "A", 1).await;
        product(&db, other.id, "B", 1).await;

        assert_eq!(db.products().list_by_supplier(vendor.id).await.unwrap().len(), 1);

        db.products().delete(a.id).await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 1);
        assert!(db.products().list_by_supplier(vendor.id).await.unwrap().is_empty());
    }
}
