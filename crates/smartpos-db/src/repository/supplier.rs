//! # Supplier Repository

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use smartpos_core::catalog::NewSupplier;
use smartpos_core::Supplier;

const SUPPLIER_COLUMNS: &str =
    "id, name, contact, email, phone, address, created_at, updated_at";

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// All suppliers ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("SELECT {} FROM suppliers ORDER BY name ASC, id ASC", SUPPLIER_COLUMNS);
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(suppliers)
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {} FROM suppliers WHERE id = ?1", SUPPLIER_COLUMNS);
        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn create(&self, input: &NewSupplier) -> DbResult<Supplier> {
        debug!(name = %input.name, "Creating supplier");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO suppliers (name, contact, email, phone, address, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            "#,
        )
        .bind(input.name.trim())
        .bind(input.contact.trim())
        .bind(input.email.trim())
        .bind(input.phone.trim())
        .bind(&input.address)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Writes every editable column of `supplier` back and bumps `updated_at`.
    pub async fn update(&self, supplier: &Supplier) -> DbResult<Supplier> {
        debug!(supplier_id = supplier.id, "Updating supplier");

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?2,
                contact = ?3,
                email = ?4,
                phone = ?5,
                address = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", supplier.id));
        }

        self.get_by_id(supplier.id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", supplier.id))
    }

    /// Deletes a supplier. Suppliers with products or orders fail with
    /// [`DbError::ForeignKeyViolation`].
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(supplier_id = id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
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
    use smartpos_core::catalog::SupplierUpdate;

    #[tokio::test]
    async fn test_list_ordered_by_name() {
        let db = database().await;
        supplier(&db, "Office Supplies Co").await;
        supplier(&db, "Budget Wholesale").await;

        let names: Vec<String> = db
            .suppliers()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Budget Wholesale", "Office Supplies Co"]);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let db = database().await;
        let mut stored = supplier(&db, "TechWorld Distributors").await;

        SupplierUpdate {
            phone: Some("+1-555-9999".to_string()),
            ..Default::default()
        }
        .apply_to(&mut stored);
        let updated = db.suppliers().update(&stored).await.unwrap();

        assert_eq!(updated.phone, "+1-555-9999");
        assert_eq!(updated.name, "TechWorld Distributors");
        assert!(updated.updated_at >= updated.created_at);
    }

    #[tokio::test]
    async fn test_delete_with_products_is_blocked() {
        let db = database().await;
        let vendor = supplier(&db, "Premium Goods Ltd").await;
        product(&db, vendor.id, "PREM-001", 10).await;

        let err = db.suppliers().delete(vendor.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        let empty = supplier(&db, "Budget Wholesale").await;
        db.suppliers().delete(empty.id).await.unwrap();
        assert_eq!(db.suppliers().count().await.unwrap(), 1);
    }
}
