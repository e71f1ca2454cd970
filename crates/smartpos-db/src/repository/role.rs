//! # Role Repository
//!
//! Permissions are stored as a JSON array in a TEXT column and parsed on
//! read, so a role row maps through a private record type.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use smartpos_core::{Role, RoleName};

#[derive(Debug, sqlx::FromRow)]
struct RoleRecord {
    id: i64,
    name: RoleName,
    permissions: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RoleRecord> for Role {
    type Error = DbError;

    fn try_from(record: RoleRecord) -> DbResult<Self> {
        Ok(Role {
            id: record.id,
            name: record.name,
            permissions: serde_json::from_str(&record.permissions)?,
            created_at: record.created_at,
        })
    }
}

/// Repository for role database operations.
#[derive(Debug, Clone)]
pub struct RoleRepository {
    pool: SqlitePool,
}

impl RoleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RoleRepository { pool }
    }

    /// All roles ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Role>> {
        let records: Vec<RoleRecord> = sqlx::query_as(
            "SELECT id, name, permissions, created_at FROM roles ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(Role::try_from).collect()
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Role>> {
        let record: Option<RoleRecord> = sqlx::query_as(
            "SELECT id, name, permissions, created_at FROM roles WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        record.map(Role::try_from).transpose()
    }

    pub async fn get_by_name(&self, name: RoleName) -> DbResult<Option<Role>> {
        let record: Option<RoleRecord> = sqlx::query_as(
            "SELECT id, name, permissions, created_at FROM roles WHERE name = ?1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        record.map(Role::try_from).transpose()
    }

    /// Inserts a role. A second role with the same name is a
    /// [`DbError::UniqueViolation`].
    pub async fn create(&self, name: RoleName, permissions: &[String]) -> DbResult<Role> {
        debug!(role = %name, "Creating role");

        let permissions_json = serde_json::to_string(permissions)?;
        let result = sqlx::query(
            "INSERT INTO roles (name, permissions, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(name)
        .bind(&permissions_json)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(name.as_str()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Role", id))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
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
    use crate::repository::test_support::database;

    #[tokio::test]
    async fn test_builtin_roles_are_seeded() {
        let db = database().await;
        let roles = db.roles().list().await.unwrap();

        let names: Vec<RoleName> = roles.iter().map(|r| r.name).collect();
        assert_eq!(names, vec![RoleName::Admin, RoleName::Cashier, RoleName::Manager]);

        for role in roles {
            assert_eq!(role.permissions, role.name.default_permissions());
        }
    }

    #[tokio::test]
    async fn test_duplicate_role_is_rejected() {
        let db = database().await;
        let err = db
            .roles()
            .create(RoleName::Manager, &RoleName::Manager.default_permissions())
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "manager"));
        assert_eq!(db.roles().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_create_role_after_delete() {
        let db = database().await;
        sqlx::query("DELETE FROM roles WHERE name = 'cashier'")
            .execute(db.pool())
            .await
            .unwrap();

        let perms = vec!["products:read".to_string()];
        let role = db.roles().create(RoleName::Cashier, &perms).await.unwrap();
        assert_eq!(role.name, RoleName::Cashier);
        assert_eq!(role.permissions, perms);
        assert!(role.has_permission("products:read"));
    }
}
