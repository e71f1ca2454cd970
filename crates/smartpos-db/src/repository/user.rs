//! # User Repository
//!
//! Staff accounts. Every read joins the user's role so callers always get a
//! fully populated [`User`]; the password hash is only handed out by
//! [`UserRepository::find_credentials`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use smartpos_core::{Role, RoleName, User};

const USER_SELECT: &str = r#"
    SELECT
        u.id,
        u.email,
        u.name,
        u.password_hash,
        u.created_at,
        u.updated_at,
        r.id          AS role_id,
        r.name        AS role_name,
        r.permissions AS role_permissions,
        r.created_at  AS role_created_at
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct UserRecord {
    id: i64,
    email: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    role_id: i64,
    role_name: RoleName,
    role_permissions: String,
    role_created_at: DateTime<Utc>,
}

impl UserRecord {
    fn into_parts(self) -> DbResult<(User, String)> {
        let role = Role {
            id: self.role_id,
            name: self.role_name,
            permissions: serde_json::from_str(&self.role_permissions)?,
            created_at: self.role_created_at,
        };
        let user = User {
            id: self.id,
            email: self.email,
            name: self.name,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        Ok((user, self.password_hash))
    }

    fn into_user(self) -> DbResult<User> {
        self.into_parts().map(|(user, _)| user)
    }
}

/// Account to insert. The caller hashes the password.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role_id: i64,
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// All users, newest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!("{} ORDER BY u.created_at DESC, u.id DESC", USER_SELECT);
        let records: Vec<UserRecord> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        records.into_iter().map(UserRecord::into_user).collect()
    }

    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<User>> {
        let sql = format!("{} WHERE u.id = ?1", USER_SELECT);
        let record: Option<UserRecord> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        record.map(UserRecord::into_user).transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        Ok(self.find_credentials(email).await?.map(|(user, _)| user))
    }

    /// Looks up a user and their password hash for login.
    pub async fn find_credentials(&self, email: &str) -> DbResult<Option<(User, String)>> {
        let sql = format!("{} WHERE u.email = ?1", USER_SELECT);
        let record: Option<UserRecord> = sqlx::query_as(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;

        record.map(UserRecord::into_parts).transpose()
    }

    /// Inserts a user. A taken e-mail is a [`DbError::UniqueViolation`];
    /// an unknown role id is a [`DbError::ForeignKeyViolation`].
    pub async fn create(&self, input: &NewUser) -> DbResult<User> {
        let email = input.email.trim();
        debug!(email = %email, role_id = input.role_id, "Creating user");

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, name, role_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(email)
        .bind(&input.password_hash)
        .bind(input.name.trim())
        .bind(input.role_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(email))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Moves a user to another role.
    pub async fn update_role(&self, id: i64, role_id: i64) -> DbResult<User> {
        debug!(user_id = id, role_id, "Updating user role");

        let result = sqlx::query("UPDATE users SET role_id = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(role_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Deletes a user. Users that still own transactions or approvals fail
    /// with [`DbError::ForeignKeyViolation`].
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(user_id = id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
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
    use crate::repository::test_support::{database, user};

    #[tokio::test]
    async fn test_create_and_find_credentials() {
        let db = database().await;
        let created = user(&db, "cashier@pos.com", RoleName::Cashier).await;

        assert_eq!(created.role.name, RoleName::Cashier);
        assert!(!created.role.permissions.is_empty());

        let (found, hash) = db
            .users()
            .find_credentials(" cashier@pos.com ")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(hash, "hash");

        assert!(db.users().find_by_email("nobody@pos.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let db = database().await;
        user(&db, "manager@pos.com", RoleName::Manager).await;

        let role = db.roles().get_by_name(RoleName::Cashier).await.unwrap().unwrap();
        let err = db
            .users()
            .create(&NewUser {
                email: "manager@pos.com".to_string(),
                password_hash: "x".to_string(),
                name: "Other".to_string(),
                role_id: role.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_unknown_role_is_foreign_key_violation() {
        let db = database().await;
        let err = db
            .users()
            .create(&NewUser {
                email: "ghost@pos.com".to_string(),
                password_hash: "x".to_string(),
                name: "Ghost".to_string(),
                role_id: 999,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_role_and_delete() {
        let db = database().await;
        let created = user(&db, "staff@pos.com", RoleName::Cashier).await;
        let admin = db.roles().get_by_name(RoleName::Admin).await.unwrap().unwrap();

        let updated = db.users().update_role(created.id, admin.id).await.unwrap();
        assert_eq!(updated.role.name, RoleName::Admin);

        db.users().delete(created.id).await.unwrap();
        assert!(db.users().get_by_id(created.id).await.unwrap().is_none());
        assert!(matches!(
            db.users().delete(created.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = database().await;
        let first = user(&db, "a@pos.com", RoleName::Cashier).await;
        let second = user(&db, "b@pos.com", RoleName::Manager).await;

        let ids: Vec<i64> = db.users().list().await.unwrap().iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
