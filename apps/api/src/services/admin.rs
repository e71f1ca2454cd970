//! # Administration
//!
//! Users, roles, the audit trail and store settings. Admin only, except
//! reading a single setting which managers may do.

use serde::Deserialize;
use serde_json::json;
use smartpos_core::access::{require_min_role, require_role};
use smartpos_core::validation::{validate_email, validate_name, validate_page, validate_password};
use smartpos_core::{
    Actor, AuditAction, AuditEntity, AuditLog, ConfigKey, Role, RoleName, SystemConfig, User,
    DEFAULT_AUDIT_PAGE,
};
use smartpos_db::{NewAuditEntry, NewUser};
use tracing::info;

use super::{audit, OperationResult};
use crate::auth::hash_password;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const ADMIN_ONLY: &[RoleName] = &[RoleName::Admin];

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleInput {
    pub role_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoleInput {
    pub name: String,
    /// Defaults to the built-in set for the role.
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub entity: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetConfigInput {
    pub value: String,
}

// =============================================================================
// Users
// =============================================================================

pub async fn list_users(state: &AppState, actor: Option<&Actor>) -> ApiResult<Vec<User>> {
    require_role(actor, ADMIN_ONLY)?;
    Ok(state.db.users().list().await?)
}

pub async fn get_user(state: &AppState, actor: Option<&Actor>, id: i64) -> ApiResult<User> {
    require_role(actor, ADMIN_ONLY)?;
    state
        .db
        .users()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))
}

pub async fn create_user(
    state: &AppState,
    actor: Option<&Actor>,
    input: CreateUserInput,
) -> ApiResult<User> {
    let actor = require_role(actor, ADMIN_ONLY)?;
    validate_email(&input.email)?;
    validate_password(&input.password)?;
    validate_name("name", &input.name)?;
    let role = load_role(state, input.role_id).await?;

    let user = state
        .db
        .users()
        .create(&NewUser {
            email: input.email,
            password_hash: hash_password(&input.password)?,
            name: input.name,
            role_id: role.id,
        })
        .await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::CreateUser, AuditEntity::User)
            .entity_id(user.id)
            .changes(json!({ "email": user.email, "role": role.name })),
    )
    .await;

    info!(user_id = user.id, role = %role.name, "User created");
    Ok(user)
}

pub async fn update_user_role(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
    input: UpdateRoleInput,
) -> ApiResult<User> {
    let actor = require_role(actor, ADMIN_ONLY)?;
    let role = load_role(state, input.role_id).await?;

    let user = state.db.users().update_role(id, role.id).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::UpdateRole, AuditEntity::User)
            .entity_id(id)
            .changes(json!({ "role": role.name })),
    )
    .await;

    Ok(user)
}

/// Deletes a user. Admins cannot delete themselves.
pub async fn delete_user(
    state: &AppState,
    actor: Option<&Actor>,
    id: i64,
) -> ApiResult<OperationResult> {
    let actor = require_role(actor, ADMIN_ONLY)?;
    if actor.user_id == id {
        return Err(ApiError::bad_input("Cannot delete your own account"));
    }

    state.db.users().delete(id).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::DeleteUser, AuditEntity::User).entity_id(id),
    )
    .await;

    info!(user_id = id, "User deleted");
    Ok(OperationResult::ok("User deleted"))
}

// =============================================================================
// Roles
// =============================================================================

pub async fn list_roles(state: &AppState, actor: Option<&Actor>) -> ApiResult<Vec<Role>> {
    require_role(actor, ADMIN_ONLY)?;
    Ok(state.db.roles().list().await?)
}

pub async fn create_role(
    state: &AppState,
    actor: Option<&Actor>,
    input: CreateRoleInput,
) -> ApiResult<Role> {
    let actor = require_role(actor, ADMIN_ONLY)?;
    let name: RoleName = input.name.parse()?;

    let mut permissions: Vec<String> = Vec::new();
    for permission in input.permissions.unwrap_or_else(|| name.default_permissions()) {
        let permission = permission.trim().to_string();
        if !permission.is_empty() && !permissions.contains(&permission) {
            permissions.push(permission);
        }
    }

    let role = state.db.roles().create(name, &permissions).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::CreateRole, AuditEntity::Role)
            .entity_id(role.id)
            .changes(json!({ "name": role.name, "permissions": role.permissions })),
    )
    .await;

    Ok(role)
}

// =============================================================================
// Audit Trail
// =============================================================================

pub async fn audit_logs(
    state: &AppState,
    actor: Option<&Actor>,
    query: AuditQuery,
) -> ApiResult<Vec<AuditLog>> {
    require_role(actor, ADMIN_ONLY)?;

    let limit = query.limit.unwrap_or(DEFAULT_AUDIT_PAGE);
    let offset = query.offset.unwrap_or(0);
    validate_page(limit, offset)?;

    let entity = query
        .entity
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .map(|e| e.trim().parse::<AuditEntity>())
        .transpose()?;

    Ok(state.db.audit_logs().list(entity, limit, offset).await?)
}

// =============================================================================
// System Configuration
// =============================================================================

pub async fn list_system_configs(
    state: &AppState,
    actor: Option<&Actor>,
) -> ApiResult<Vec<SystemConfig>> {
    require_role(actor, ADMIN_ONLY)?;
    Ok(state.db.configs().list().await?)
}

/// A stored setting, or `None` when it has never been set.
pub async fn get_system_config(
    state: &AppState,
    actor: Option<&Actor>,
    key: &str,
) -> ApiResult<Option<SystemConfig>> {
    require_min_role(actor, RoleName::Manager)?;
    let key: ConfigKey = key.parse()?;
    Ok(state.db.configs().get(key).await?)
}

pub async fn set_system_config(
    state: &AppState,
    actor: Option<&Actor>,
    key: &str,
    input: SetConfigInput,
) -> ApiResult<SystemConfig> {
    let actor = require_role(actor, ADMIN_ONLY)?;
    let key: ConfigKey = key.parse()?;

    let entry = state.db.configs().set(key, &input.value, actor.user_id).await?;

    audit(
        state,
        NewAuditEntry::new(actor.user_id, AuditAction::SetConfig, AuditEntity::SystemConfig)
            .entity_id(entry.id)
            .changes(json!({ "key": entry.key, "value": entry.value })),
    )
    .await;

    info!(key = %key, "System config updated");
    Ok(entry)
}

async fn load_role(state: &AppState, id: i64) -> ApiResult<Role> {
    state
        .db
        .roles()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role", id))
}
