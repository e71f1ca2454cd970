//! Registration, login and the current session.

use serde::{Deserialize, Serialize};
use smartpos_core::validation::{validate_email, validate_name, validate_password};
use smartpos_core::{AuditAction, AuditEntity, User};
use smartpos_db::{NewAuditEntry, NewUser};
use tracing::{info, warn};

use super::audit;
use crate::auth::{hash_password, verify_password, Session};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// A signed token and the user it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

pub async fn register(state: &AppState, input: RegisterInput) -> ApiResult<AuthPayload> {
    validate_email(&input.email)?;
    validate_password(&input.password)?;
    validate_name("name", &input.name)?;

    let role = state
        .db
        .roles()
        .get_by_id(input.role_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Role", input.role_id))?;

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
        NewAuditEntry::new(user.id, AuditAction::Register, AuditEntity::User).entity_id(user.id),
    )
    .await;

    info!(user_id = user.id, role = %user.role.name, "User registered");

    let token = state.jwt.issue(&user)?;
    Ok(AuthPayload { token, user })
}

pub async fn login(state: &AppState, input: LoginInput) -> ApiResult<AuthPayload> {
    let Some((user, password_hash)) = state.db.users().find_credentials(&input.email).await? else {
        warn!(email = %input.email.trim(), "Login for unknown e-mail");
        return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
    };

    if !verify_password(&input.password, &password_hash) {
        warn!(user_id = user.id, "Login with wrong password");
        return Err(ApiError::unauthenticated(INVALID_CREDENTIALS));
    }

    audit(
        state,
        NewAuditEntry::new(user.id, AuditAction::Login, AuditEntity::User).entity_id(user.id),
    )
    .await;

    info!(user_id = user.id, "User logged in");

    let token = state.jwt.issue(&user)?;
    Ok(AuthPayload { token, user })
}

/// The authenticated user, or `None` for an anonymous request.
pub fn current_user(session: Session) -> Option<User> {
    session.user
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testing::state;
    use smartpos_core::RoleName;

    async fn cashier_role_id(state: &AppState) -> i64 {
        state.db.roles().get_by_name(RoleName::Cashier).await.unwrap().unwrap().id
    }

    fn register_input(role_id: i64) -> RegisterInput {
        RegisterInput {
            email: "new@pos.com".to_string(),
            password: "secret123".to_string(),
            name: "New Cashier".to_string(),
            role_id,
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (state, _) = state().await;
        let role_id = cashier_role_id(&state).await;

        let registered = register(&state, register_input(role_id)).await.unwrap();
        assert_eq!(registered.user.role.name, RoleName::Cashier);
        let claims = state.jwt.validate(&registered.token).unwrap();
        assert_eq!(claims.user_id(), Some(registered.user.id));

        let logged_in = login(
            &state,
            LoginInput {
                email: "new@pos.com".to_string(),
                password: "secret123".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let logs = state.db.audit_logs().list(None, 10, 0).await.unwrap();
        let actions: Vec<AuditAction> = logs.iter().map(|l| l.action).collect();
        assert_eq!(actions, vec![AuditAction::Login, AuditAction::Register]);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_bad_input() {
        let (state, _) = state().await;
        let role_id = cashier_role_id(&state).await;
        register(&state, register_input(role_id)).await.unwrap();

        let err = register(&state, register_input(role_id)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadUserInput);
    }

    #[tokio::test]
    async fn test_login_failures_share_one_message() {
        let (state, _) = state().await;
        let role_id = cashier_role_id(&state).await;
        register(&state, register_input(role_id)).await.unwrap();

        let wrong_password = login(
            &state,
            LoginInput {
                email: "new@pos.com".to_string(),
                password: "nope".to_string(),
            },
        )
        .await
        .unwrap_err();
        let unknown = login(
            &state,
            LoginInput {
                email: "ghost@pos.com".to_string(),
                password: "secret123".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.code, ErrorCode::Unauthenticated);
        assert_eq!(wrong_password.message, unknown.message);
    }

    #[tokio::test]
    async fn test_register_rejects_unknown_role() {
        let (state, _) = state().await;
        let err = register(&state, register_input(999)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
