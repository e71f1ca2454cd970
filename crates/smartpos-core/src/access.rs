//! # Access Gate
//!
//! Role checks run at the top of every service operation.
//!
//! ```text
//! request ──► Option<Actor> ──► require_* ──► Ok(&Actor) ──► operation
//!                                   │
//!                                   ├── None           → Unauthenticated
//!                                   └── role too low   → Forbidden
//! ```
//!
//! The checks are pure: they look only at the actor resolved for the
//! request and never touch the database.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{RoleName, User};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub role: RoleName,
    pub permissions: Vec<String>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.name,
            permissions: user.role.permissions.clone(),
        }
    }
}

impl From<User> for Actor {
    fn from(user: User) -> Self {
        Actor {
            user_id: user.id,
            email: user.email,
            name: user.name,
            role: user.role.name,
            permissions: user.role.permissions,
        }
    }
}

/// Fails with `Unauthenticated` when no actor is present.
pub fn require_auth(actor: Option<&Actor>) -> CoreResult<&Actor> {
    actor.ok_or(CoreError::Unauthenticated)
}

/// Requires the actor's role to be at least `min` in the hierarchy.
///
/// ## Example
/// ```rust
/// use smartpos_core::access::{require_min_role, Actor};
/// use smartpos_core::RoleName;
///
/// let manager = Actor {
///     user_id: 2,
///     email: "manager@pos.com".into(),
///     name: "Manager".into(),
///     role: RoleName::Manager,
///     permissions: vec![],
/// };
///
/// assert!(require_min_role(Some(&manager), RoleName::Cashier).is_ok());
/// assert!(require_min_role(Some(&manager), RoleName::Admin).is_err());
/// ```
pub fn require_min_role(actor: Option<&Actor>, min: RoleName) -> CoreResult<&Actor> {
    let actor = require_auth(actor)?;

    if actor.role < min {
        return Err(CoreError::Forbidden);
    }

    Ok(actor)
}

/// Requires the actor's role to be one of `allowed` (exact match, no hierarchy).
pub fn require_role<'a>(actor: Option<&'a Actor>, allowed: &[RoleName]) -> CoreResult<&'a Actor> {
    let actor = require_auth(actor)?;

    if !allowed.contains(&actor.role) {
        return Err(CoreError::Forbidden);
    }

    Ok(actor)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: RoleName) -> Actor {
        Actor {
            user_id: role.level() as i64,
            email: format!("{}@pos.com", role),
            name: role.to_string(),
            role,
            permissions: role.default_permissions(),
        }
    }

    #[test]
    fn test_missing_actor_is_unauthenticated() {
        assert!(matches!(require_auth(None), Err(CoreError::Unauthenticated)));
        assert!(matches!(
            require_min_role(None, RoleName::Cashier),
            Err(CoreError::Unauthenticated)
        ));
        assert!(matches!(
            require_role(None, &[RoleName::Admin]),
            Err(CoreError::Unauthenticated)
        ));
    }

    #[test]
    fn test_min_role_matrix() {
        for holder in RoleName::ALL {
            for required in RoleName::ALL {
                let a = actor(holder);
                let result = require_min_role(Some(&a), required);
                assert_eq!(result.is_ok(), holder.level() >= required.level());
            }
        }
    }

    #[test]
    fn test_cashier_cannot_reach_manager_operations() {
        let cashier = actor(RoleName::Cashier);
        assert!(matches!(
            require_min_role(Some(&cashier), RoleName::Manager),
            Err(CoreError::Forbidden)
        ));
    }

    #[test]
    fn test_exact_role_ignores_hierarchy() {
        let admin = actor(RoleName::Admin);
        assert!(require_role(Some(&admin), &[RoleName::Admin]).is_ok());
        assert!(matches!(
            require_role(Some(&admin), &[RoleName::Manager]),
            Err(CoreError::Forbidden)
        ));
    }
}
