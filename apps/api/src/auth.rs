//! JWT authentication module.
//!
//! Token issuing and validation, password hashing, and the [`Session`]
//! extractor that turns an `Authorization: Bearer` header into the request's
//! actor.
//!
//! ```text
//! Authorization: Bearer <jwt>
//!        │
//!        ▼
//! validate signature + exp ──► claims.sub (user id)
//!        │                           │
//!        │ invalid / expired         ▼
//!        ▼                    re-read user + role
//!   Session { user: None }           │
//!                                    ▼
//!                          Session { user: Some(..) }
//! ```
//!
//! A bad token never fails the request by itself; the service gate decides
//! whether an anonymous caller is acceptable.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use smartpos_core::{Actor, RoleName, User};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub email: String,

    pub role: RoleName,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

/// JWT token manager.
pub struct JwtManager {
    secret: String,
    lifetime_secs: i64,
}

impl JwtManager {
    pub fn new(secret: String, lifetime_secs: i64) -> Self {
        JwtManager {
            secret,
            lifetime_secs,
        }
    }

    /// Issue a signed token for `user`.
    pub fn issue(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.name,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!("Failed to generate token: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }

    /// Validate and decode a token.
    pub fn validate(&self, token: &str) -> ApiResult<Claims> {
        let token_data: TokenData<Claims> = decode(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::unauthenticated(format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Hash a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            ApiError::internal("Failed to hash password")
        })?;

    Ok(hash.to_string())
}

/// Check `password` against a stored argon2 hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

// =============================================================================
// Session Extractor
// =============================================================================

/// The user behind the request, if any.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<User>,
}

impl Session {
    pub fn actor(&self) -> Option<Actor> {
        self.user.as_ref().map(Actor::from)
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token);

        let Some(token) = token else {
            return Ok(Session::default());
        };

        let claims = match state.jwt.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(reason = %e.message, "Ignoring bearer token");
                return Ok(Session::default());
            }
        };

        let Some(user_id) = claims.user_id() else {
            debug!(sub = %claims.sub, "Token subject is not a user id");
            return Ok(Session::default());
        };

        // Role changes and deletions take effect on the next request.
        let user = state.db.users().get_by_id(user_id).await?;

        Ok(Session { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartpos_core::Role;

    fn user(role: RoleName) -> User {
        let now = Utc::now();
        User {
            id: 7,
            email: "cashier@pos.com".to_string(),
            name: "Cashier User".to_string(),
            role: Role {
                id: 1,
                name: role,
                permissions: role.default_permissions(),
                created_at: now,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret".to_string(), 3600);
        let token = manager.issue(&user(RoleName::Cashier)).unwrap();

        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.email, "cashier@pos.com");
        assert_eq!(claims.role, RoleName::Cashier);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtManager::new("secret-a".to_string(), 3600);
        let verifier = JwtManager::new("secret-b".to_string(), 3600);
        let token = issuer.issue(&user(RoleName::Admin)).unwrap();

        assert!(verifier.validate(&token).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let manager = JwtManager::new("test-secret".to_string(), -3600);
        let token = manager.issue(&user(RoleName::Manager)).unwrap();

        assert!(manager.validate(&token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic dXNlcjpwYXNz"), None);
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("cashier123").unwrap();
        assert_ne!(hash, "cashier123");
        assert!(verify_password("cashier123", &hash));
        assert!(!verify_password("wrong", &hash));
        assert!(!verify_password("cashier123", "not-a-hash"));
    }
}
