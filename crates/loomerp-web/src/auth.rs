//! Authentication: HS256 tokens, argon2 password hashes and the
//! [`AuthUser`] extractor used by every protected handler.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use loomerp_common::roles::role_matches;
use loomerp_common::{ApiError, ErpError, Role};
use loomerp_config::AuthConfig;
use loomerp_db::users::NewUser;
use loomerp_db::Database;
use loomerp_db::UserRepository;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{info, warn};

use crate::state::SharedState;

pub const MIN_PASSWORD_LEN: usize = 8;

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

pub fn issue_token(auth: &AuthConfig, user_id: i64, username: &str, role: &str) -> Result<String, ErpError> {
    let now = Utc::now();
    let exp = Duration::try_hours(auth.token_ttl_hours)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| ErpError::Token(format!("token lifetime of {} hours is out of range", auth.token_ttl_hours)))?;
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        role: role.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        iss: auth.issuer.clone(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(auth.jwt_secret.as_bytes()),
    )
    .map_err(|e| ErpError::Token(e.to_string()))
}

/// Check signature, expiry and issuer.
pub fn verify_token(auth: &AuthConfig, token: &str) -> Result<Claims, ErpError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[auth.issuer.as_str()]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(auth.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| ErpError::Token(e.to_string()))
}

pub fn validate_password(password: &str) -> Result<(), ErpError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ErpError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, ErpError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ErpError::PasswordHash(e.to_string()))
}

pub fn verify_password(password: &str, phc: &str) -> Result<bool, ErpError> {
    let parsed = PasswordHash::new(phc).map_err(|e| ErpError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| hash_password("loomerp-unknown-user").ok())
        .as_deref()
}

/// Run a full argon2 verification for a login whose username does not exist,
/// so it takes as long as a wrong password for a real account. Always `false`.
pub fn verify_unknown_user(password: &str) -> bool {
    if let Some(phc) = dummy_hash() {
        let _ = verify_password(password, phc);
    }
    false
}

/// The caller, as decoded from a valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    /// Role guard. `admin` always passes.
    pub fn require(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if role_matches(&self.role, allowed) {
            return Ok(());
        }
        warn!(user = %self.username, role = %self.role, "forbidden by role guard");
        Err(ApiError::Forbidden("insufficient role for this action".into()))
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = ErpError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| ErpError::Token(format!("invalid subject '{}'", claims.sub)))?;
        Ok(Self { id, username: claims.username, role: claims.role })
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &SharedState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("missing bearer token".into()))?;

        let claims = verify_token(state.auth(), bearer.token()).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            ApiError::Unauthorized("invalid or expired token".into())
        })?;
        AuthUser::try_from(claims).map_err(|_| ApiError::Unauthorized("invalid or expired token".into()))
    }
}

/// Create the configured administrator when no users exist yet.
pub async fn ensure_bootstrap_admin(db: &Database, auth: &AuthConfig) -> anyhow::Result<()> {
    let Some(admin) = &auth.bootstrap_admin else {
        return Ok(());
    };
    let users = UserRepository::new(db.clone());
    if users.count().await? > 0 {
        return Ok(());
    }

    validate_password(&admin.password)?;
    let hash = hash_password(&admin.password)?;
    let user = NewUser {
        username: admin.username.clone(),
        email: admin.email.clone(),
        full_name: "Administrator".to_string(),
        password: admin.password.clone(),
        role: Role::Admin.to_string(),
        department_id: None,
    };
    let created = users.create(&user, &hash).await?;
    info!(username = %created.username, "created bootstrap administrator");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthConfig {
        AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_token_round_trip() {
        let auth = auth();
        let token = issue_token(&auth, 42, "noor", "supervisor").unwrap();
        let claims = verify_token(&auth, &token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, "supervisor");
        assert_eq!(claims.iss, "loomerp");
        assert_eq!(claims.exp - claims.iat, 8 * 3600);

        let user = AuthUser::try_from(claims).unwrap();
        assert_eq!(user.id, 42);
    }

    #[test]
    fn test_token_with_wrong_secret_rejected() {
        let token = issue_token(&auth(), 1, "noor", "admin").unwrap();
        let other = AuthConfig {
            jwt_secret: "ffffffffffffffffffffffffffffffff".into(),
            ..Default::default()
        };
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn test_token_with_wrong_issuer_rejected() {
        let token = issue_token(&auth(), 1, "noor", "admin").unwrap();
        let other = AuthConfig { issuer: "someone-else".into(), ..auth() };
        assert!(verify_token(&other, &token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let expired = AuthConfig { token_ttl_hours: -2, ..auth() };
        let token = issue_token(&expired, 1, "noor", "admin").unwrap();
        assert!(verify_token(&auth(), &token).is_err());
    }

    #[test]
    fn test_oversized_ttl_is_token_error() {
        let huge = AuthConfig { token_ttl_hours: i64::MAX / 2, ..auth() };
        assert!(matches!(issue_token(&huge, 1, "noor", "admin"), Err(ErpError::Token(_))));
    }

    #[test]
    fn test_password_hash_and_verify() {
        let hash = hash_password("warp-and-weft").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("warp-and-weft", &hash).unwrap());
        assert!(!verify_password("warp-and-wefts", &hash).unwrap());
        assert!(verify_password("x", "not a phc string").is_err());
    }

    #[test]
    fn test_unknown_user_pays_for_a_real_verify() {
        assert!(dummy_hash().is_some_and(|phc| phc.starts_with("$argon2")));
        assert!(!verify_unknown_user("loomerp-unknown-user"));
        assert!(!verify_unknown_user("anything"));
    }

    #[test]
    fn test_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_guard() {
        let user = AuthUser { id: 3, username: "lena".into(), role: "warehouse".into() };
        assert!(user.require(&[Role::Warehouse, Role::Manager]).is_ok());
        assert!(matches!(user.require(&[Role::Accountant]), Err(ApiError::Forbidden(_))));
    }
}
