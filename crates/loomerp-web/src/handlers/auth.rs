//! Login, registration and the caller's own account.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use loomerp_common::{ApiError, Role};
use loomerp_db::users::{NewUser, User};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{created, ApiResult};
use crate::auth::{
    hash_password, issue_token, validate_password, verify_password, verify_unknown_user, AuthUser,
};
use crate::extract::ApiJson;
use crate::state::SharedState;

const BAD_CREDENTIALS: &str = "invalid username or password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest("username and password are required".into()));
    }

    let users = state.users();
    let Some(creds) = users.find_credentials(&req.username).await? else {
        verify_unknown_user(&req.password);
        warn!(username = %req.username, "login for unknown user");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    };
    let password_ok = verify_password(&req.password, &creds.password_hash)?;
    if !creds.active || !password_ok {
        warn!(username = %creds.username, active = creds.active, "login rejected");
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.into()));
    }

    let token = issue_token(state.auth(), creds.id, &creds.username, &creds.role)?;
    let user = users
        .find_by_id(creds.id)
        .await?
        .ok_or_else(|| ApiError::not_found("user", creds.id))?;
    info!(username = %user.username, role = %user.role, "login");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.auth().token_ttl_hours * 3600,
        user,
    }))
}

/// POST /api/auth/register - admin creates an account
pub async fn register(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<impl IntoResponse> {
    caller.require(&[Role::Admin])?;
    create_user(&state, &new_user).await.map(created)
}

/// Shared by register and POST /api/users.
pub(crate) async fn create_user(state: &SharedState, new_user: &NewUser) -> ApiResult<User> {
    new_user.validate()?;
    validate_password(&new_user.password)?;
    let hash = hash_password(&new_user.password)?;
    let user = state.users().create(new_user, &hash).await?;
    info!(username = %user.username, role = %user.role, "user created");
    Ok(user)
}

/// GET /api/auth/me
pub async fn me(State(state): State<SharedState>, caller: AuthUser) -> ApiResult<Json<User>> {
    let user = state
        .users()
        .find_by_id(caller.id)
        .await?
        .ok_or_else(|| ApiError::not_found("user", caller.id))?;
    Ok(Json(user))
}

/// PUT /api/auth/password
pub async fn change_password(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(req): ApiJson<ChangePassword>,
) -> ApiResult<StatusCode> {
    validate_password(&req.new_password)?;
    let users = state.users();
    let current = users.password_hash(caller.id).await?;
    if !verify_password(&req.current_password, &current)? {
        warn!(user = %caller.username, "password change with wrong current password");
        return Err(ApiError::Unauthorized("current password is incorrect".into()));
    }
    let hash = hash_password(&req.new_password)?;
    users.set_password(caller.id, &hash).await?;
    info!(user = %caller.username, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
