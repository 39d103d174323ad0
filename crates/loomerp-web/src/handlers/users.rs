//! User administration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use loomerp_common::{ApiError, Role};
use loomerp_db::users::{NewUser, UpdateUser, User, UserFilter};
use loomerp_db::Page;

use super::auth::create_user;
use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const READ: &[Role] = &[Role::Admin, Role::Hr, Role::Manager];
const WRITE: &[Role] = &[Role::Admin];

/// GET /api/users
pub async fn list_users(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiQuery(filter): ApiQuery<UserFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<User>>> {
    caller.require(READ)?;
    Ok(Json(state.users().list(&filter, page).await?))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<User>> {
    caller.require(READ)?;
    let user = state
        .users()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user", id))?;
    Ok(Json(user))
}

/// POST /api/users
pub async fn create_user_handler(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(new_user): ApiJson<NewUser>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    create_user(&state, &new_user).await.map(created)
}

/// PUT /api/users/{id}
pub async fn update_user(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateUser>,
) -> ApiResult<Json<User>> {
    caller.require(WRITE)?;
    if id == caller.id && changes.active == Some(false) {
        return Err(ApiError::BadRequest("you cannot deactivate your own account".into()));
    }
    Ok(Json(state.users().update(id, &changes).await?))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    if id == caller.id {
        return Err(ApiError::BadRequest("you cannot delete your own account".into()));
    }
    state.users().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
