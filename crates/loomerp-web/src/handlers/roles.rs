//! Role catalogue.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use loomerp_common::{ApiError, Role as BuiltinRole};
use loomerp_db::roles::{NewRole, Role, UpdateRole};
use loomerp_db::Page;

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const WRITE: &[BuiltinRole] = &[BuiltinRole::Admin];

/// GET /api/roles
pub async fn list_roles(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<Role>>> {
    Ok(Json(state.roles().list(page).await?))
}

/// GET /api/roles/{id}
pub async fn get_role(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Role>> {
    let role = state
        .roles()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("role", id))?;
    Ok(Json(role))
}

/// POST /api/roles
pub async fn create_role(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(role): ApiJson<NewRole>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    Ok(created(state.roles().create(&role).await?))
}

/// PUT /api/roles/{id}
pub async fn update_role(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateRole>,
) -> ApiResult<Json<Role>> {
    caller.require(WRITE)?;
    Ok(Json(state.roles().update(id, &changes).await?))
}

/// DELETE /api/roles/{id}
pub async fn delete_role(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    state.roles().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
