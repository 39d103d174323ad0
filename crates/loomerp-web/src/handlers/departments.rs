//! Departments.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use loomerp_common::{ApiError, Role};
use loomerp_db::departments::{Department, DepartmentFilter, NewDepartment, UpdateDepartment};
use loomerp_db::Page;

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const WRITE: &[Role] = &[Role::Admin, Role::Manager];

/// GET /api/departments
pub async fn list_departments(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiQuery(filter): ApiQuery<DepartmentFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<Department>>> {
    Ok(Json(state.departments().list(&filter, page).await?))
}

/// GET /api/departments/{id}
pub async fn get_department(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Department>> {
    let department = state
        .departments()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("department", id))?;
    Ok(Json(department))
}

/// POST /api/departments
pub async fn create_department(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(department): ApiJson<NewDepartment>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    Ok(created(state.departments().create(&department).await?))
}

/// PUT /api/departments/{id}
pub async fn update_department(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateDepartment>,
) -> ApiResult<Json<Department>> {
    caller.require(WRITE)?;
    Ok(Json(state.departments().update(id, &changes).await?))
}

/// DELETE /api/departments/{id}
pub async fn delete_department(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    state.departments().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
