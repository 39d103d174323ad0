//! Attendance: HR administration plus self-service check-in/check-out.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Local;
use loomerp_common::{ApiError, Role};
use loomerp_db::attendance::{AttendanceFilter, AttendanceRecord, NewAttendance, UpdateAttendance};
use loomerp_db::Page;
use tracing::info;

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const READ: &[Role] = &[Role::Admin, Role::Hr, Role::Manager];
const WRITE: &[Role] = &[Role::Admin, Role::Hr];

/// GET /api/attendance
pub async fn list_attendance(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiQuery(filter): ApiQuery<AttendanceFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    caller.require(READ)?;
    Ok(Json(state.attendance().list(&filter, page).await?))
}

/// GET /api/attendance/me - the caller's own records
pub async fn my_attendance(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiQuery(filter): ApiQuery<AttendanceFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<AttendanceRecord>>> {
    let filter = AttendanceFilter { user_id: Some(caller.id), ..filter };
    Ok(Json(state.attendance().list(&filter, page).await?))
}

/// POST /api/attendance/check-in
pub async fn check_in(
    State(state): State<SharedState>,
    caller: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let record = state.attendance().check_in(caller.id, Local::now().naive_local()).await?;
    info!(user = %caller.username, status = %record.status, "checked in");
    Ok(created(record))
}

/// POST /api/attendance/check-out
pub async fn check_out(
    State(state): State<SharedState>,
    caller: AuthUser,
) -> ApiResult<Json<AttendanceRecord>> {
    let record = state.attendance().check_out(caller.id, Local::now().naive_local()).await?;
    info!(user = %caller.username, hours = record.hours_worked.unwrap_or_default(), "checked out");
    Ok(Json(record))
}

/// GET /api/attendance/{id}
pub async fn get_attendance(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<AttendanceRecord>> {
    let record = state
        .attendance()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("attendance record", id))?;
    if record.user_id != caller.id {
        caller.require(READ)?;
    }
    Ok(Json(record))
}

/// POST /api/attendance
pub async fn create_attendance(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(record): ApiJson<NewAttendance>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    Ok(created(state.attendance().create(&record).await?))
}

/// PUT /api/attendance/{id}
pub async fn update_attendance(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateAttendance>,
) -> ApiResult<Json<AttendanceRecord>> {
    caller.require(WRITE)?;
    Ok(Json(state.attendance().update(id, &changes).await?))
}

/// DELETE /api/attendance/{id}
pub async fn delete_attendance(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    state.attendance().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
