//! Plant equipment.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use loomerp_common::{ApiError, Role};
use loomerp_db::equipment::{Equipment, EquipmentFilter, EquipmentStatus, NewEquipment, UpdateEquipment};
use loomerp_db::Page;
use serde::Deserialize;
use tracing::info;

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const WRITE: &[Role] = &[Role::Admin, Role::Manager, Role::Maintenance];

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: EquipmentStatus,
}

/// GET /api/equipment
pub async fn list_equipment(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiQuery(filter): ApiQuery<EquipmentFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<Equipment>>> {
    Ok(Json(state.equipment().list(&filter, page).await?))
}

/// GET /api/equipment/{id}
pub async fn get_equipment(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Equipment>> {
    let item = state
        .equipment()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("equipment", id))?;
    Ok(Json(item))
}

/// POST /api/equipment
pub async fn create_equipment(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(item): ApiJson<NewEquipment>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    Ok(created(state.equipment().create(&item).await?))
}

/// PUT /api/equipment/{id}
pub async fn update_equipment(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateEquipment>,
) -> ApiResult<Json<Equipment>> {
    caller.require(WRITE)?;
    Ok(Json(state.equipment().update(id, &changes).await?))
}

/// PUT /api/equipment/{id}/status
pub async fn set_equipment_status(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(change): ApiJson<StatusChange>,
) -> ApiResult<Json<Equipment>> {
    caller.require(WRITE)?;
    let item = state.equipment().set_status(id, change.status).await?;
    info!(equipment = %item.code, status = %item.status, by = %caller.username, "equipment status changed");
    Ok(Json(item))
}

/// DELETE /api/equipment/{id}
pub async fn delete_equipment(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    state.equipment().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
