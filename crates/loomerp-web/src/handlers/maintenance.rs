//! Maintenance orders.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Local;
use loomerp_common::{ApiError, Role};
use loomerp_db::maintenance::{
    CompleteOrder, MaintenanceFilter, MaintenanceOrder, NewMaintenanceOrder, UpdateMaintenanceOrder,
};
use loomerp_db::Page;

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const WRITE: &[Role] = &[Role::Admin, Role::Manager, Role::Maintenance];

/// GET /api/maintenance-orders
pub async fn list_orders(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiQuery(filter): ApiQuery<MaintenanceFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<MaintenanceOrder>>> {
    Ok(Json(state.maintenance().list(&filter, page).await?))
}

/// GET /api/maintenance-orders/{id}
pub async fn get_order(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MaintenanceOrder>> {
    let order = state
        .maintenance()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("maintenance order", id))?;
    Ok(Json(order))
}

/// POST /api/maintenance-orders
pub async fn create_order(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(order): ApiJson<NewMaintenanceOrder>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    Ok(created(state.maintenance().create(&order).await?))
}

/// PUT /api/maintenance-orders/{id}
pub async fn update_order(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateMaintenanceOrder>,
) -> ApiResult<Json<MaintenanceOrder>> {
    caller.require(WRITE)?;
    Ok(Json(state.maintenance().update(id, &changes).await?))
}

/// POST /api/maintenance-orders/{id}/complete
pub async fn complete_order(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    body: Option<ApiJson<CompleteOrder>>,
) -> ApiResult<Json<MaintenanceOrder>> {
    caller.require(WRITE)?;
    let completion = body.map(|ApiJson(c)| c).unwrap_or_default();
    Ok(Json(state.maintenance().complete(id, &completion, Local::now().naive_local()).await?))
}

/// DELETE /api/maintenance-orders/{id}
pub async fn delete_order(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    state.maintenance().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
