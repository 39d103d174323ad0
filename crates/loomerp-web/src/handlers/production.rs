//! Production lines and output reporting.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use loomerp_common::{ApiError, Role};
use loomerp_db::production::{
    NewProductionLine, OutputRecord, ProductionFilter, ProductionLine, UpdateProductionLine,
};
use loomerp_db::Page;
use tracing::info;

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const WRITE: &[Role] = &[Role::Admin, Role::Manager, Role::Supervisor];

/// GET /api/production-lines
pub async fn list_lines(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiQuery(filter): ApiQuery<ProductionFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<ProductionLine>>> {
    Ok(Json(state.production().list(&filter, page).await?))
}

/// GET /api/production-lines/{id}
pub async fn get_line(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ProductionLine>> {
    let line = state
        .production()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("production line", id))?;
    Ok(Json(line))
}

/// POST /api/production-lines
pub async fn create_line(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(line): ApiJson<NewProductionLine>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    Ok(created(state.production().create(&line).await?))
}

/// PUT /api/production-lines/{id}
pub async fn update_line(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateProductionLine>,
) -> ApiResult<Json<ProductionLine>> {
    caller.require(WRITE)?;
    Ok(Json(state.production().update(id, &changes).await?))
}

/// POST /api/production-lines/{id}/output
pub async fn record_output(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(record): ApiJson<OutputRecord>,
) -> ApiResult<Json<ProductionLine>> {
    caller.require(WRITE)?;
    let line = state.production().record_output(id, &record).await?;
    info!(line = %line.name, quantity = record.quantity, efficiency = line.efficiency, "output recorded");
    Ok(Json(line))
}

/// DELETE /api/production-lines/{id}
pub async fn delete_line(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    state.production().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
