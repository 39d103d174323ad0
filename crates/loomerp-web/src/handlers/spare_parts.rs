//! Spare parts stock.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use loomerp_common::{ApiError, Role};
use loomerp_db::spare_parts::{NewSparePart, SparePart, SparePartFilter, StockAdjustment, UpdateSparePart};
use loomerp_db::Page;
use tracing::{info, warn};

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const WRITE: &[Role] = &[Role::Admin, Role::Manager, Role::Maintenance, Role::Warehouse];

/// GET /api/spare-parts
pub async fn list_parts(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiQuery(filter): ApiQuery<SparePartFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<SparePart>>> {
    Ok(Json(state.spare_parts().list(&filter, page).await?))
}

/// GET /api/spare-parts/low-stock
pub async fn low_stock_parts(
    State(state): State<SharedState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<SparePart>>> {
    Ok(Json(state.spare_parts().low_stock().await?))
}

/// GET /api/spare-parts/{id}
pub async fn get_part(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<SparePart>> {
    let part = state
        .spare_parts()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("spare part", id))?;
    Ok(Json(part))
}

/// POST /api/spare-parts
pub async fn create_part(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(part): ApiJson<NewSparePart>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    Ok(created(state.spare_parts().create(&part).await?))
}

/// PUT /api/spare-parts/{id}
pub async fn update_part(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateSparePart>,
) -> ApiResult<Json<SparePart>> {
    caller.require(WRITE)?;
    Ok(Json(state.spare_parts().update(id, &changes).await?))
}

/// POST /api/spare-parts/{id}/adjust - receive or issue pieces
pub async fn adjust_part(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(adjustment): ApiJson<StockAdjustment>,
) -> ApiResult<Json<SparePart>> {
    caller.require(WRITE)?;
    let delta = adjustment.whole_units()?;
    let part = state.spare_parts().adjust_quantity(id, delta).await?;
    info!(
        part = %part.part_number,
        delta,
        quantity = part.quantity,
        reason = adjustment.reason.as_deref().unwrap_or("-"),
        by = %caller.username,
        "spare part stock adjusted"
    );
    if part.is_low_stock() {
        warn!(part = %part.part_number, quantity = part.quantity, min_quantity = part.min_quantity, "stock at or below reorder level");
    }
    Ok(Json(part))
}

/// DELETE /api/spare-parts/{id}
pub async fn delete_part(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    state.spare_parts().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
