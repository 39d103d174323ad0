//! Inventory items.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use loomerp_common::{ApiError, Role};
use loomerp_db::inventory::{InventoryFilter, InventoryItem, NewInventoryItem, UpdateInventoryItem};
use loomerp_db::spare_parts::StockAdjustment;
use loomerp_db::Page;
use tracing::{info, warn};

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const WRITE: &[Role] = &[Role::Admin, Role::Manager, Role::Warehouse];

/// GET /api/inventory
pub async fn list_items(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiQuery(filter): ApiQuery<InventoryFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    Ok(Json(state.inventory().list(&filter, page).await?))
}

/// GET /api/inventory/low-stock
pub async fn low_stock_items(
    State(state): State<SharedState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<InventoryItem>>> {
    Ok(Json(state.inventory().low_stock().await?))
}

/// GET /api/inventory/{id}
pub async fn get_item(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<InventoryItem>> {
    let item = state
        .inventory()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("inventory item", id))?;
    Ok(Json(item))
}

/// POST /api/inventory
pub async fn create_item(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(item): ApiJson<NewInventoryItem>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    Ok(created(state.inventory().create(&item).await?))
}

/// PUT /api/inventory/{id}
pub async fn update_item(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateInventoryItem>,
) -> ApiResult<Json<InventoryItem>> {
    caller.require(WRITE)?;
    Ok(Json(state.inventory().update(id, &changes).await?))
}

/// POST /api/inventory/{id}/adjust - receive or issue stock
pub async fn adjust_item(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(adjustment): ApiJson<StockAdjustment>,
) -> ApiResult<Json<InventoryItem>> {
    caller.require(WRITE)?;
    let item = state.inventory().adjust_quantity(id, adjustment.delta).await?;
    info!(
        sku = %item.sku,
        delta = adjustment.delta,
        quantity = item.quantity,
        reason = adjustment.reason.as_deref().unwrap_or("-"),
        by = %caller.username,
        "inventory adjusted"
    );
    if item.is_low_stock() {
        warn!(sku = %item.sku, quantity = item.quantity, reorder_level = item.reorder_level, "stock at or below reorder level");
    }
    Ok(Json(item))
}

/// DELETE /api/inventory/{id}
pub async fn delete_item(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    state.inventory().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
