//! Accounting ledger.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use loomerp_common::{ApiError, Role};
use loomerp_db::accounting::{
    AccountingFilter, AccountingRecord, AccountingTotals, NewAccountingRecord, UpdateAccountingRecord,
};
use loomerp_db::Page;

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

pub(crate) const READ: &[Role] = &[Role::Admin, Role::Accountant, Role::Manager];
const WRITE: &[Role] = &[Role::Admin, Role::Accountant];

/// GET /api/accounting
pub async fn list_records(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiQuery(filter): ApiQuery<AccountingFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<AccountingRecord>>> {
    caller.require(READ)?;
    Ok(Json(state.accounting().list(&filter, page).await?))
}

/// GET /api/accounting/totals
pub async fn totals(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiQuery(filter): ApiQuery<AccountingFilter>,
) -> ApiResult<Json<AccountingTotals>> {
    caller.require(READ)?;
    Ok(Json(state.accounting().totals(&filter).await?))
}

/// GET /api/accounting/{id}
pub async fn get_record(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<AccountingRecord>> {
    caller.require(READ)?;
    let record = state
        .accounting()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("accounting record", id))?;
    Ok(Json(record))
}

/// POST /api/accounting
pub async fn create_record(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(record): ApiJson<NewAccountingRecord>,
) -> ApiResult<impl IntoResponse> {
    caller.require(WRITE)?;
    Ok(created(state.accounting().create(&record, caller.id).await?))
}

/// PUT /api/accounting/{id}
pub async fn update_record(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateAccountingRecord>,
) -> ApiResult<Json<AccountingRecord>> {
    caller.require(WRITE)?;
    Ok(Json(state.accounting().update(id, &changes).await?))
}

/// DELETE /api/accounting/{id}
pub async fn delete_record(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(WRITE)?;
    state.accounting().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
