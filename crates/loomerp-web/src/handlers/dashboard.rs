//! Dashboard chart data.

use axum::extract::State;
use axum::Json;
use chrono::{Datelike, Local, NaiveDate};
use loomerp_db::dashboard::{CategoryValue, LabelCount, LineEfficiency, MonthlyTotals, Summary};
use serde::Deserialize;

use super::ApiResult;
use crate::auth::AuthUser;
use crate::extract::ApiQuery;
use crate::state::SharedState;

#[derive(Debug, Default, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<NaiveDate>,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// GET /api/dashboard/summary
pub async fn summary(State(state): State<SharedState>, _caller: AuthUser) -> ApiResult<Json<Summary>> {
    Ok(Json(state.dashboard().summary(today()).await?))
}

/// GET /api/dashboard/production
pub async fn production(
    State(state): State<SharedState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<LineEfficiency>>> {
    Ok(Json(state.dashboard().production_efficiency().await?))
}

/// GET /api/dashboard/accounting?year=2024
pub async fn accounting(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiQuery(query): ApiQuery<YearQuery>,
) -> ApiResult<Json<Vec<MonthlyTotals>>> {
    caller.require(super::accounting::READ)?;
    let year = query.year.unwrap_or_else(|| today().year());
    Ok(Json(state.dashboard().monthly_accounting(year).await?))
}

/// GET /api/dashboard/incidents
pub async fn incidents(
    State(state): State<SharedState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<LabelCount>>> {
    Ok(Json(state.dashboard().incidents_by_severity().await?))
}

/// GET /api/dashboard/maintenance
pub async fn maintenance(
    State(state): State<SharedState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<LabelCount>>> {
    Ok(Json(state.dashboard().maintenance_by_status().await?))
}

/// GET /api/dashboard/attendance?date=2024-02-12
pub async fn attendance(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiQuery(query): ApiQuery<DateQuery>,
) -> ApiResult<Json<Vec<LabelCount>>> {
    let day = query.date.unwrap_or_else(today);
    Ok(Json(state.dashboard().attendance_by_status(day).await?))
}

/// GET /api/dashboard/inventory
pub async fn inventory(
    State(state): State<SharedState>,
    _caller: AuthUser,
) -> ApiResult<Json<Vec<CategoryValue>>> {
    Ok(Json(state.dashboard().inventory_value_by_category().await?))
}
