//! Incident reports. Anyone signed in may report; supervisors and up manage.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Local;
use loomerp_common::{ApiError, Role};
use loomerp_db::incidents::{Incident, IncidentFilter, NewIncident, ResolveIncident, UpdateIncident};
use loomerp_db::Page;
use tracing::{info, warn};

use super::{created, ApiResult};
use crate::auth::AuthUser;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::SharedState;

const MANAGE: &[Role] = &[Role::Admin, Role::Manager, Role::Supervisor];

/// GET /api/incidents
pub async fn list_incidents(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiQuery(filter): ApiQuery<IncidentFilter>,
    ApiQuery(page): ApiQuery<Page>,
) -> ApiResult<Json<Vec<Incident>>> {
    Ok(Json(state.incidents().list(&filter, page).await?))
}

/// GET /api/incidents/{id}
pub async fn get_incident(
    State(state): State<SharedState>,
    _caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Incident>> {
    let incident = state
        .incidents()
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("incident", id))?;
    Ok(Json(incident))
}

/// POST /api/incidents
pub async fn report_incident(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiJson(incident): ApiJson<NewIncident>,
) -> ApiResult<impl IntoResponse> {
    let incident = state.incidents().create(&incident, caller.id, Local::now().naive_local()).await?;
    warn!(
        id = incident.id,
        severity = %incident.severity,
        by = %caller.username,
        "incident reported"
    );
    Ok(created(incident))
}

/// PUT /api/incidents/{id}
pub async fn update_incident(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(changes): ApiJson<UpdateIncident>,
) -> ApiResult<Json<Incident>> {
    caller.require(MANAGE)?;
    Ok(Json(state.incidents().update(id, &changes).await?))
}

/// POST /api/incidents/{id}/resolve
pub async fn resolve_incident(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(resolution): ApiJson<ResolveIncident>,
) -> ApiResult<Json<Incident>> {
    caller.require(MANAGE)?;
    let incident = state.incidents().resolve(id, &resolution, Local::now().naive_local()).await?;
    info!(id, by = %caller.username, "incident resolved");
    Ok(Json(incident))
}

/// DELETE /api/incidents/{id}
pub async fn delete_incident(
    State(state): State<SharedState>,
    caller: AuthUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    caller.require(MANAGE)?;
    state.incidents().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
