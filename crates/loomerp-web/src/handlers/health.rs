//! Liveness and database reachability.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<Health>) {
    let (code, status, database) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "ok", "up"),
        Err(e) => {
            error!(error = %e, "database ping failed");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "down")
        }
    };
    (code, Json(Health { status, database, version: env!("CARGO_PKG_VERSION") }))
}
