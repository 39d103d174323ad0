//! HTTP handlers for all API routes.

pub mod accounting;
pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod departments;
pub mod equipment;
pub mod health;
pub mod incidents;
pub mod inventory;
pub mod maintenance;
pub mod production;
pub mod roles;
pub mod spare_parts;
pub mod users;

use axum::http::StatusCode;
use axum::Json;
use loomerp_common::ApiError;

pub type ApiResult<T> = Result<T, ApiError>;

/// 201 with the created row.
pub fn created<T>(value: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(value))
}
