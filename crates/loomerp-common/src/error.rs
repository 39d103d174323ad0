use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ErpError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Token error: {0}")]
    Token(String),
}

pub type Result<T> = std::result::Result<T, ErpError>;

/// Error returned from HTTP handlers.
///
/// Renders as `{"error": "<kind>", "message": "..."}` with the matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_)   => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_)    => StatusCode::FORBIDDEN,
            ApiError::NotFound(_)     => StatusCode::NOT_FOUND,
            ApiError::Conflict(_)     => StatusCode::CONFLICT,
            ApiError::Internal(_)     => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_)   => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_)    => "forbidden",
            ApiError::NotFound(_)     => "not_found",
            ApiError::Conflict(_)     => "conflict",
            ApiError::Internal(_)     => "internal",
        }
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", what, id))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the log, not in the response body.
        let message = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody { error: self.kind(), message };
        (status, Json(body)).into_response()
    }
}

impl From<ErpError> for ApiError {
    fn from(err: ErpError) -> Self {
        match err {
            ErpError::Validation(msg) => ApiError::BadRequest(msg),
            ErpError::Token(msg) => ApiError::Unauthorized(msg),
            ErpError::PasswordHash(msg) => ApiError::Internal(msg),
        }
    }
}

// Malformed bodies, ids and query strings are client errors, whatever status
// axum would have picked for them.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Internal("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_erp_error_conversion() {
        let api: ApiError = ErpError::Validation("name is required".into()).into();
        assert!(matches!(api, ApiError::BadRequest(ref m) if m == "name is required"));

        let api: ApiError = ErpError::Token("expired".into()).into();
        assert_eq!(api.status(), StatusCode::UNAUTHORIZED);

        let api: ApiError = ErpError::PasswordHash("bad salt".into()).into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_message() {
        let err = ApiError::not_found("department", 42);
        assert_eq!(err.to_string(), "department 42 not found");
        assert_eq!(err.kind(), "not_found");
    }
}
