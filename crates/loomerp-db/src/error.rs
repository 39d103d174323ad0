//! Database error types.

use loomerp_common::ApiError;
use sqlx::error::ErrorKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("MySQL error: {0}")]
    Sqlx(sqlx::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Referential integrity violation: {0}")]
    ForeignKey(String),

    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl DbError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        DbError::Invalid(msg.into())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.kind() {
                ErrorKind::UniqueViolation => return DbError::Duplicate(db_err.message().to_string()),
                ErrorKind::ForeignKeyViolation => return DbError::ForeignKey(db_err.message().to_string()),
                _ => {}
            }
        }
        DbError::Sqlx(err)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            DbError::Duplicate(msg) => ApiError::Conflict(format!("duplicate entry: {}", msg)),
            DbError::ForeignKey(msg) => ApiError::Conflict(format!("referenced record problem: {}", msg)),
            DbError::Invalid(msg) => ApiError::BadRequest(msg),
            DbError::Sqlx(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_stays_internal() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::Sqlx(_)));
    }

    #[test]
    fn test_api_mapping() {
        let api: ApiError = DbError::NotFound("equipment 7".into()).into();
        assert!(matches!(api, ApiError::NotFound(ref m) if m == "equipment 7 not found"));

        let api: ApiError = DbError::Duplicate("code".into()).into();
        assert!(matches!(api, ApiError::Conflict(_)));

        let api: ApiError = DbError::ForeignKey("department".into()).into();
        assert!(matches!(api, ApiError::Conflict(_)));

        let api: ApiError = DbError::invalid("quantity must not be negative").into();
        assert!(matches!(api, ApiError::BadRequest(ref m) if m == "quantity must not be negative"));
    }
}
