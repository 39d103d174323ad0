//! Column helpers shared by the repositories.

use serde::Deserialize;

/// Store a strum-backed enum as a VARCHAR column.
///
/// The enum must implement `Display` and `FromStr` (strum's `Display` and
/// `EnumString` derives).
macro_rules! string_column {
    ($ty:ty) => {
        impl sqlx::Type<sqlx::MySql> for $ty {
            fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                <str as sqlx::Type<sqlx::MySql>>::type_info()
            }

            fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                <str as sqlx::Type<sqlx::MySql>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::MySql> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::MySql as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> std::result::Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<'q, sqlx::MySql>>::encode_by_ref(&self.to_string(), buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::MySql> for $ty {
            fn decode(
                value: sqlx::mysql::MySqlValueRef<'r>,
            ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<'r, sqlx::MySql>>::decode(value)?;
                Ok(raw.parse::<$ty>()?)
            }
        }
    };
}

pub(crate) use string_column;

/// Limit/offset paging for list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 100;
    pub const MAX_LIMIT: i64 = 500;

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }

    /// Append `ORDER BY <order> LIMIT ? OFFSET ?` to a query under construction.
    pub(crate) fn push_to(&self, qb: &mut sqlx::QueryBuilder<'_, sqlx::MySql>, order: &str) {
        qb.push(" ORDER BY ")
            .push(order)
            .push(" LIMIT ")
            .push_bind(self.limit())
            .push(" OFFSET ")
            .push_bind(self.offset());
    }
}

/// Reject empty or whitespace-only required text.
pub(crate) fn require_text(field: &str, value: &str) -> crate::Result<()> {
    if value.trim().is_empty() {
        return Err(crate::DbError::invalid(format!("{} is required", field)));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &str, value: f64) -> crate::Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(crate::DbError::invalid(format!("{} must not be negative", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_and_clamping() {
        let page = Page::default();
        assert_eq!(page.limit(), 100);
        assert_eq!(page.offset(), 0);

        let page = Page { limit: Some(10_000), offset: Some(-5) };
        assert_eq!(page.limit(), 500);
        assert_eq!(page.offset(), 0);

        let page = Page { limit: Some(0), offset: Some(40) };
        assert_eq!(page.limit(), 1);
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_page_sql() {
        let mut qb = sqlx::QueryBuilder::<sqlx::MySql>::new("SELECT id FROM roles");
        Page::default().push_to(&mut qb, "id DESC");
        assert_eq!(qb.sql(), "SELECT id FROM roles ORDER BY id DESC LIMIT ? OFFSET ?");
    }

    #[test]
    fn test_required_text() {
        assert!(require_text("name", "Weaving").is_ok());
        assert!(require_text("name", "   ").is_err());
        assert!(require_non_negative("quantity", 0.0).is_ok());
        assert!(require_non_negative("quantity", -1.0).is_err());
        assert!(require_non_negative("quantity", f64::NAN).is_err());
    }
}
