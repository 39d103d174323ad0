//! Accounting record repository (income and expense ledger entries).

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{require_text, string_column, Page};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

string_column!(EntryKind);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccountingRecord {
    pub id: i64,
    pub entry_date: NaiveDate,
    pub kind: EntryKind,
    pub category: String,
    pub amount: f64,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub department_id: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAccountingRecord {
    pub entry_date: NaiveDate,
    pub kind: EntryKind,
    pub category: String,
    pub amount: f64,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub department_id: Option<i64>,
}

fn require_positive_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(DbError::invalid("amount must be greater than zero"));
    }
    Ok(())
}

impl NewAccountingRecord {
    pub fn validate(&self) -> Result<()> {
        require_text("category", &self.category)?;
        require_positive_amount(self.amount)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountingRecord {
    pub entry_date: Option<NaiveDate>,
    pub kind: Option<EntryKind>,
    pub category: Option<String>,
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub department_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountingFilter {
    pub kind: Option<EntryKind>,
    pub category: Option<String>,
    pub department_id: Option<i64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl AccountingFilter {
    pub fn validate(&self) -> Result<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Err(DbError::invalid("'from' must not be after 'to'"));
            }
        }
        Ok(())
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<'_, MySql>) {
        qb.push(" WHERE 1 = 1");
        if let Some(kind) = self.kind {
            qb.push(" AND kind = ").push_bind(kind);
        }
        if let Some(category) = &self.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        if let Some(department_id) = self.department_id {
            qb.push(" AND department_id = ").push_bind(department_id);
        }
        if let Some(from) = self.from {
            qb.push(" AND entry_date >= ").push_bind(from);
        }
        if let Some(to) = self.to {
            qb.push(" AND entry_date <= ").push_bind(to);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct AccountingTotals {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

const SELECT_RECORD: &str = r#"
    SELECT id, entry_date, kind, category, amount, description, reference,
           department_id, created_by, created_at, updated_at
    FROM accounting_records
"#;

#[derive(Clone)]
pub struct AccountingRepository {
    db: Database,
}

impl AccountingRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &AccountingFilter, page: Page) -> Result<Vec<AccountingRecord>> {
        filter.validate()?;
        let mut qb = QueryBuilder::<MySql>::new(SELECT_RECORD);
        filter.push_conditions(&mut qb);
        page.push_to(&mut qb, "entry_date DESC, id DESC");
        Ok(qb.build_query_as::<AccountingRecord>().fetch_all(self.db.pool()).await?)
    }

    pub async fn totals(&self, filter: &AccountingFilter) -> Result<AccountingTotals> {
        filter.validate()?;
        let mut qb = QueryBuilder::<MySql>::new(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN kind = 'income'  THEN amount END), 0) AS income,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0) AS expense,
                COALESCE(SUM(CASE WHEN kind = 'income'  THEN amount ELSE -amount END), 0) AS balance
            FROM accounting_records
            "#,
        );
        filter.push_conditions(&mut qb);
        Ok(qb.build_query_as::<AccountingTotals>().fetch_one(self.db.pool()).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<AccountingRecord>> {
        let record = sqlx::query_as::<_, AccountingRecord>(&format!("{} WHERE id = ?", SELECT_RECORD))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(record)
    }

    pub async fn create(&self, record: &NewAccountingRecord, created_by: i64) -> Result<AccountingRecord> {
        record.validate()?;
        let result = sqlx::query(
            r#"
            INSERT INTO accounting_records
                (entry_date, kind, category, amount, description, reference, department_id, created_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.entry_date)
        .bind(record.kind)
        .bind(record.category.trim())
        .bind(record.amount)
        .bind(&record.description)
        .bind(&record.reference)
        .bind(record.department_id)
        .bind(created_by)
        .execute(self.db.pool())
        .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateAccountingRecord) -> Result<AccountingRecord> {
        if let Some(category) = &changes.category {
            require_text("category", category)?;
        }
        if let Some(amount) = changes.amount {
            require_positive_amount(amount)?;
        }
        sqlx::query(
            r#"
            UPDATE accounting_records SET
                entry_date    = COALESCE(?, entry_date),
                kind          = COALESCE(?, kind),
                category      = COALESCE(?, category),
                amount        = COALESCE(?, amount),
                description   = COALESCE(?, description),
                reference     = COALESCE(?, reference),
                department_id = COALESCE(?, department_id)
            WHERE id = ?
            "#,
        )
        .bind(changes.entry_date)
        .bind(changes.kind)
        .bind(changes.category.as_deref().map(str::trim))
        .bind(changes.amount)
        .bind(&changes.description)
        .bind(&changes.reference)
        .bind(changes.department_id)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM accounting_records WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("accounting record {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounting_records")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<AccountingRecord> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("accounting record {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: f64) -> NewAccountingRecord {
        NewAccountingRecord {
            entry_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            kind: EntryKind::Expense,
            category: "raw materials".into(),
            amount,
            description: Some("Cotton bales".into()),
            reference: Some("PO-1182".into()),
            department_id: None,
        }
    }

    #[test]
    fn test_amount_must_be_positive() {
        assert!(record(1250.0).validate().is_ok());
        assert!(record(0.0).validate().is_err());
        assert!(record(-5.0).validate().is_err());
    }

    #[test]
    fn test_filter_date_range() {
        let filter = AccountingFilter {
            from: NaiveDate::from_ymd_opt(2024, 6, 1),
            to: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_filter_sql() {
        let filter = AccountingFilter {
            kind: Some(EntryKind::Income),
            from: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<MySql>::new("SELECT id FROM accounting_records");
        filter.push_conditions(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT id FROM accounting_records WHERE 1 = 1 AND kind = ? AND entry_date >= ?"
        );
    }
}
