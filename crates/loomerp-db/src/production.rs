//! Production line repository.
//!
//! `efficiency` is a stored generated column (produced / target, in percent).

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{require_non_negative, require_text, string_column, Page};
use chrono::{DateTime, Utc};
use loomerp_common::metrics;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LineStatus {
    Running,
    #[default]
    Idle,
    Stopped,
    Maintenance,
}

string_column!(LineStatus);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductionLine {
    pub id: i64,
    pub name: String,
    pub department_id: Option<i64>,
    pub product: Option<String>,
    pub target_output: f64,
    pub produced_output: f64,
    pub efficiency: f64,
    pub status: LineStatus,
    pub supervisor_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProductionLine {
    pub name: String,
    pub department_id: Option<i64>,
    pub product: Option<String>,
    #[serde(default)]
    pub target_output: f64,
    #[serde(default)]
    pub produced_output: f64,
    #[serde(default)]
    pub status: LineStatus,
    pub supervisor_id: Option<i64>,
}

impl NewProductionLine {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_non_negative("target_output", self.target_output)?;
        require_non_negative("produced_output", self.produced_output)?;
        check_efficiency(self.produced_output, self.target_output)
    }
}

/// The generated `efficiency` column must stay a finite DOUBLE.
fn check_efficiency(produced: f64, target: f64) -> Result<()> {
    if !metrics::efficiency(produced, target).is_finite() {
        return Err(DbError::invalid("produced_output / target_output is out of range"));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProductionLine {
    pub name: Option<String>,
    pub department_id: Option<i64>,
    pub product: Option<String>,
    pub target_output: Option<f64>,
    pub produced_output: Option<f64>,
    pub status: Option<LineStatus>,
    pub supervisor_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputRecord {
    /// Units produced since the last report. Negative values correct mistakes.
    pub quantity: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductionFilter {
    pub status: Option<LineStatus>,
    pub department_id: Option<i64>,
    /// Only lines below this efficiency percentage.
    pub below_efficiency: Option<f64>,
}

const SELECT_LINE: &str = r#"
    SELECT id, name, department_id, product, target_output, produced_output, efficiency,
           status, supervisor_id, created_at, updated_at
    FROM production_lines
"#;

#[derive(Clone)]
pub struct ProductionLineRepository {
    db: Database,
}

impl ProductionLineRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &ProductionFilter, page: Page) -> Result<Vec<ProductionLine>> {
        let mut qb = QueryBuilder::<MySql>::new(SELECT_LINE);
        qb.push(" WHERE 1 = 1");
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(department_id) = filter.department_id {
            qb.push(" AND department_id = ").push_bind(department_id);
        }
        if let Some(threshold) = filter.below_efficiency {
            qb.push(" AND efficiency < ").push_bind(threshold);
        }
        page.push_to(&mut qb, "id DESC");
        Ok(qb.build_query_as::<ProductionLine>().fetch_all(self.db.pool()).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<ProductionLine>> {
        let line = sqlx::query_as::<_, ProductionLine>(&format!("{} WHERE id = ?", SELECT_LINE))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(line)
    }

    pub async fn create(&self, line: &NewProductionLine) -> Result<ProductionLine> {
        line.validate()?;
        let result = sqlx::query(
            r#"
            INSERT INTO production_lines
                (name, department_id, product, target_output, produced_output, status, supervisor_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(line.name.trim())
        .bind(line.department_id)
        .bind(&line.product)
        .bind(line.target_output)
        .bind(line.produced_output)
        .bind(line.status)
        .bind(line.supervisor_id)
        .execute(self.db.pool())
        .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateProductionLine) -> Result<ProductionLine> {
        if let Some(name) = &changes.name {
            require_text("name", name)?;
        }
        if let Some(target) = changes.target_output {
            require_non_negative("target_output", target)?;
        }
        if let Some(produced) = changes.produced_output {
            require_non_negative("produced_output", produced)?;
        }
        if changes.target_output.is_some() || changes.produced_output.is_some() {
            let current = self.get(id).await?;
            check_efficiency(
                changes.produced_output.unwrap_or(current.produced_output),
                changes.target_output.unwrap_or(current.target_output),
            )?;
        }
        sqlx::query(
            r#"
            UPDATE production_lines SET
                name            = COALESCE(?, name),
                department_id   = COALESCE(?, department_id),
                product         = COALESCE(?, product),
                target_output   = COALESCE(?, target_output),
                produced_output = COALESCE(?, produced_output),
                status          = COALESCE(?, status),
                supervisor_id   = COALESCE(?, supervisor_id)
            WHERE id = ?
            "#,
        )
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.department_id)
        .bind(&changes.product)
        .bind(changes.target_output)
        .bind(changes.produced_output)
        .bind(changes.status)
        .bind(changes.supervisor_id)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    /// Add produced units to a line's running total.
    pub async fn record_output(&self, id: i64, record: &OutputRecord) -> Result<ProductionLine> {
        if !record.quantity.is_finite() {
            return Err(DbError::invalid("quantity must be a number"));
        }
        let result = sqlx::query(
            r#"
            UPDATE production_lines
            SET produced_output = produced_output + ?
            WHERE id = ? AND produced_output + ? >= 0
            "#,
        )
        .bind(record.quantity)
        .bind(id)
        .bind(record.quantity)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 && record.quantity != 0.0 {
            let line = self.get(id).await?;
            return Err(DbError::invalid(format!(
                "correction of {} would make output of '{}' negative",
                record.quantity, line.name
            )));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM production_lines WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("production line {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM production_lines")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<ProductionLine> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("production line {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_line_defaults() {
        let line: NewProductionLine = serde_json::from_str(
            r#"{"name": "Spinning A", "target_output": 800, "produced_output": 720}"#,
        )
        .unwrap();
        assert_eq!(line.status, LineStatus::Idle);
        assert!(line.validate().is_ok());
    }

    #[test]
    fn test_efficiency_overflow_rejected() {
        assert!(check_efficiency(720.0, 800.0).is_ok());
        assert!(check_efficiency(5.0, 0.0).is_ok());
        assert!(check_efficiency(1e308, 1e-10).is_err());
    }

    #[test]
    fn test_negative_target_rejected() {
        let line = NewProductionLine {
            name: "Dyeing".into(),
            department_id: None,
            product: None,
            target_output: -1.0,
            produced_output: 0.0,
            status: LineStatus::Running,
            supervisor_id: None,
        };
        assert!(line.validate().is_err());
    }
}
