//! Incident repository (safety and quality incidents on the shop floor).

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{require_text, string_column, Page};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

string_column!(Severity);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentStatus {
    #[default]
    Open,
    Investigating,
    Resolved,
    Closed,
}

string_column!(IncidentStatus);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Incident {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub reported_by: Option<i64>,
    pub department_id: Option<i64>,
    pub equipment_id: Option<i64>,
    pub occurred_at: NaiveDateTime,
    pub resolution: Option<String>,
    pub resolved_at: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncident {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    pub department_id: Option<i64>,
    pub equipment_id: Option<i64>,
    /// Defaults to the time of reporting.
    pub occurred_at: Option<NaiveDateTime>,
}

impl NewIncident {
    pub fn validate(&self) -> Result<()> {
        require_text("title", &self.title)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateIncident {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
    pub department_id: Option<i64>,
    pub equipment_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveIncident {
    pub resolution: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentFilter {
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
    pub department_id: Option<i64>,
    pub equipment_id: Option<i64>,
}

const SELECT_INCIDENT: &str = r#"
    SELECT id, title, description, severity, status, reported_by, department_id, equipment_id,
           occurred_at, resolution, resolved_at, created_at, updated_at
    FROM incidents
"#;

#[derive(Clone)]
pub struct IncidentRepository {
    db: Database,
}

impl IncidentRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &IncidentFilter, page: Page) -> Result<Vec<Incident>> {
        let mut qb = QueryBuilder::<MySql>::new(SELECT_INCIDENT);
        qb.push(" WHERE 1 = 1");
        if let Some(severity) = filter.severity {
            qb.push(" AND severity = ").push_bind(severity);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(department_id) = filter.department_id {
            qb.push(" AND department_id = ").push_bind(department_id);
        }
        if let Some(equipment_id) = filter.equipment_id {
            qb.push(" AND equipment_id = ").push_bind(equipment_id);
        }
        page.push_to(&mut qb, "occurred_at DESC, id DESC");
        Ok(qb.build_query_as::<Incident>().fetch_all(self.db.pool()).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Incident>> {
        let incident = sqlx::query_as::<_, Incident>(&format!("{} WHERE id = ?", SELECT_INCIDENT))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(incident)
    }

    /// `now` is the plant's local time; it defaults `occurred_at` and bounds it.
    pub async fn create(&self, incident: &NewIncident, reported_by: i64, now: NaiveDateTime) -> Result<Incident> {
        incident.validate()?;
        let occurred_at = incident.occurred_at.unwrap_or(now);
        if occurred_at > now {
            return Err(DbError::invalid("occurred_at cannot be in the future"));
        }
        let result = sqlx::query(
            r#"
            INSERT INTO incidents
                (title, description, severity, reported_by, department_id, equipment_id, occurred_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(incident.title.trim())
        .bind(&incident.description)
        .bind(incident.severity)
        .bind(reported_by)
        .bind(incident.department_id)
        .bind(incident.equipment_id)
        .bind(occurred_at)
        .execute(self.db.pool())
        .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateIncident) -> Result<Incident> {
        if let Some(title) = &changes.title {
            require_text("title", title)?;
        }
        if changes.status == Some(IncidentStatus::Resolved) {
            return Err(DbError::invalid("use the resolve action to resolve an incident"));
        }
        sqlx::query(
            r#"
            UPDATE incidents SET
                title         = COALESCE(?, title),
                description   = COALESCE(?, description),
                severity      = COALESCE(?, severity),
                status        = COALESCE(?, status),
                department_id = COALESCE(?, department_id),
                equipment_id  = COALESCE(?, equipment_id)
            WHERE id = ?
            "#,
        )
        .bind(changes.title.as_deref().map(str::trim))
        .bind(&changes.description)
        .bind(changes.severity)
        .bind(changes.status)
        .bind(changes.department_id)
        .bind(changes.equipment_id)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    pub async fn resolve(&self, id: i64, resolution: &ResolveIncident, now: NaiveDateTime) -> Result<Incident> {
        require_text("resolution", &resolution.resolution)?;
        let incident = self.get(id).await?;
        if matches!(incident.status, IncidentStatus::Resolved | IncidentStatus::Closed) {
            return Err(DbError::invalid(format!("incident {} is already {}", id, incident.status)));
        }
        sqlx::query("UPDATE incidents SET status = ?, resolution = ?, resolved_at = ? WHERE id = ?")
            .bind(IncidentStatus::Resolved)
            .bind(resolution.resolution.trim())
            .bind(now.max(incident.occurred_at))
            .bind(id)
            .execute(self.db.pool())
            .await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM incidents WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("incident {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM incidents")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<Incident> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("incident {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Low < Severity::Medium);
    }

    #[test]
    fn test_new_incident_defaults() {
        let incident: NewIncident =
            serde_json::from_str(r#"{"title": "Oil leak near carding machine"}"#).unwrap();
        assert_eq!(incident.severity, Severity::Low);
        assert!(incident.occurred_at.is_none());
        assert!(incident.validate().is_ok());
    }
}
