//! Equipment repository.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{require_text, string_column, Page};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EquipmentStatus {
    #[default]
    Operational,
    Maintenance,
    Broken,
    Retired,
}

string_column!(EquipmentStatus);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Equipment {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub department_id: Option<i64>,
    pub production_line_id: Option<i64>,
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
    pub last_maintenance_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEquipment {
    pub name: String,
    pub code: String,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub department_id: Option<i64>,
    pub production_line_id: Option<i64>,
    #[serde(default)]
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
}

impl NewEquipment {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("code", &self.code)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEquipment {
    pub name: Option<String>,
    pub model: Option<String>,
    pub manufacturer: Option<String>,
    pub department_id: Option<i64>,
    pub production_line_id: Option<i64>,
    pub status: Option<EquipmentStatus>,
    pub purchase_date: Option<NaiveDate>,
    pub last_maintenance_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EquipmentFilter {
    pub status: Option<EquipmentStatus>,
    pub department_id: Option<i64>,
    pub production_line_id: Option<i64>,
}

const SELECT_EQUIPMENT: &str = r#"
    SELECT id, name, code, model, manufacturer, department_id, production_line_id,
           status, purchase_date, last_maintenance_date, created_at, updated_at
    FROM equipment
"#;

#[derive(Clone)]
pub struct EquipmentRepository {
    db: Database,
}

impl EquipmentRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &EquipmentFilter, page: Page) -> Result<Vec<Equipment>> {
        let mut qb = QueryBuilder::<MySql>::new(SELECT_EQUIPMENT);
        qb.push(" WHERE 1 = 1");
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(department_id) = filter.department_id {
            qb.push(" AND department_id = ").push_bind(department_id);
        }
        if let Some(line_id) = filter.production_line_id {
            qb.push(" AND production_line_id = ").push_bind(line_id);
        }
        page.push_to(&mut qb, "id DESC");
        Ok(qb.build_query_as::<Equipment>().fetch_all(self.db.pool()).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Equipment>> {
        let equipment = sqlx::query_as::<_, Equipment>(&format!("{} WHERE id = ?", SELECT_EQUIPMENT))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(equipment)
    }

    pub async fn create(&self, item: &NewEquipment) -> Result<Equipment> {
        item.validate()?;
        let result = sqlx::query(
            r#"
            INSERT INTO equipment
                (name, code, model, manufacturer, department_id, production_line_id, status, purchase_date)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.name.trim())
        .bind(item.code.trim())
        .bind(&item.model)
        .bind(&item.manufacturer)
        .bind(item.department_id)
        .bind(item.production_line_id)
        .bind(item.status)
        .bind(item.purchase_date)
        .execute(self.db.pool())
        .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateEquipment) -> Result<Equipment> {
        if let Some(name) = &changes.name {
            require_text("name", name)?;
        }
        sqlx::query(
            r#"
            UPDATE equipment SET
                name                  = COALESCE(?, name),
                model                 = COALESCE(?, model),
                manufacturer          = COALESCE(?, manufacturer),
                department_id         = COALESCE(?, department_id),
                production_line_id    = COALESCE(?, production_line_id),
                status                = COALESCE(?, status),
                purchase_date         = COALESCE(?, purchase_date),
                last_maintenance_date = COALESCE(?, last_maintenance_date)
            WHERE id = ?
            "#,
        )
        .bind(changes.name.as_deref().map(str::trim))
        .bind(&changes.model)
        .bind(&changes.manufacturer)
        .bind(changes.department_id)
        .bind(changes.production_line_id)
        .bind(changes.status)
        .bind(changes.purchase_date)
        .bind(changes.last_maintenance_date)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    pub async fn set_status(&self, id: i64, status: EquipmentStatus) -> Result<Equipment> {
        sqlx::query("UPDATE equipment SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("equipment {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM equipment")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<Equipment> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("equipment {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(EquipmentStatus::Operational.to_string(), "operational");
        assert_eq!("broken".parse::<EquipmentStatus>().unwrap(), EquipmentStatus::Broken);
        assert!("exploded".parse::<EquipmentStatus>().is_err());
    }

    #[test]
    fn test_new_equipment_defaults_to_operational() {
        let item: NewEquipment = serde_json::from_str(r#"{"name": "Loom 4", "code": "LM-004"}"#).unwrap();
        assert_eq!(item.status, EquipmentStatus::Operational);
        assert!(item.validate().is_ok());
    }
}
