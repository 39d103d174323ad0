//! Department repository.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{require_text, Page};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub manager_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub manager_id: Option<i64>,
}

impl NewDepartment {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("code", &self.code)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub code: Option<String>,
    pub description: Option<String>,
    pub manager_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepartmentFilter {
    /// Substring match on name.
    pub q: Option<String>,
}

const SELECT_DEPARTMENT: &str =
    "SELECT id, name, code, description, manager_id, created_at, updated_at FROM departments";

#[derive(Clone)]
pub struct DepartmentRepository {
    db: Database,
}

impl DepartmentRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &DepartmentFilter, page: Page) -> Result<Vec<Department>> {
        let mut qb = QueryBuilder::<MySql>::new(SELECT_DEPARTMENT);
        if let Some(q) = filter.q.as_deref().filter(|q| !q.trim().is_empty()) {
            qb.push(" WHERE name LIKE ").push_bind(format!("%{}%", q.trim()));
        }
        page.push_to(&mut qb, "id DESC");
        Ok(qb.build_query_as::<Department>().fetch_all(self.db.pool()).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Department>> {
        let dept = sqlx::query_as::<_, Department>(&format!("{} WHERE id = ?", SELECT_DEPARTMENT))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(dept)
    }

    pub async fn create(&self, dept: &NewDepartment) -> Result<Department> {
        dept.validate()?;
        let result = sqlx::query(
            "INSERT INTO departments (name, code, description, manager_id) VALUES (?, ?, ?, ?)",
        )
        .bind(dept.name.trim())
        .bind(dept.code.trim().to_uppercase())
        .bind(&dept.description)
        .bind(dept.manager_id)
        .execute(self.db.pool())
        .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateDepartment) -> Result<Department> {
        if let Some(name) = &changes.name {
            require_text("name", name)?;
        }
        if let Some(code) = &changes.code {
            require_text("code", code)?;
        }
        sqlx::query(
            r#"
            UPDATE departments SET
                name        = COALESCE(?, name),
                code        = COALESCE(?, code),
                description = COALESCE(?, description),
                manager_id  = COALESCE(?, manager_id)
            WHERE id = ?
            "#,
        )
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.code.as_deref().map(|c| c.trim().to_uppercase()))
        .bind(&changes.description)
        .bind(changes.manager_id)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("department {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM departments")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<Department> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("department {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_requires_name_and_code() {
        let dept = NewDepartment {
            name: "Weaving".into(),
            code: "WV".into(),
            description: None,
            manager_id: None,
        };
        assert!(dept.validate().is_ok());

        let no_code = NewDepartment { code: "".into(), ..dept.clone() };
        assert!(no_code.validate().is_err());
    }
}
