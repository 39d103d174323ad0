//! Role repository.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{require_text, Page};
use chrono::{DateTime, Utc};
use loomerp_common::Role as BuiltinRole;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
}

impl NewRole {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        if self.name.len() > 64 {
            return Err(DbError::invalid("name must be at most 64 characters"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
}

const SELECT_ROLE: &str = "SELECT id, name, description, created_at FROM roles";

#[derive(Clone)]
pub struct RoleRepository {
    db: Database,
}

impl RoleRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Role>> {
        let mut qb = sqlx::QueryBuilder::new(SELECT_ROLE);
        page.push_to(&mut qb, "id ASC");
        Ok(qb.build_query_as::<Role>().fetch_all(self.db.pool()).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!("{} WHERE id = ?", SELECT_ROLE))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(role)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>> {
        let role = sqlx::query_as::<_, Role>(&format!("{} WHERE name = ?", SELECT_ROLE))
            .bind(name.trim().to_lowercase())
            .fetch_optional(self.db.pool())
            .await?;
        Ok(role)
    }

    pub async fn create(&self, role: &NewRole) -> Result<Role> {
        role.validate()?;
        let result = sqlx::query("INSERT INTO roles (name, description) VALUES (?, ?)")
            .bind(role.name.trim().to_lowercase())
            .bind(&role.description)
            .execute(self.db.pool())
            .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateRole) -> Result<Role> {
        let existing = self.get(id).await?;
        if let Some(name) = &changes.name {
            require_text("name", name)?;
            if BuiltinRole::is_builtin(&existing.name) && !name.eq_ignore_ascii_case(&existing.name) {
                return Err(DbError::invalid("built-in roles cannot be renamed"));
            }
        }
        sqlx::query(
            "UPDATE roles SET name = COALESCE(?, name), description = COALESCE(?, description) WHERE id = ?",
        )
        .bind(changes.name.as_ref().map(|n| n.trim().to_lowercase()))
        .bind(&changes.description)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    /// Delete a custom role. Built-in roles and roles still assigned to users are kept.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let existing = self.get(id).await?;
        if BuiltinRole::is_builtin(&existing.name) {
            return Err(DbError::invalid("built-in roles cannot be deleted"));
        }
        sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<Role> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("role {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_role_validation() {
        let ok = NewRole { name: "dyer".into(), description: None };
        assert!(ok.validate().is_ok());

        let empty = NewRole { name: " ".into(), description: None };
        assert!(empty.validate().is_err());

        let long = NewRole { name: "x".repeat(65), description: None };
        assert!(long.validate().is_err());
    }
}
