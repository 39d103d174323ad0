//! User repository.
//!
//! Password hashes never leave this module except through [`UserCredentials`],
//! which is only used by the login flow.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{require_text, Page};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role_id: i64,
    /// Role name joined from `roles`.
    pub role: String,
    pub department_id: Option<i64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Login lookup row.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    /// Role name, e.g. `operator`.
    pub role: String,
    pub department_id: Option<i64>,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        require_text("username", &self.username)?;
        require_text("full_name", &self.full_name)?;
        require_text("role", &self.role)?;
        validate_email(&self.email)?;
        if self.username.chars().any(char::is_whitespace) {
            return Err(DbError::invalid("username must not contain whitespace"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub department_id: Option<i64>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub role: Option<String>,
    pub department_id: Option<i64>,
    pub active: Option<bool>,
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(DbError::invalid("email is not valid")),
    }
}

const SELECT_USER: &str = r#"
    SELECT u.id, u.username, u.email, u.full_name, u.role_id, r.name AS role,
           u.department_id, u.active, u.created_at, u.updated_at
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

#[derive(Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &UserFilter, page: Page) -> Result<Vec<User>> {
        let mut qb = QueryBuilder::<MySql>::new(SELECT_USER);
        qb.push(" WHERE 1 = 1");
        if let Some(role) = &filter.role {
            qb.push(" AND r.name = ").push_bind(role.trim().to_lowercase());
        }
        if let Some(department_id) = filter.department_id {
            qb.push(" AND u.department_id = ").push_bind(department_id);
        }
        if let Some(active) = filter.active {
            qb.push(" AND u.active = ").push_bind(active);
        }
        page.push_to(&mut qb, "u.id DESC");
        Ok(qb.build_query_as::<User>().fetch_all(self.db.pool()).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE u.id = ?", SELECT_USER))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(user)
    }

    pub async fn find_credentials(&self, username: &str) -> Result<Option<UserCredentials>> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT u.id, u.username, u.password_hash, r.name AS role, u.active
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.username = ?
            "#,
        )
        .bind(username.trim())
        .fetch_optional(self.db.pool())
        .await?;
        Ok(creds)
    }

    pub async fn password_hash(&self, id: i64) -> Result<String> {
        let hash: Option<String> = sqlx::query_scalar("SELECT password_hash FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        hash.ok_or_else(|| DbError::NotFound(format!("user {}", id)))
    }

    /// Insert a user. The caller hashes the password.
    pub async fn create(&self, user: &NewUser, password_hash: &str) -> Result<User> {
        user.validate()?;
        let role_id = self.role_id(&user.role).await?;
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, full_name, password_hash, role_id, department_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.username.trim())
        .bind(user.email.trim())
        .bind(user.full_name.trim())
        .bind(password_hash)
        .bind(role_id)
        .bind(user.department_id)
        .execute(self.db.pool())
        .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateUser) -> Result<User> {
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }
        if let Some(full_name) = &changes.full_name {
            require_text("full_name", full_name)?;
        }
        let role_id = match &changes.role {
            Some(role) => Some(self.role_id(role).await?),
            None => None,
        };
        sqlx::query(
            r#"
            UPDATE users SET
                email         = COALESCE(?, email),
                full_name     = COALESCE(?, full_name),
                role_id       = COALESCE(?, role_id),
                department_id = COALESCE(?, department_id),
                active        = COALESCE(?, active)
            WHERE id = ?
            "#,
        )
        .bind(changes.email.as_deref().map(str::trim))
        .bind(changes.full_name.as_deref().map(str::trim))
        .bind(role_id)
        .bind(changes.department_id)
        .bind(changes.active)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    pub async fn set_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            self.get(id).await?;
        }
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("user {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn role_id(&self, role: &str) -> Result<i64> {
        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM roles WHERE name = ?")
            .bind(role.trim().to_lowercase())
            .fetch_optional(self.db.pool())
            .await?;
        id.ok_or_else(|| DbError::invalid(format!("unknown role '{}'", role)))
    }

    async fn get(&self, id: i64) -> Result<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("user {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            username: "amina".into(),
            email: "amina@mill.example".into(),
            full_name: "Amina Ortiz".into(),
            password: "spinning-jenny".into(),
            role: "operator".into(),
            department_id: Some(2),
        }
    }

    #[test]
    fn test_valid_user() {
        assert!(new_user().validate().is_ok());
    }

    #[test]
    fn test_user_validation_errors() {
        let mut user = new_user();
        user.email = "not-an-email".into();
        assert!(user.validate().is_err());

        let mut user = new_user();
        user.username = "two words".into();
        assert!(user.validate().is_err());

        let mut user = new_user();
        user.role = "".into();
        assert!(user.validate().is_err());
    }

    #[test]
    fn test_email_needs_domain_dot() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("a@localhost").is_err());
        assert!(validate_email("@b.co").is_err());
    }
}
