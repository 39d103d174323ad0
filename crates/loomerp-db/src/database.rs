//! Database connection and table management.

use crate::error::Result;
use crate::schema;
use loomerp_common::Role;
use loomerp_config::DatabaseConfig;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use std::time::Duration;
use tracing::{debug, info};

/// Main database handle. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    /// Open a connection pool.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = Self::pool_options(config)
            .connect(&config.url)
            .await?;
        info!(max_connections = config.max_connections, "connected to MySQL");
        Ok(Self { pool })
    }

    /// Build a pool that only connects on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self> {
        let pool = Self::pool_options(config).connect_lazy(&config.url)?;
        Ok(Self { pool })
    }

    fn pool_options(config: &DatabaseConfig) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Create all tables if they don't exist and seed the built-in roles.
    pub async fn initialize(&self) -> Result<()> {
        for (table, ddl) in schema::CREATE_STATEMENTS {
            debug!(table, "ensuring table");
            sqlx::query(ddl).execute(&self.pool).await?;
        }

        for role in Role::builtin() {
            sqlx::query("INSERT IGNORE INTO roles (name, description) VALUES (?, ?)")
                .bind(role.as_str())
                .bind(role.description())
                .execute(&self.pool)
                .await?;
        }

        info!(tables = schema::CREATE_STATEMENTS.len(), "schema ready");
        Ok(())
    }

    /// Round-trip a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
