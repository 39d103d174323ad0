//! Maintenance order repository.
//!
//! Opening a corrective order moves the equipment to `maintenance`; completing
//! any order returns it to `operational` and stamps the maintenance date.
//! Both happen in one transaction with the order write.

use crate::database::Database;
use crate::equipment::EquipmentStatus;
use crate::error::{DbError, Result};
use crate::types::{require_non_negative, require_text, string_column, Page};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};
use strum_macros::{Display, EnumString};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderType {
    Preventive,
    Corrective,
    Inspection,
}

string_column!(OrderType);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

string_column!(Priority);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
}

string_column!(OrderStatus);

impl OrderStatus {
    pub fn is_closed(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MaintenanceOrder {
    pub id: i64,
    pub equipment_id: i64,
    pub order_type: OrderType,
    pub priority: Priority,
    pub status: OrderStatus,
    pub description: String,
    pub scheduled_date: Option<NaiveDate>,
    pub assigned_to: Option<i64>,
    pub cost: f64,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMaintenanceOrder {
    pub equipment_id: i64,
    pub order_type: OrderType,
    #[serde(default)]
    pub priority: Priority,
    pub description: String,
    pub scheduled_date: Option<NaiveDate>,
    pub assigned_to: Option<i64>,
    #[serde(default)]
    pub cost: f64,
}

impl NewMaintenanceOrder {
    pub fn validate(&self) -> Result<()> {
        require_text("description", &self.description)?;
        require_non_negative("cost", self.cost)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaintenanceOrder {
    pub order_type: Option<OrderType>,
    pub priority: Option<Priority>,
    pub status: Option<OrderStatus>,
    pub description: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub assigned_to: Option<i64>,
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteOrder {
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceFilter {
    pub status: Option<OrderStatus>,
    pub equipment_id: Option<i64>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<i64>,
}

const SELECT_ORDER: &str = r#"
    SELECT id, equipment_id, order_type, priority, status, description, scheduled_date,
           assigned_to, cost, completed_at, created_at, updated_at
    FROM maintenance_orders
"#;

#[derive(Clone)]
pub struct MaintenanceRepository {
    db: Database,
}

impl MaintenanceRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &MaintenanceFilter, page: Page) -> Result<Vec<MaintenanceOrder>> {
        let mut qb = QueryBuilder::<MySql>::new(SELECT_ORDER);
        qb.push(" WHERE 1 = 1");
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(equipment_id) = filter.equipment_id {
            qb.push(" AND equipment_id = ").push_bind(equipment_id);
        }
        if let Some(priority) = filter.priority {
            qb.push(" AND priority = ").push_bind(priority);
        }
        if let Some(assignee) = filter.assigned_to {
            qb.push(" AND assigned_to = ").push_bind(assignee);
        }
        page.push_to(&mut qb, "id DESC");
        Ok(qb.build_query_as::<MaintenanceOrder>().fetch_all(self.db.pool()).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<MaintenanceOrder>> {
        let order = sqlx::query_as::<_, MaintenanceOrder>(&format!("{} WHERE id = ?", SELECT_ORDER))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(order)
    }

    pub async fn create(&self, order: &NewMaintenanceOrder) -> Result<MaintenanceOrder> {
        order.validate()?;
        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO maintenance_orders
                (equipment_id, order_type, priority, description, scheduled_date, assigned_to, cost)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.equipment_id)
        .bind(order.order_type)
        .bind(order.priority)
        .bind(order.description.trim())
        .bind(order.scheduled_date)
        .bind(order.assigned_to)
        .bind(order.cost)
        .execute(&mut *tx)
        .await?;

        if order.order_type == OrderType::Corrective {
            sqlx::query("UPDATE equipment SET status = ? WHERE id = ?")
                .bind(EquipmentStatus::Maintenance)
                .bind(order.equipment_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateMaintenanceOrder) -> Result<MaintenanceOrder> {
        if let Some(description) = &changes.description {
            require_text("description", description)?;
        }
        if let Some(cost) = changes.cost {
            require_non_negative("cost", cost)?;
        }
        if changes.status == Some(OrderStatus::Completed) {
            return Err(DbError::invalid("use the complete action to close an order"));
        }
        sqlx::query(
            r#"
            UPDATE maintenance_orders SET
                order_type     = COALESCE(?, order_type),
                priority       = COALESCE(?, priority),
                status         = COALESCE(?, status),
                description    = COALESCE(?, description),
                scheduled_date = COALESCE(?, scheduled_date),
                assigned_to    = COALESCE(?, assigned_to),
                cost           = COALESCE(?, cost)
            WHERE id = ?
            "#,
        )
        .bind(changes.order_type)
        .bind(changes.priority)
        .bind(changes.status)
        .bind(changes.description.as_deref().map(str::trim))
        .bind(changes.scheduled_date)
        .bind(changes.assigned_to)
        .bind(changes.cost)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    /// Close an order and put its equipment back in service.
    pub async fn complete(&self, id: i64, completion: &CompleteOrder, now: NaiveDateTime) -> Result<MaintenanceOrder> {
        if let Some(cost) = completion.cost {
            require_non_negative("cost", cost)?;
        }
        let order = self.get(id).await?;
        if order.status.is_closed() {
            return Err(DbError::invalid(format!("maintenance order {} is already {}", id, order.status)));
        }

        let mut tx = self.db.pool().begin().await?;
        sqlx::query(
            r#"
            UPDATE maintenance_orders
            SET status = ?, completed_at = ?, cost = COALESCE(?, cost)
            WHERE id = ?
            "#,
        )
        .bind(OrderStatus::Completed)
        .bind(now)
        .bind(completion.cost)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE equipment SET status = ?, last_maintenance_date = ? WHERE id = ?")
            .bind(EquipmentStatus::Operational)
            .bind(now.date())
            .bind(order.equipment_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(order_id = id, equipment_id = order.equipment_id, "maintenance order completed");
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM maintenance_orders WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("maintenance order {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM maintenance_orders")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<MaintenanceOrder> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("maintenance order {}", id)))
    }
}
