//! Spare part repository.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{require_non_negative, require_text, Page};
use chrono::{DateTime, Utc};
use loomerp_common::metrics;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SparePart {
    pub id: i64,
    pub name: String,
    pub part_number: String,
    pub quantity: i32,
    pub min_quantity: i32,
    pub unit_cost: f64,
    pub equipment_id: Option<i64>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SparePart {
    pub fn is_low_stock(&self) -> bool {
        metrics::is_low_stock(self.quantity as f64, self.min_quantity as f64)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSparePart {
    pub name: String,
    pub part_number: String,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub min_quantity: i32,
    #[serde(default)]
    pub unit_cost: f64,
    pub equipment_id: Option<i64>,
    pub location: Option<String>,
}

impl NewSparePart {
    pub fn validate(&self) -> Result<()> {
        require_text("name", &self.name)?;
        require_text("part_number", &self.part_number)?;
        require_non_negative("quantity", self.quantity as f64)?;
        require_non_negative("min_quantity", self.min_quantity as f64)?;
        require_non_negative("unit_cost", self.unit_cost)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSparePart {
    pub name: Option<String>,
    pub min_quantity: Option<i32>,
    pub unit_cost: Option<f64>,
    pub equipment_id: Option<i64>,
    pub location: Option<String>,
}

/// Largest number of pieces a single adjustment may move.
pub const MAX_ADJUSTMENT: i32 = 1_000_000;

#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustment {
    pub delta: f64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SparePartFilter {
    pub equipment_id: Option<i64>,
    #[serde(default)]
    pub low_stock: bool,
}

const SELECT_PART: &str = r#"
    SELECT id, name, part_number, quantity, min_quantity, unit_cost, equipment_id,
           location, created_at, updated_at
    FROM spare_parts
"#;

#[derive(Clone)]
pub struct SparePartRepository {
    db: Database,
}

impl SparePartRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &SparePartFilter, page: Page) -> Result<Vec<SparePart>> {
        let mut qb = QueryBuilder::<MySql>::new(SELECT_PART);
        qb.push(" WHERE 1 = 1");
        if let Some(equipment_id) = filter.equipment_id {
            qb.push(" AND equipment_id = ").push_bind(equipment_id);
        }
        if filter.low_stock {
            qb.push(" AND quantity <= min_quantity");
        }
        page.push_to(&mut qb, "id DESC");
        Ok(qb.build_query_as::<SparePart>().fetch_all(self.db.pool()).await?)
    }

    /// Every part at or below its minimum quantity. Not paged.
    pub async fn low_stock(&self) -> Result<Vec<SparePart>> {
        let parts = sqlx::query_as::<_, SparePart>(&format!(
            "{} WHERE quantity <= min_quantity ORDER BY id DESC",
            SELECT_PART
        ))
        .fetch_all(self.db.pool())
        .await?;
        Ok(parts)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<SparePart>> {
        let part = sqlx::query_as::<_, SparePart>(&format!("{} WHERE id = ?", SELECT_PART))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(part)
    }

    pub async fn create(&self, part: &NewSparePart) -> Result<SparePart> {
        part.validate()?;
        let result = sqlx::query(
            r#"
            INSERT INTO spare_parts
                (name, part_number, quantity, min_quantity, unit_cost, equipment_id, location)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(part.name.trim())
        .bind(part.part_number.trim())
        .bind(part.quantity)
        .bind(part.min_quantity)
        .bind(part.unit_cost)
        .bind(part.equipment_id)
        .bind(&part.location)
        .execute(self.db.pool())
        .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateSparePart) -> Result<SparePart> {
        if let Some(name) = &changes.name {
            require_text("name", name)?;
        }
        if let Some(min) = changes.min_quantity {
            require_non_negative("min_quantity", min as f64)?;
        }
        if let Some(cost) = changes.unit_cost {
            require_non_negative("unit_cost", cost)?;
        }
        sqlx::query(
            r#"
            UPDATE spare_parts SET
                name         = COALESCE(?, name),
                min_quantity = COALESCE(?, min_quantity),
                unit_cost    = COALESCE(?, unit_cost),
                equipment_id = COALESCE(?, equipment_id),
                location     = COALESCE(?, location)
            WHERE id = ?
            "#,
        )
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.min_quantity)
        .bind(changes.unit_cost)
        .bind(changes.equipment_id)
        .bind(&changes.location)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    /// Add or withdraw stock. The result must stay within `0..=i32::MAX` pieces.
    pub async fn adjust_quantity(&self, id: i64, delta: i32) -> Result<SparePart> {
        if delta.abs() > MAX_ADJUSTMENT {
            return Err(DbError::invalid(format!("delta must be within ±{} pieces", MAX_ADJUSTMENT)));
        }
        // The sum is evaluated as BIGINT, so the bounds check itself cannot overflow.
        let result = sqlx::query(
            r#"
            UPDATE spare_parts SET quantity = quantity + ?
            WHERE id = ? AND CAST(quantity AS SIGNED) + ? BETWEEN 0 AND 2147483647
            "#,
        )
        .bind(delta)
        .bind(id)
        .bind(i64::from(delta))
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 && delta != 0 {
            let part = self.get(id).await?;
            return Err(if delta < 0 {
                DbError::invalid(format!(
                    "insufficient stock for {}: have {}, requested {}",
                    part.part_number, part.quantity, -delta
                ))
            } else {
                DbError::invalid(format!("stock for {} would exceed the column range", part.part_number))
            });
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM spare_parts WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("spare part {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM spare_parts")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<SparePart> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("spare part {}", id)))
    }
}

impl StockAdjustment {
    /// Whole-unit delta for spare parts, which are counted in pieces.
    pub fn whole_units(&self) -> Result<i32> {
        if !self.delta.is_finite() || self.delta.fract() != 0.0 {
            return Err(DbError::invalid("delta must be a whole number of pieces"));
        }
        if self.delta.abs() > MAX_ADJUSTMENT as f64 {
            return Err(DbError::invalid(format!("delta must be within ±{} pieces", MAX_ADJUSTMENT)));
        }
        Ok(self.delta as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(quantity: i32, min_quantity: i32) -> SparePart {
        SparePart {
            id: 1,
            name: "Heddle frame".into(),
            part_number: "HF-220".into(),
            quantity,
            min_quantity,
            unit_cost: 35.0,
            equipment_id: None,
            location: Some("Bay 3".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock() {
        assert!(part(2, 5).is_low_stock());
        assert!(part(5, 5).is_low_stock());
        assert!(!part(6, 5).is_low_stock());
    }

    #[test]
    fn test_whole_unit_adjustment() {
        let adj = StockAdjustment { delta: -3.0, reason: None };
        assert_eq!(adj.whole_units().unwrap(), -3);

        let adj = StockAdjustment { delta: 1.5, reason: None };
        assert!(adj.whole_units().is_err());
    }

    #[test]
    fn test_adjustment_bounded() {
        let adj = StockAdjustment { delta: MAX_ADJUSTMENT as f64, reason: None };
        assert_eq!(adj.whole_units().unwrap(), MAX_ADJUSTMENT);

        for delta in [MAX_ADJUSTMENT as f64 + 1.0, 2_147_483_000.0, -3e9] {
            let adj = StockAdjustment { delta, reason: None };
            assert!(adj.whole_units().is_err(), "delta {}", delta);
        }
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let part = NewSparePart {
            name: "Bobbin".into(),
            part_number: "BB-1".into(),
            quantity: -1,
            min_quantity: 0,
            unit_cost: 1.0,
            equipment_id: None,
            location: None,
        };
        assert!(part.validate().is_err());
    }
}
