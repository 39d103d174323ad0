//! Inventory repository for raw materials, yarn, fabric and finished goods.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{require_non_negative, require_text, string_column, Page};
use chrono::{DateTime, Utc};
use loomerp_common::metrics;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemCategory {
    RawMaterial,
    Yarn,
    Dye,
    Fabric,
    FinishedGood,
    Packaging,
}

string_column!(ItemCategory);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InventoryItem {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub category: ItemCategory,
    pub unit: String,
    pub quantity: f64,
    pub unit_cost: f64,
    pub reorder_level: f64,
    pub total_value: f64,
    pub warehouse: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        metrics::is_low_stock(self.quantity, self.reorder_level)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInventoryItem {
    pub sku: String,
    pub name: String,
    pub category: ItemCategory,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub reorder_level: f64,
    pub warehouse: Option<String>,
}

fn default_unit() -> String { "kg".to_string() }

impl NewInventoryItem {
    pub fn validate(&self) -> Result<()> {
        require_text("sku", &self.sku)?;
        require_text("name", &self.name)?;
        require_text("unit", &self.unit)?;
        require_non_negative("quantity", self.quantity)?;
        require_non_negative("unit_cost", self.unit_cost)?;
        require_non_negative("reorder_level", self.reorder_level)?;
        // total_value is generated from these two; MySQL rejects a non-finite DOUBLE.
        if !metrics::stock_value(self.quantity, self.unit_cost).is_finite() {
            return Err(DbError::invalid("quantity * unit_cost is out of range"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateInventoryItem {
    pub name: Option<String>,
    pub category: Option<ItemCategory>,
    pub unit: Option<String>,
    pub unit_cost: Option<f64>,
    pub reorder_level: Option<f64>,
    pub warehouse: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryFilter {
    pub category: Option<ItemCategory>,
    pub warehouse: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
}

const SELECT_ITEM: &str = r#"
    SELECT id, sku, name, category, unit, quantity, unit_cost, reorder_level, total_value,
           warehouse, created_at, updated_at
    FROM inventory_items
"#;

#[derive(Clone)]
pub struct InventoryRepository {
    db: Database,
}

impl InventoryRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &InventoryFilter, page: Page) -> Result<Vec<InventoryItem>> {
        let mut qb = QueryBuilder::<MySql>::new(SELECT_ITEM);
        qb.push(" WHERE 1 = 1");
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category);
        }
        if let Some(warehouse) = &filter.warehouse {
            qb.push(" AND warehouse = ").push_bind(warehouse.clone());
        }
        if filter.low_stock {
            qb.push(" AND quantity <= reorder_level");
        }
        page.push_to(&mut qb, "id DESC");
        Ok(qb.build_query_as::<InventoryItem>().fetch_all(self.db.pool()).await?)
    }

    /// Every item at or below its reorder level. Not paged.
    pub async fn low_stock(&self) -> Result<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>(&format!(
            "{} WHERE quantity <= reorder_level ORDER BY id DESC",
            SELECT_ITEM
        ))
        .fetch_all(self.db.pool())
        .await?;
        Ok(items)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>(&format!("{} WHERE id = ?", SELECT_ITEM))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(item)
    }

    pub async fn create(&self, item: &NewInventoryItem) -> Result<InventoryItem> {
        item.validate()?;
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_items
                (sku, name, category, unit, quantity, unit_cost, reorder_level, warehouse)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(item.sku.trim())
        .bind(item.name.trim())
        .bind(item.category)
        .bind(item.unit.trim())
        .bind(item.quantity)
        .bind(item.unit_cost)
        .bind(item.reorder_level)
        .bind(&item.warehouse)
        .execute(self.db.pool())
        .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateInventoryItem) -> Result<InventoryItem> {
        if let Some(name) = &changes.name {
            require_text("name", name)?;
        }
        if let Some(cost) = changes.unit_cost {
            require_non_negative("unit_cost", cost)?;
        }
        if let Some(level) = changes.reorder_level {
            require_non_negative("reorder_level", level)?;
        }
        sqlx::query(
            r#"
            UPDATE inventory_items SET
                name          = COALESCE(?, name),
                category      = COALESCE(?, category),
                unit          = COALESCE(?, unit),
                unit_cost     = COALESCE(?, unit_cost),
                reorder_level = COALESCE(?, reorder_level),
                warehouse     = COALESCE(?, warehouse)
            WHERE id = ?
            "#,
        )
        .bind(changes.name.as_deref().map(str::trim))
        .bind(changes.category)
        .bind(changes.unit.as_deref().map(str::trim))
        .bind(changes.unit_cost)
        .bind(changes.reorder_level)
        .bind(&changes.warehouse)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    /// Receive (positive) or issue (negative) stock.
    pub async fn adjust_quantity(&self, id: i64, delta: f64) -> Result<InventoryItem> {
        if !delta.is_finite() {
            return Err(DbError::invalid("delta must be a number"));
        }
        let result = sqlx::query(
            "UPDATE inventory_items SET quantity = quantity + ? WHERE id = ? AND quantity + ? >= 0",
        )
        .bind(delta)
        .bind(id)
        .bind(delta)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 && delta != 0.0 {
            let item = self.get(id).await?;
            return Err(DbError::invalid(format!(
                "insufficient stock for {}: have {} {}, requested {}",
                item.sku, item.quantity, item.unit, -delta
            )));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("inventory item {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_items")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<InventoryItem> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("inventory item {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parse() {
        assert_eq!("finished_good".parse::<ItemCategory>().unwrap(), ItemCategory::FinishedGood);
        assert_eq!(ItemCategory::RawMaterial.to_string(), "raw_material");
    }

    #[test]
    fn test_new_item_defaults_unit() {
        let item: NewInventoryItem = serde_json::from_str(
            r#"{"sku": "YRN-CTN-30", "name": "Cotton yarn 30s", "category": "yarn", "quantity": 120.5}"#,
        )
        .unwrap();
        assert_eq!(item.unit, "kg");
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_stock_value_out_of_range() {
        let item: NewInventoryItem = serde_json::from_str(
            r#"{"sku": "DYE-IND-01", "name": "Indigo paste", "category": "dye", "quantity": 1e300, "unit_cost": 1e300}"#,
        )
        .unwrap();
        assert!(matches!(item.validate(), Err(DbError::Invalid(ref m)) if m.contains("out of range")));
    }

    #[test]
    fn test_item_low_stock_at_reorder_level() {
        let item = InventoryItem {
            id: 1,
            sku: "FAB-DNM-12".into(),
            name: "Denim 12oz".into(),
            category: ItemCategory::Fabric,
            unit: "m".into(),
            quantity: 50.0,
            unit_cost: 4.2,
            reorder_level: 50.0,
            total_value: 210.0,
            warehouse: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(item.is_low_stock());
        assert!(!InventoryItem { quantity: 50.5, ..item }.is_low_stock());
    }

    #[test]
    fn test_invalid_item() {
        let item: NewInventoryItem = serde_json::from_str(
            r#"{"sku": "", "name": "Indigo", "category": "dye"}"#,
        )
        .unwrap();
        assert!(item.validate().is_err());
    }
}
