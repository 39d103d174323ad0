//! Read-only aggregations behind the dashboard charts.

use crate::database::Database;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// Headline counters for the dashboard landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct Summary {
    pub users: i64,
    pub equipment: i64,
    pub equipment_down: i64,
    pub open_maintenance_orders: i64,
    pub open_incidents: i64,
    pub low_stock_items: i64,
    pub low_stock_parts: i64,
    pub present_today: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LineEfficiency {
    pub id: i64,
    pub name: String,
    pub target_output: f64,
    pub produced_output: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, FromRow)]
pub struct MonthlyTotals {
    pub month: i64,
    pub income: f64,
    pub expense: f64,
    /// Income minus expense.
    pub balance: f64,
}

/// A label with a row count, used by the pie/bar charts.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct CategoryValue {
    pub category: String,
    pub items: i64,
    pub total_value: f64,
}

/// Pad sparse per-month rows into a January..December series.
pub fn fill_months(rows: Vec<MonthlyTotals>) -> Vec<MonthlyTotals> {
    let mut months: Vec<MonthlyTotals> = (1..=12)
        .map(|month| MonthlyTotals { month, ..Default::default() })
        .collect();
    for row in rows {
        if (1..=12).contains(&row.month) {
            let idx = (row.month - 1) as usize;
            months[idx] = row;
        }
    }
    months
}

#[derive(Clone)]
pub struct DashboardRepository {
    db: Database,
}

impl DashboardRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn summary(&self, today: NaiveDate) -> Result<Summary> {
        let summary = sqlx::query_as::<_, Summary>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users WHERE active = 1) AS users,
                (SELECT COUNT(*) FROM equipment WHERE status <> 'retired') AS equipment,
                (SELECT COUNT(*) FROM equipment WHERE status IN ('maintenance', 'broken')) AS equipment_down,
                (SELECT COUNT(*) FROM maintenance_orders
                    WHERE status IN ('open', 'in_progress')) AS open_maintenance_orders,
                (SELECT COUNT(*) FROM incidents
                    WHERE status IN ('open', 'investigating')) AS open_incidents,
                (SELECT COUNT(*) FROM inventory_items WHERE quantity <= reorder_level) AS low_stock_items,
                (SELECT COUNT(*) FROM spare_parts WHERE quantity <= min_quantity) AS low_stock_parts,
                (SELECT COUNT(*) FROM attendance
                    WHERE work_date = ? AND status IN ('present', 'late')) AS present_today
            "#,
        )
        .bind(today)
        .fetch_one(self.db.pool())
        .await?;
        Ok(summary)
    }

    pub async fn production_efficiency(&self) -> Result<Vec<LineEfficiency>> {
        let rows = sqlx::query_as::<_, LineEfficiency>(
            r#"
            SELECT id, name, target_output, produced_output, efficiency
            FROM production_lines
            ORDER BY efficiency DESC, name ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    /// Income and expense per month of `year`, always twelve entries.
    pub async fn monthly_accounting(&self, year: i32) -> Result<Vec<MonthlyTotals>> {
        let rows = sqlx::query_as::<_, MonthlyTotals>(
            r#"
            SELECT
                CAST(MONTH(entry_date) AS SIGNED) AS month,
                COALESCE(SUM(CASE WHEN kind = 'income'  THEN amount END), 0) AS income,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount END), 0) AS expense,
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE -amount END), 0) AS balance
            FROM accounting_records
            WHERE YEAR(entry_date) = ?
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(year)
        .fetch_all(self.db.pool())
        .await?;
        Ok(fill_months(rows))
    }

    pub async fn incidents_by_severity(&self) -> Result<Vec<LabelCount>> {
        let rows = sqlx::query_as::<_, LabelCount>(
            r#"
            SELECT severity AS label, COUNT(*) AS count
            FROM incidents
            GROUP BY severity
            ORDER BY FIELD(severity, 'critical', 'high', 'medium', 'low')
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    pub async fn maintenance_by_status(&self) -> Result<Vec<LabelCount>> {
        let rows = sqlx::query_as::<_, LabelCount>(
            r#"
            SELECT status AS label, COUNT(*) AS count
            FROM maintenance_orders
            GROUP BY status
            ORDER BY count DESC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    pub async fn attendance_by_status(&self, day: NaiveDate) -> Result<Vec<LabelCount>> {
        let rows = sqlx::query_as::<_, LabelCount>(
            r#"
            SELECT status AS label, COUNT(*) AS count
            FROM attendance
            WHERE work_date = ?
            GROUP BY status
            ORDER BY count DESC
            "#,
        )
        .bind(day)
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }

    pub async fn inventory_value_by_category(&self) -> Result<Vec<CategoryValue>> {
        let rows = sqlx::query_as::<_, CategoryValue>(
            r#"
            SELECT category, COUNT(*) AS items, COALESCE(SUM(total_value), 0) AS total_value
            FROM inventory_items
            GROUP BY category
            ORDER BY total_value DESC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fill_months_pads_gaps() {
        let rows = vec![
            MonthlyTotals { month: 2, income: 5000.0, expense: 1200.0, balance: 3800.0 },
            MonthlyTotals { month: 11, income: 0.0, expense: 300.0, balance: -300.0 },
        ];
        let months = fill_months(rows);
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], MonthlyTotals { month: 1, ..Default::default() });
        assert_eq!(months[1].balance, 3800.0);
        assert_eq!(months[10].expense, 300.0);
        assert_eq!(months[11].month, 12);
    }

    #[test]
    fn test_fill_months_ignores_out_of_range() {
        let months = fill_months(vec![MonthlyTotals { month: 13, income: 1.0, expense: 0.0, balance: 1.0 }]);
        assert!(months.iter().all(|m| m.income == 0.0));
    }
}
