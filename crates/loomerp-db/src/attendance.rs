//! Attendance repository.
//!
//! One row per user per day. `hours_worked` is a stored generated column.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::types::{string_column, Page};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use loomerp_common::metrics;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySql, QueryBuilder};
use strum_macros::{Display, EnumString};
use tracing::debug;

/// Shift start used to flag late check-ins.
pub const SHIFT_START: (u32, u32) = (8, 0);
/// Minutes after shift start that still count as on time.
pub const GRACE_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Late,
    Absent,
    Leave,
}

string_column!(AttendanceStatus);

impl AttendanceStatus {
    pub fn for_check_in(at: NaiveTime) -> Self {
        let (h, m) = SHIFT_START;
        let cutoff = NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
            + Duration::minutes(GRACE_MINUTES);
        if at > cutoff {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub user_id: i64,
    pub work_date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub status: AttendanceStatus,
    pub hours_worked: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAttendance {
    pub user_id: i64,
    pub work_date: NaiveDate,
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Hours worked for a pair of times, `None` while the record is still open.
fn worked_hours(check_in: Option<NaiveDateTime>, check_out: Option<NaiveDateTime>) -> Result<Option<f64>> {
    match (check_in, check_out) {
        (None, Some(_)) => Err(DbError::invalid("check_out requires check_in")),
        (Some(_), Some(_)) => metrics::hours_between(check_in, check_out)
            .map(Some)
            .ok_or_else(|| DbError::invalid("check_out must not be before check_in")),
        _ => Ok(None),
    }
}

fn validate_record(
    status: AttendanceStatus,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
) -> Result<()> {
    worked_hours(check_in, check_out)?;
    if matches!(status, AttendanceStatus::Absent | AttendanceStatus::Leave) && check_in.is_some() {
        return Err(DbError::invalid(format!("a {} record cannot have a check-in", status)));
    }
    Ok(())
}

impl NewAttendance {
    pub fn validate(&self) -> Result<()> {
        validate_record(self.status, self.check_in, self.check_out)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAttendance {
    pub check_in: Option<NaiveDateTime>,
    pub check_out: Option<NaiveDateTime>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttendanceFilter {
    pub user_id: Option<i64>,
    pub status: Option<AttendanceStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

const SELECT_ATTENDANCE: &str = r#"
    SELECT id, user_id, work_date, check_in, check_out, status, hours_worked, notes,
           created_at, updated_at
    FROM attendance
"#;

#[derive(Clone)]
pub struct AttendanceRepository {
    db: Database,
}

impl AttendanceRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self, filter: &AttendanceFilter, page: Page) -> Result<Vec<AttendanceRecord>> {
        let mut qb = QueryBuilder::<MySql>::new(SELECT_ATTENDANCE);
        qb.push(" WHERE 1 = 1");
        if let Some(user_id) = filter.user_id {
            qb.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(from) = filter.from {
            qb.push(" AND work_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND work_date <= ").push_bind(to);
        }
        page.push_to(&mut qb, "work_date DESC, id DESC");
        Ok(qb.build_query_as::<AttendanceRecord>().fetch_all(self.db.pool()).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!("{} WHERE id = ?", SELECT_ATTENDANCE))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(record)
    }

    pub async fn find_for_day(&self, user_id: i64, day: NaiveDate) -> Result<Option<AttendanceRecord>> {
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "{} WHERE user_id = ? AND work_date = ?",
            SELECT_ATTENDANCE
        ))
        .bind(user_id)
        .bind(day)
        .fetch_optional(self.db.pool())
        .await?;
        Ok(record)
    }

    pub async fn create(&self, record: &NewAttendance) -> Result<AttendanceRecord> {
        record.validate()?;
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, work_date, check_in, check_out, status, notes)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.user_id)
        .bind(record.work_date)
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.status)
        .bind(&record.notes)
        .execute(self.db.pool())
        .await?;
        self.get(result.last_insert_id() as i64).await
    }

    pub async fn update(&self, id: i64, changes: &UpdateAttendance) -> Result<AttendanceRecord> {
        let current = self.get(id).await?;
        validate_record(
            changes.status.unwrap_or(current.status),
            changes.check_in.or(current.check_in),
            changes.check_out.or(current.check_out),
        )?;
        sqlx::query(
            r#"
            UPDATE attendance SET
                check_in  = COALESCE(?, check_in),
                check_out = COALESCE(?, check_out),
                status    = COALESCE(?, status),
                notes     = COALESCE(?, notes)
            WHERE id = ?
            "#,
        )
        .bind(changes.check_in)
        .bind(changes.check_out)
        .bind(changes.status)
        .bind(&changes.notes)
        .bind(id)
        .execute(self.db.pool())
        .await?;
        self.get(id).await
    }

    /// Open today's record for a user.
    pub async fn check_in(&self, user_id: i64, now: NaiveDateTime) -> Result<AttendanceRecord> {
        let day = now.date();
        if self.find_for_day(user_id, day).await?.is_some() {
            return Err(DbError::Duplicate(format!("already checked in on {}", day)));
        }
        let record = NewAttendance {
            user_id,
            work_date: day,
            check_in: Some(now),
            check_out: None,
            status: AttendanceStatus::for_check_in(now.time()),
            notes: None,
        };
        self.create(&record).await
    }

    /// Close today's open record for a user.
    pub async fn check_out(&self, user_id: i64, now: NaiveDateTime) -> Result<AttendanceRecord> {
        let day = now.date();
        let record = self
            .find_for_day(user_id, day)
            .await?
            .ok_or_else(|| DbError::invalid(format!("no check-in recorded on {}", day)))?;
        if record.check_out.is_some() {
            return Err(DbError::invalid(format!("already checked out on {}", day)));
        }
        let hours = worked_hours(record.check_in, Some(now))?;
        sqlx::query("UPDATE attendance SET check_out = ? WHERE id = ?")
            .bind(now)
            .bind(record.id)
            .execute(self.db.pool())
            .await?;
        debug!(user_id, day = %day, hours = ?hours, "checked out");
        self.get(record.id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("attendance record {}", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attendance")
            .fetch_one(self.db.pool())
            .await?;
        Ok(n as u64)
    }

    async fn get(&self, id: i64) -> Result<AttendanceRecord> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("attendance record {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day_at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 12).unwrap().and_time(t(h, m))
    }

    #[test]
    fn test_late_after_grace_period() {
        assert_eq!(AttendanceStatus::for_check_in(t(7, 50)), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::for_check_in(t(8, 15)), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::for_check_in(t(8, 16)), AttendanceStatus::Late);
    }

    #[test]
    fn test_check_out_before_check_in_rejected() {
        let record = NewAttendance {
            user_id: 4,
            work_date: day_at(0, 0).date(),
            check_in: Some(day_at(17, 0)),
            check_out: Some(day_at(8, 0)),
            status: AttendanceStatus::Present,
            notes: None,
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_absent_without_check_in() {
        let record = NewAttendance {
            user_id: 4,
            work_date: day_at(0, 0).date(),
            check_in: Some(day_at(8, 0)),
            check_out: None,
            status: AttendanceStatus::Absent,
            notes: None,
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn test_worked_hours() {
        assert_eq!(worked_hours(Some(day_at(8, 0)), Some(day_at(16, 45))).unwrap(), Some(8.75));
        assert_eq!(worked_hours(Some(day_at(8, 0)), None).unwrap(), None);
        assert_eq!(worked_hours(None, None).unwrap(), None);
    }

    #[test]
    fn test_check_out_requires_check_in() {
        assert!(worked_hours(None, Some(day_at(9, 0))).is_err());
    }

    #[test]
    fn test_merged_leave_record_cannot_keep_check_in() {
        // An update switching a checked-in record to leave.
        assert!(validate_record(AttendanceStatus::Leave, Some(day_at(8, 5)), None).is_err());
        assert!(validate_record(AttendanceStatus::Leave, None, None).is_ok());
        assert!(validate_record(AttendanceStatus::Late, Some(day_at(8, 30)), Some(day_at(17, 0))).is_ok());
    }
}
