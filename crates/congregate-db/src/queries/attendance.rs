use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::{DbAttendanceRecord, NewAttendanceRecord};
use crate::queries::AttendanceStatusQueries;
use chrono::{NaiveDate, Utc};
use congregate_common::AttendanceRecord;

const SELECT_RECORDS: &str = r#"
    SELECT r.id, r.activity_id, r.user_id, r.date, r.note, r.recorded_at,
           s.name AS status_name,
           s.description AS status_description,
           s.is_counted_as_attended
    FROM attendance_records r
    JOIN attendance_status s ON s.id = r.status_id
"#;

pub struct AttendanceQueries;

impl AttendanceQueries {
    /// Mark a member's attendance for one date. Marking the same member
    /// twice for the same activity and date replaces the earlier mark.
    pub async fn record(db: &Database, record: NewAttendanceRecord) -> Result<DbAttendanceRecord> {
        let status = AttendanceStatusQueries::get_by_name(db, &record.status).await?;
        let pool = db.pool()?;

        sqlx::query(
            r#"
            INSERT INTO attendance_records (activity_id, user_id, date, status_id, note, recorded_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (activity_id, user_id, date) DO UPDATE SET
                status_id = excluded.status_id,
                note = excluded.note,
                recorded_at = excluded.recorded_at
            "#,
        )
        .bind(record.activity_id)
        .bind(record.user_id)
        .bind(record.date)
        .bind(status.id)
        .bind(&record.note)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Self::get(db, record.activity_id, record.user_id, record.date).await
    }

    pub async fn get(
        db: &Database,
        activity_id: i64,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<DbAttendanceRecord> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbAttendanceRecord>(&format!(
            "{} WHERE r.activity_id = ? AND r.user_id = ? AND r.date = ?",
            SELECT_RECORDS
        ))
        .bind(activity_id)
        .bind(user_id)
        .bind(date)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            DbError::NotFound(format!(
                "Attendance of user {} at activity {} on {} not found",
                user_id, activity_id, date
            ))
        })
    }

    /// Attendance marks of an activity within `[start_date, end_date]`.
    pub async fn list_for_activity_range(
        db: &Database,
        activity_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        let pool = db.pool()?;

        let rows = sqlx::query_as::<_, DbAttendanceRecord>(&format!(
            "{} WHERE r.activity_id = ? AND r.date >= ? AND r.date <= ? ORDER BY r.date, r.user_id",
            SELECT_RECORDS
        ))
        .bind(activity_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(AttendanceRecord::from).collect())
    }

    pub async fn list_for_user(
        db: &Database,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<DbAttendanceRecord>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbAttendanceRecord>(&format!(
            "{} WHERE r.user_id = ? ORDER BY r.date DESC LIMIT ?",
            SELECT_RECORDS
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    pub async fn delete(
        db: &Database,
        activity_id: i64,
        user_id: i64,
        date: NaiveDate,
    ) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query(
            "DELETE FROM attendance_records WHERE activity_id = ? AND user_id = ? AND date = ?",
        )
        .bind(activity_id)
        .bind(user_id)
        .bind(date)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            Err(DbError::NotFound(format!(
                "Attendance of user {} at activity {} on {} not found",
                user_id, activity_id, date
            )))
        } else {
            Ok(())
        }
    }
}
