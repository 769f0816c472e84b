use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::DbAttendanceStatus;
use congregate_common::AttendanceStatus;

pub struct AttendanceStatusQueries;

impl AttendanceStatusQueries {
    pub async fn create(db: &Database, status: &AttendanceStatus) -> Result<DbAttendanceStatus> {
        let pool = db.pool()?;

        sqlx::query(
            "INSERT INTO attendance_status (name, description, is_counted_as_attended) VALUES (?, ?, ?)",
        )
        .bind(&status.name)
        .bind(&status.description)
        .bind(status.is_counted_as_attended)
        .execute(pool)
        .await
        .map_err(|e| {
            DbError::from_write(e, || format!("Attendance status '{}' already exists", status.name))
        })?;

        Self::get_by_name(db, &status.name).await
    }

    pub async fn get_by_name(db: &Database, name: &str) -> Result<DbAttendanceStatus> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbAttendanceStatus>("SELECT * FROM attendance_status WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Attendance status '{}' not found", name)))
    }

    pub async fn list(db: &Database) -> Result<Vec<DbAttendanceStatus>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbAttendanceStatus>("SELECT * FROM attendance_status ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(DbError::Sqlx)
    }

    /// Change whether a status counts toward attendance. Existing statistics
    /// are not touched; recompute them afterwards.
    pub async fn set_counted(db: &Database, name: &str, counted: bool) -> Result<()> {
        let pool = db.pool()?;

        let result =
            sqlx::query("UPDATE attendance_status SET is_counted_as_attended = ? WHERE name = ?")
                .bind(counted)
                .bind(name)
                .execute(pool)
                .await?;

        if result.rows_affected() == 0 {
            Err(DbError::NotFound(format!("Attendance status '{}' not found", name)))
        } else {
            Ok(())
        }
    }

    /// Delete an unused status. Statuses referenced by attendance records
    /// are protected by the foreign key.
    pub async fn delete(db: &Database, name: &str) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query("DELETE FROM attendance_status WHERE name = ?")
            .bind(name)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(DbError::NotFound(format!("Attendance status '{}' not found", name)))
        } else {
            Ok(())
        }
    }
}
