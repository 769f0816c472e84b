use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::DbActivityStatistics;
use chrono::{NaiveDate, Utc};
use congregate_common::ActivityStatistics;
use sqlx::Row;

const UPSERT_STATISTICS: &str = r#"
    INSERT INTO activity_statistics (
        activity_id, date, total_instances, total_attendance, average_attendance, computed_at
    )
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT (activity_id, date) DO UPDATE SET
        total_instances = excluded.total_instances,
        total_attendance = excluded.total_attendance,
        average_attendance = excluded.average_attendance,
        computed_at = excluded.computed_at
"#;

pub struct StatisticsQueries;

impl StatisticsQueries {
    /// Insert or wholesale replace the row for `(activity_id, date)`.
    ///
    /// Concurrent recomputations of the same key serialize inside SQLite;
    /// the last writer's row wins intact.
    pub async fn upsert(db: &Database, stats: &ActivityStatistics) -> Result<()> {
        let pool = db.pool()?;

        sqlx::query(UPSERT_STATISTICS)
            .bind(stats.activity_id)
            .bind(stats.date)
            .bind(stats.total_instances)
            .bind(stats.total_attendance)
            .bind(stats.average_attendance)
            .bind(Utc::now())
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Upsert several rows in one transaction.
    pub async fn upsert_many(db: &Database, rows: &[ActivityStatistics]) -> Result<()> {
        let pool = db.pool()?;
        let mut tx = pool.begin().await?;
        let now = Utc::now();

        for stats in rows {
            sqlx::query(UPSERT_STATISTICS)
                .bind(stats.activity_id)
                .bind(stats.date)
                .bind(stats.total_instances)
                .bind(stats.total_attendance)
                .bind(stats.average_attendance)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(db: &Database, activity_id: i64, date: NaiveDate) -> Result<DbActivityStatistics> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbActivityStatistics>(
            "SELECT * FROM activity_statistics WHERE activity_id = ? AND date = ?",
        )
        .bind(activity_id)
        .bind(date)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            DbError::NotFound(format!("Statistics for activity {} on {} not found", activity_id, date))
        })
    }

    pub async fn list_for_activity_range(
        db: &Database,
        activity_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<DbActivityStatistics>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbActivityStatistics>(
            "SELECT * FROM activity_statistics WHERE activity_id = ? AND date >= ? AND date <= ? ORDER BY date",
        )
        .bind(activity_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    /// Total attendance stored for an activity over a date range.
    pub async fn total_attendance(
        db: &Database,
        activity_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<i64> {
        let pool = db.pool()?;

        let row = sqlx::query(
            "SELECT COALESCE(SUM(total_attendance), 0) FROM activity_statistics WHERE activity_id = ? AND date >= ? AND date <= ?"
        )
        .bind(activity_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_one(pool)
        .await?;

        Ok(row.get(0))
    }

    pub async fn delete_for_activity(db: &Database, activity_id: i64) -> Result<u64> {
        let pool = db.pool()?;

        let result = sqlx::query("DELETE FROM activity_statistics WHERE activity_id = ?")
            .bind(activity_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
