use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::{DbActivity, NewActivity};
use chrono::Utc;
use congregate_common::{Activity, WorshipType};

pub struct ActivityQueries;

impl ActivityQueries {
    pub async fn create(db: &Database, activity: NewActivity) -> Result<Activity> {
        let pool = db.pool()?;

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO activities (name, description, worship_type, location, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&activity.name)
        .bind(&activity.description)
        .bind(activity.worship_type.map(WorshipType::as_str))
        .bind(&activity.location)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::get(db, result.last_insert_rowid()).await
    }

    pub async fn get(db: &Database, id: i64) -> Result<Activity> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbActivity>("SELECT * FROM activities WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Activity {} not found", id)))?
            .try_into()
    }

    pub async fn list(db: &Database) -> Result<Vec<Activity>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbActivity>("SELECT * FROM activities ORDER BY name, id")
            .fetch_all(pool)
            .await?
            .into_iter()
            .map(Activity::try_from)
            .collect()
    }

    pub async fn list_by_worship_type(
        db: &Database,
        worship_type: WorshipType,
    ) -> Result<Vec<Activity>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbActivity>(
            "SELECT * FROM activities WHERE worship_type = ? ORDER BY name, id",
        )
        .bind(worship_type.as_str())
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Activity::try_from)
        .collect()
    }

    pub async fn update(db: &Database, id: i64, activity: NewActivity) -> Result<Activity> {
        let pool = db.pool()?;

        let result = sqlx::query(
            r#"
            UPDATE activities SET
                name = ?, description = ?, worship_type = ?, location = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&activity.name)
        .bind(&activity.description)
        .bind(activity.worship_type.map(WorshipType::as_str))
        .bind(&activity.location)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Activity {} not found", id)));
        }

        Self::get(db, id).await
    }

    /// Delete an activity together with its rules, attendance and statistics.
    pub async fn delete(db: &Database, id: i64) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query("DELETE FROM activities WHERE id = ?").bind(id).execute(pool).await?;

        if result.rows_affected() == 0 {
            Err(DbError::NotFound(format!("Activity {} not found", id)))
        } else {
            Ok(())
        }
    }
}
