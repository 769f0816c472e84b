use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::DbRecurrence;
use chrono::Utc;
use congregate_common::{RecurrenceRule, RecurrenceType};
use tracing::debug;

pub struct RecurrenceQueries;

/// Values persisted for a rule. Columns that do not apply to the rule's
/// type are stored empty so a later type change cannot resurrect them.
struct RuleColumns {
    day_of_week: String,
    day_of_month: Option<i64>,
    month_of_year: Option<i64>,
}

impl RuleColumns {
    fn of(rule: &RecurrenceRule) -> Self {
        let (day_of_week, day_of_month, month_of_year) = match rule.recurrence_type {
            RecurrenceType::Daily => (String::new(), None, None),
            RecurrenceType::Weekly => (rule.days_of_week.to_string(), None, None),
            RecurrenceType::Monthly => (String::new(), rule.day_of_month, None),
            RecurrenceType::Yearly => (String::new(), rule.day_of_month, rule.month_of_year),
        };

        Self {
            day_of_week,
            day_of_month: day_of_month.map(i64::from),
            month_of_year: month_of_year.map(i64::from),
        }
    }
}

impl RecurrenceQueries {
    /// Validate and insert a rule; the returned rule carries its new id.
    pub async fn create(db: &Database, rule: &RecurrenceRule) -> Result<RecurrenceRule> {
        rule.validate()?;
        let pool = db.pool()?;
        let columns = RuleColumns::of(rule);

        let result = sqlx::query(
            r#"
            INSERT INTO activity_recurrence (
                activity_id, recurrence_type, "interval", day_of_week,
                day_of_month, month_of_year, start_date, end_date, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(rule.activity_id)
        .bind(rule.recurrence_type.as_str())
        .bind(i64::from(rule.interval))
        .bind(&columns.day_of_week)
        .bind(columns.day_of_month)
        .bind(columns.month_of_year)
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, activity_id = rule.activity_id, "Created {} recurrence", rule.recurrence_type);

        Self::get(db, id).await
    }

    pub async fn get(db: &Database, id: i64) -> Result<RecurrenceRule> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbRecurrence>("SELECT * FROM activity_recurrence WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Recurrence {} not found", id)))?
            .try_into()
    }

    pub async fn list_for_activity(db: &Database, activity_id: i64) -> Result<Vec<RecurrenceRule>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbRecurrence>(
            "SELECT * FROM activity_recurrence WHERE activity_id = ? ORDER BY start_date, id",
        )
        .bind(activity_id)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(RecurrenceRule::try_from)
        .collect()
    }

    /// Replace every column of an existing rule.
    pub async fn update(db: &Database, rule: &RecurrenceRule) -> Result<RecurrenceRule> {
        rule.validate()?;
        let pool = db.pool()?;
        let columns = RuleColumns::of(rule);

        let result = sqlx::query(
            r#"
            UPDATE activity_recurrence SET
                activity_id = ?, recurrence_type = ?, "interval" = ?, day_of_week = ?,
                day_of_month = ?, month_of_year = ?, start_date = ?, end_date = ?
            WHERE id = ?
            "#,
        )
        .bind(rule.activity_id)
        .bind(rule.recurrence_type.as_str())
        .bind(i64::from(rule.interval))
        .bind(&columns.day_of_week)
        .bind(columns.day_of_month)
        .bind(columns.month_of_year)
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(rule.id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Recurrence {} not found", rule.id)));
        }

        Self::get(db, rule.id).await
    }

    pub async fn delete(db: &Database, id: i64) -> Result<()> {
        let pool = db.pool()?;

        let result =
            sqlx::query("DELETE FROM activity_recurrence WHERE id = ?").bind(id).execute(pool).await?;

        if result.rows_affected() == 0 {
            Err(DbError::NotFound(format!("Recurrence {} not found", id)))
        } else {
            Ok(())
        }
    }
}
