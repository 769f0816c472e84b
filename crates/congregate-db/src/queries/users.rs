use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::{DbUser, NewUser};
use chrono::Utc;

pub struct UserQueries;

impl UserQueries {
    pub async fn create(db: &Database, user: NewUser) -> Result<DbUser> {
        let pool = db.pool()?;

        let result = sqlx::query(
            "INSERT INTO users (username, display_name, email, active, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.email)
        .bind(true)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| DbError::from_write(e, || format!("User '{}' already exists", user.username)))?;

        Self::get(db, result.last_insert_rowid()).await
    }

    pub async fn get(db: &Database, id: i64) -> Result<DbUser> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("User {} not found", id)))
    }

    pub async fn get_by_username(db: &Database, username: &str) -> Result<DbUser> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("User '{}' not found", username)))
    }

    pub async fn list_active(db: &Database) -> Result<Vec<DbUser>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbUser>("SELECT * FROM users WHERE active = 1 ORDER BY username")
            .fetch_all(pool)
            .await
            .map_err(DbError::Sqlx)
    }

    pub async fn set_active(db: &Database, id: i64, active: bool) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query("UPDATE users SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(DbError::NotFound(format!("User {} not found", id)))
        } else {
            Ok(())
        }
    }
}
