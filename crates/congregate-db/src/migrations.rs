use crate::connection::Database;
use crate::error::Result;
use sqlx::migrate::Migrator;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

impl Database {
    pub async fn run_migrations(&self) -> Result<()> {
        let pool = self.pool()?;

        info!("Running database migrations");
        MIGRATOR.run(pool).await?;
        info!("Database migrations completed successfully");

        Ok(())
    }

    /// Highest applied migration version.
    pub async fn verify_migrations(&self) -> Result<i64> {
        let pool = self.pool()?;

        let version: i64 =
            sqlx::query_scalar("SELECT MAX(version) FROM _sqlx_migrations").fetch_one(pool).await?;

        info!("Current migration version: {}", version);

        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::DatabaseConfig;
    use tempfile::tempdir;

    async fn migrated_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let config = DatabaseConfig { path: db_path.to_str().unwrap().to_string(), ..Default::default() };

        let db = Database::new(config).await.unwrap();
        db.run_migrations().await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let (db, _dir) = migrated_db().await;

        let pool = db.pool().unwrap();
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations'"
        )
        .fetch_all(pool)
        .await
        .unwrap();

        for expected in [
            "users",
            "activities",
            "activity_recurrence",
            "attendance_status",
            "attendance_records",
            "activity_statistics",
            "church_offices",
            "permissions",
            "office_permissions",
            "user_roles",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_seeded_attendance_statuses() {
        let (db, _dir) = migrated_db().await;

        let counted: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM attendance_status WHERE is_counted_as_attended = 1 ORDER BY name",
        )
        .fetch_all(db.pool().unwrap())
        .await
        .unwrap();

        assert_eq!(counted, vec!["late".to_string(), "present".to_string()]);
    }

    #[tokio::test]
    async fn test_verify_migrations() {
        let (db, _dir) = migrated_db().await;
        let version = db.verify_migrations().await.unwrap();
        assert_eq!(version, 20240102000000);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let (db, _dir) = migrated_db().await;
        db.run_migrations().await.unwrap();
    }
}
