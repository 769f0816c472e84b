use crate::connection::Database;
use crate::error::{DbError, Result};
use crate::models::{DbChurchOffice, DbPermission, DbUserRole};
use chrono::Utc;

/// Church offices, the permissions they grant and the users holding them.
pub struct OfficeQueries;

impl OfficeQueries {
    pub async fn create_office(
        db: &Database,
        name: &str,
        description: Option<&str>,
    ) -> Result<DbChurchOffice> {
        let pool = db.pool()?;

        sqlx::query("INSERT INTO church_offices (name, description, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(description)
            .bind(Utc::now())
            .execute(pool)
            .await
            .map_err(|e| DbError::from_write(e, || format!("Office '{}' already exists", name)))?;

        Self::get_office(db, name).await
    }

    pub async fn get_office(db: &Database, name: &str) -> Result<DbChurchOffice> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbChurchOffice>("SELECT * FROM church_offices WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Office '{}' not found", name)))
    }

    pub async fn list_offices(db: &Database) -> Result<Vec<DbChurchOffice>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbChurchOffice>("SELECT * FROM church_offices ORDER BY name")
            .fetch_all(pool)
            .await
            .map_err(DbError::Sqlx)
    }

    pub async fn create_permission(
        db: &Database,
        name: &str,
        description: Option<&str>,
    ) -> Result<DbPermission> {
        let pool = db.pool()?;

        sqlx::query("INSERT INTO permissions (name, description) VALUES (?, ?)")
            .bind(name)
            .bind(description)
            .execute(pool)
            .await
            .map_err(|e| DbError::from_write(e, || format!("Permission '{}' already exists", name)))?;

        Self::find_permission(db, name).await
    }

    pub async fn find_permission(db: &Database, name: &str) -> Result<DbPermission> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbPermission>("SELECT * FROM permissions WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Permission '{}' not found", name)))
    }

    /// Grant a permission to an office. Granting twice is a no-op.
    pub async fn grant_permission(db: &Database, office_id: i64, permission_id: i64) -> Result<()> {
        let pool = db.pool()?;

        sqlx::query(
            "INSERT OR IGNORE INTO office_permissions (office_id, permission_id) VALUES (?, ?)",
        )
        .bind(office_id)
        .bind(permission_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn revoke_permission(db: &Database, office_id: i64, permission_id: i64) -> Result<()> {
        let pool = db.pool()?;

        sqlx::query("DELETE FROM office_permissions WHERE office_id = ? AND permission_id = ?")
            .bind(office_id)
            .bind(permission_id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Link a user to an office. Assigning twice keeps the original date.
    pub async fn assign_user(db: &Database, user_id: i64, office_id: i64) -> Result<()> {
        let pool = db.pool()?;

        sqlx::query(
            "INSERT OR IGNORE INTO user_roles (user_id, office_id, assigned_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(office_id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn remove_user(db: &Database, user_id: i64, office_id: i64) -> Result<()> {
        let pool = db.pool()?;

        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND office_id = ?")
            .bind(user_id)
            .bind(office_id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(DbError::NotFound(format!("User {} does not hold office {}", user_id, office_id)))
        } else {
            Ok(())
        }
    }

    pub async fn roles_for_user(db: &Database, user_id: i64) -> Result<Vec<DbUserRole>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbUserRole>(
            r#"
            SELECT ur.user_id, ur.office_id, o.name AS office_name, ur.assigned_at
            FROM user_roles ur
            JOIN church_offices o ON o.id = ur.office_id
            WHERE ur.user_id = ?
            ORDER BY o.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    /// Every permission a user holds through any of their offices.
    pub async fn permissions_for_user(db: &Database, user_id: i64) -> Result<Vec<DbPermission>> {
        let pool = db.pool()?;

        sqlx::query_as::<_, DbPermission>(
            r#"
            SELECT DISTINCT p.id, p.name, p.description
            FROM permissions p
            JOIN office_permissions op ON op.permission_id = p.id
            JOIN user_roles ur ON ur.office_id = op.office_id
            WHERE ur.user_id = ?
            ORDER BY p.name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(DbError::Sqlx)
    }

    pub async fn user_has_permission(db: &Database, user_id: i64, permission: &str) -> Result<bool> {
        let pool = db.pool()?;

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM permissions p
            JOIN office_permissions op ON op.permission_id = p.id
            JOIN user_roles ur ON ur.office_id = op.office_id
            WHERE ur.user_id = ? AND p.name = ?
            "#,
        )
        .bind(user_id)
        .bind(permission)
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }
}
