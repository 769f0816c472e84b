use anyhow::{Context, Result};
use congregate_db::queries::{OfficeQueries, UserQueries};
use congregate_db::{Database, DbError};
use serde_json::json;

use super::print_json;

pub async fn list(db: &Database, json: bool) -> Result<()> {
    let offices = OfficeQueries::list_offices(db).await?;

    if json {
        return print_json(&offices);
    }

    for office in &offices {
        println!("{:<20} {}", office.name, office.description.as_deref().unwrap_or(""));
    }

    Ok(())
}

pub async fn create(db: &Database, name: &str, description: Option<&str>) -> Result<()> {
    let office = OfficeQueries::create_office(db, name, description).await?;
    println!("Created office {} ({})", office.name, office.id);
    Ok(())
}

/// Grant `permission` to `office`, creating the permission on first use.
pub async fn grant(db: &Database, office: &str, permission: &str) -> Result<()> {
    let office = OfficeQueries::get_office(db, office).await?;
    let permission_id = match OfficeQueries::create_permission(db, permission, None).await {
        Ok(created) => created.id,
        Err(DbError::Duplicate(_)) => OfficeQueries::find_permission(db, permission).await?.id,
        Err(e) => return Err(e).context("Failed to create permission"),
    };

    OfficeQueries::grant_permission(db, office.id, permission_id).await?;
    println!("Granted {} to {}", permission, office.name);
    Ok(())
}

pub async fn revoke(db: &Database, office: &str, permission: &str) -> Result<()> {
    let office = OfficeQueries::get_office(db, office).await?;
    let permission = OfficeQueries::find_permission(db, permission).await?;

    OfficeQueries::revoke_permission(db, office.id, permission.id).await?;
    println!("Revoked {} from {}", permission.name, office.name);
    Ok(())
}

pub async fn assign(db: &Database, username: &str, office: &str) -> Result<()> {
    let user = UserQueries::get_by_username(db, username).await?;
    let office = OfficeQueries::get_office(db, office).await?;

    OfficeQueries::assign_user(db, user.id, office.id).await?;
    println!("{} now holds the office of {}", user.display_name, office.name);
    Ok(())
}

pub async fn remove(db: &Database, username: &str, office: &str) -> Result<()> {
    let user = UserQueries::get_by_username(db, username).await?;
    let office = OfficeQueries::get_office(db, office).await?;

    OfficeQueries::remove_user(db, user.id, office.id).await?;
    println!("{} no longer holds the office of {}", user.display_name, office.name);
    Ok(())
}

pub async fn show(db: &Database, username: &str, json: bool) -> Result<()> {
    let user = UserQueries::get_by_username(db, username).await?;
    let roles = OfficeQueries::roles_for_user(db, user.id).await?;
    let permissions = OfficeQueries::permissions_for_user(db, user.id).await?;

    if json {
        return print_json(&json!({ "user": user, "roles": roles, "permissions": permissions }));
    }

    println!("{} ({})", user.display_name, user.username);
    println!("Offices:");
    for role in &roles {
        println!("  {} since {}", role.office_name, role.assigned_at.date_naive());
    }
    println!("Permissions:");
    for permission in &permissions {
        println!("  {}", permission.name);
    }

    Ok(())
}
