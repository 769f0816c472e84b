use anyhow::Result;
use congregate_db::queries::{AttendanceQueries, UserQueries};
use congregate_db::{Database, NewUser};

use super::print_json;

pub async fn list(db: &Database, json: bool) -> Result<()> {
    let users = UserQueries::list_active(db).await?;

    if json {
        return print_json(&users);
    }

    if users.is_empty() {
        println!("No active members");
        return Ok(());
    }

    for user in &users {
        println!("{:<6} {:<20} {}", user.id, user.username, user.display_name);
    }

    Ok(())
}

pub async fn add(
    db: &Database,
    username: String,
    display_name: String,
    email: Option<String>,
    json: bool,
) -> Result<()> {
    let user = UserQueries::create(db, NewUser { username, display_name, email }).await?;

    if json {
        return print_json(&user);
    }

    println!("Added member {} ({})", user.username, user.id);
    Ok(())
}

pub async fn deactivate(db: &Database, username: &str) -> Result<()> {
    let user = UserQueries::get_by_username(db, username).await?;
    UserQueries::set_active(db, user.id, false).await?;
    println!("Deactivated {}", username);
    Ok(())
}

pub async fn history(db: &Database, username: &str, limit: i64, json: bool) -> Result<()> {
    let user = UserQueries::get_by_username(db, username).await?;
    let records = AttendanceQueries::list_for_user(db, user.id, limit).await?;

    if json {
        return print_json(&records);
    }

    println!("Attendance of {}:", user.display_name);
    for record in &records {
        println!("  {} activity {:<6} {}", record.date, record.activity_id, record.status_name);
    }

    Ok(())
}
