use anyhow::Result;
use congregate_common::AttendanceStatus;
use congregate_db::queries::AttendanceStatusQueries;
use congregate_db::Database;

use super::print_json;

pub async fn list(db: &Database, json: bool) -> Result<()> {
    let statuses = AttendanceStatusQueries::list(db).await?;

    if json {
        return print_json(&statuses);
    }

    println!("{:<16} {:<8} Description", "Status", "Counted");
    for status in &statuses {
        println!(
            "{:<16} {:<8} {}",
            status.name,
            if status.is_counted_as_attended { "yes" } else { "no" },
            status.description.as_deref().unwrap_or("")
        );
    }

    Ok(())
}

pub async fn add(db: &Database, name: String, counted: bool, description: Option<String>) -> Result<()> {
    let status = AttendanceStatus { name, description, is_counted_as_attended: counted };
    let created = AttendanceStatusQueries::create(db, &status).await?;
    println!("Added attendance status {}", created.name);
    Ok(())
}

pub async fn set_counted(db: &Database, name: &str, counted: bool) -> Result<()> {
    AttendanceStatusQueries::set_counted(db, name, counted).await?;
    println!(
        "Status {} {} toward attendance; recompute statistics to apply",
        name,
        if counted { "now counts" } else { "no longer counts" }
    );
    Ok(())
}

pub async fn delete(db: &Database, name: &str) -> Result<()> {
    AttendanceStatusQueries::delete(db, name).await?;
    println!("Deleted attendance status {}", name);
    Ok(())
}
