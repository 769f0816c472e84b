use anyhow::Result;
use congregate_common::WorshipType;
use congregate_db::queries::ActivityQueries;
use congregate_db::{Database, NewActivity};

use super::print_json;

pub async fn list(db: &Database, worship_type: Option<WorshipType>, json: bool) -> Result<()> {
    let activities = match worship_type {
        Some(kind) => ActivityQueries::list_by_worship_type(db, kind).await?,
        None => ActivityQueries::list(db).await?,
    };

    if json {
        return print_json(&activities);
    }

    if activities.is_empty() {
        println!("No activities found");
        return Ok(());
    }

    println!("{:<6} {:<30} {:<18} Location", "ID", "Name", "Worship type");
    for activity in &activities {
        println!(
            "{:<6} {:<30} {:<18} {}",
            activity.id,
            activity.name,
            activity.worship_type.map(|w| w.to_string()).unwrap_or_else(|| "-".to_string()),
            activity.location.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

pub async fn create(
    db: &Database,
    name: String,
    worship_type: Option<WorshipType>,
    description: Option<String>,
    location: Option<String>,
    json: bool,
) -> Result<()> {
    let activity =
        ActivityQueries::create(db, NewActivity { name, description, worship_type, location }).await?;

    if json {
        return print_json(&activity);
    }

    println!("Created activity {} ({})", activity.name, activity.id);
    Ok(())
}

pub async fn delete(db: &Database, activity_id: i64) -> Result<()> {
    ActivityQueries::delete(db, activity_id).await?;
    println!("Deleted activity {} with its rules, attendance and statistics", activity_id);
    Ok(())
}
