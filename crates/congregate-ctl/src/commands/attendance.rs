use anyhow::{Context, Result};
use chrono::NaiveDate;
use congregate_db::queries::{AttendanceQueries, UserQueries};
use congregate_db::{Database, NewAttendanceRecord};

use super::print_json;

pub async fn mark(
    db: &Database,
    activity_id: i64,
    username: &str,
    date: NaiveDate,
    status: String,
    note: Option<String>,
    json: bool,
) -> Result<()> {
    let user = UserQueries::get_by_username(db, username).await?;
    let record = AttendanceQueries::record(
        db,
        NewAttendanceRecord { activity_id, user_id: user.id, date, status, note },
    )
    .await
    .with_context(|| format!("Failed to record attendance of {} on {}", username, date))?;

    if json {
        return print_json(&record);
    }

    println!(
        "Marked {} as {} for activity {} on {}",
        user.display_name, record.status_name, activity_id, date
    );
    if !record.is_counted_as_attended {
        println!("(status '{}' does not count toward attendance)", record.status_name);
    }

    Ok(())
}
