use anyhow::Result;
use chrono::NaiveDate;
use congregate_common::calendar::weekday_of;
use congregate_db::AttendanceStore;
use serde_json::json;

use super::print_json;
use crate::service::StatisticsService;

pub async fn expand<S: AttendanceStore>(
    service: &StatisticsService<S>,
    activity_id: i64,
    from: NaiveDate,
    to: NaiveDate,
    json: bool,
) -> Result<()> {
    let dates = service.occurrences(activity_id, from, to).await?;

    if json {
        return print_json(&dates);
    }

    println!("{} occurrence(s) between {} and {}", dates.len(), from, to);
    for date in &dates {
        println!("  {} {}", weekday_of(*date), date);
    }

    Ok(())
}

pub async fn next<S: AttendanceStore>(
    service: &StatisticsService<S>,
    activity_id: i64,
    from: NaiveDate,
    json: bool,
) -> Result<()> {
    let next = service.next_occurrence(activity_id, from).await?;

    if json {
        return print_json(&json!({ "activityId": activity_id, "from": from, "next": next }));
    }

    match next {
        Some(date) => println!("Next occurrence: {} {}", weekday_of(date), date),
        None => println!("No occurrence on or after {}", from),
    }

    Ok(())
}
