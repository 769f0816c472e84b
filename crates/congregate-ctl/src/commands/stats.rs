use anyhow::Result;
use chrono::NaiveDate;
use congregate_common::{ActivityStatistics, StatisticsBucket, WorshipType};
use congregate_db::queries::StatisticsQueries;
use congregate_db::{AttendanceStore, Database};

use super::print_json;
use crate::service::StatisticsService;

fn print_rows(rows: &[ActivityStatistics]) {
    println!("{:<12} {:>10} {:>11} {:>9}", "Period", "Instances", "Attendance", "Average");
    for row in rows {
        println!(
            "{:<12} {:>10} {:>11} {:>9.2}",
            row.date.to_string(),
            row.total_instances,
            row.total_attendance,
            row.average_attendance
        );
    }
}

pub async fn recompute<S: AttendanceStore>(
    service: &StatisticsService<S>,
    activity_id: i64,
    from: NaiveDate,
    to: NaiveDate,
    bucket: Option<StatisticsBucket>,
    json: bool,
) -> Result<()> {
    let rows = service.recompute(activity_id, from, to, bucket).await?;

    if json {
        return print_json(&rows);
    }

    println!("Recomputed {} row(s) for activity {} ({} to {})", rows.len(), activity_id, from, to);
    print_rows(&rows);
    Ok(())
}

pub async fn show(db: &Database, activity_id: i64, from: NaiveDate, to: NaiveDate, json: bool) -> Result<()> {
    let rows: Vec<ActivityStatistics> = StatisticsQueries::list_for_activity_range(db, activity_id, from, to)
        .await?
        .into_iter()
        .map(ActivityStatistics::from)
        .collect();

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No stored statistics for activity {} between {} and {}", activity_id, from, to);
        return Ok(());
    }

    print_rows(&rows);
    let total = StatisticsQueries::total_attendance(db, activity_id, from, to).await?;
    println!("Total attendance: {}", total);
    Ok(())
}

pub async fn worship<S: AttendanceStore>(
    service: &StatisticsService<S>,
    worship_type: WorshipType,
    from: NaiveDate,
    to: NaiveDate,
    json: bool,
) -> Result<()> {
    let summary = service.worship_summary(worship_type, from, to).await?;

    if json {
        return print_json(&summary);
    }

    println!("{} from {} to {}", worship_type, from, to);
    println!("{:<8} {:>10} {:>11} {:>9}", "Activity", "Instances", "Attendance", "Average");
    for row in &summary.activities {
        println!(
            "{:<8} {:>10} {:>11} {:>9.2}",
            row.activity_id, row.total_instances, row.total_attendance, row.average_attendance
        );
    }
    println!(
        "{:<8} {:>10} {:>11} {:>9.2}",
        "total", summary.total_instances, summary.total_attendance, summary.average_attendance
    );
    Ok(())
}
