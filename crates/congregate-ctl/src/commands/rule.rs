use anyhow::Result;
use chrono::NaiveDate;
use congregate_common::{RecurrenceRule, RecurrenceType, WeekdaySet};
use congregate_db::queries::{ActivityQueries, RecurrenceQueries};
use congregate_db::Database;

use super::print_json;

/// Rule fields as given on the command line.
pub struct RuleArgs {
    pub activity_id: i64,
    pub recurrence_type: RecurrenceType,
    pub interval: u32,
    pub days: WeekdaySet,
    pub day_of_month: Option<u32>,
    pub month_of_year: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<RuleArgs> for RecurrenceRule {
    fn from(args: RuleArgs) -> Self {
        RecurrenceRule {
            id: 0,
            activity_id: args.activity_id,
            recurrence_type: args.recurrence_type,
            interval: args.interval,
            days_of_week: args.days,
            day_of_month: args.day_of_month,
            month_of_year: args.month_of_year,
            start_date: args.start_date,
            end_date: args.end_date,
        }
    }
}

pub(crate) fn describe(rule: &RecurrenceRule) -> String {
    let every = if rule.interval == 1 {
        String::new()
    } else {
        format!(" x{}", rule.interval)
    };

    let on = match rule.recurrence_type {
        RecurrenceType::Daily => String::new(),
        RecurrenceType::Weekly => format!(" on {}", rule.days_of_week),
        RecurrenceType::Monthly => {
            format!(" on day {}", rule.day_of_month.map_or("-".to_string(), |d| d.to_string()))
        }
        RecurrenceType::Yearly => format!(
            " on {}/{}",
            rule.month_of_year.map_or("-".to_string(), |m| m.to_string()),
            rule.day_of_month.map_or("-".to_string(), |d| d.to_string())
        ),
    };

    let until = rule.end_date.map_or_else(|| "open".to_string(), |end| end.to_string());
    format!("{}{}{} from {} until {}", rule.recurrence_type, every, on, rule.start_date, until)
}

pub async fn list(db: &Database, activity_id: i64, json: bool) -> Result<()> {
    let activity = ActivityQueries::get(db, activity_id).await?;
    let rules = RecurrenceQueries::list_for_activity(db, activity_id).await?;

    if json {
        return print_json(&rules);
    }

    println!("Recurrence rules for {}:", activity.name);
    if rules.is_empty() {
        println!("  (none)");
    }
    for rule in &rules {
        println!("  [{}] {}", rule.id, describe(rule));
    }

    Ok(())
}

pub async fn add(db: &Database, args: RuleArgs, json: bool) -> Result<()> {
    let rule = RecurrenceQueries::create(db, &RecurrenceRule::from(args)).await?;

    if json {
        return print_json(&rule);
    }

    println!("Added rule {}: {}", rule.id, describe(&rule));
    Ok(())
}

pub async fn delete(db: &Database, rule_id: i64) -> Result<()> {
    RecurrenceQueries::delete(db, rule_id).await?;
    println!("Deleted rule {}", rule_id);
    Ok(())
}
