// Attendance Statistics Aggregator
//
// Joins the expected occurrences of an activity with the attendance marks
// recorded against it. Every function here is a pure function of its
// inputs; persisting the result (by upsert) is the caller's job.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::calendar;
use crate::error::{Error, Result};
use crate::expander;
use crate::recurrence::RecurrenceRule;
use crate::types::{ActivityStatistics, AttendanceRecord, StatisticsBucket};

/// Statistics for one rule over `[period_start, period_end]`, keyed by
/// `(activity_id, period_start)`.
pub fn aggregate(
    activity_id: i64,
    rule: &RecurrenceRule,
    records: &[AttendanceRecord],
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<ActivityStatistics> {
    aggregate_rules(activity_id, std::slice::from_ref(rule), records, period_start, period_end)
}

/// Like [`aggregate`], for an activity with several rules. A date produced
/// by more than one rule is a single instance.
pub fn aggregate_rules(
    activity_id: i64,
    rules: &[RecurrenceRule],
    records: &[AttendanceRecord],
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> Result<ActivityStatistics> {
    let mut rows = aggregate_buckets(
        activity_id,
        rules,
        records,
        period_start,
        period_end,
        StatisticsBucket::Range,
    )?;

    // A Range bucket over a valid window always yields exactly one row.
    Ok(rows.pop().unwrap_or_else(|| ActivityStatistics::new(activity_id, period_start, 0, 0)))
}

/// Split `[from, to]` into buckets and produce one statistics row per bucket.
pub fn aggregate_buckets(
    activity_id: i64,
    rules: &[RecurrenceRule],
    records: &[AttendanceRecord],
    from: NaiveDate,
    to: NaiveDate,
    bucket: StatisticsBucket,
) -> Result<Vec<ActivityStatistics>> {
    if from > to {
        return Err(Error::InvalidWindow { start: from, end: to });
    }

    let occurrences: BTreeSet<NaiveDate> = expander::expand_all(rules, from, to)?.into_iter().collect();

    let mut attended: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for record in records {
        if record.activity_id == activity_id
            && record.counts_as_attended()
            && occurrences.contains(&record.date)
        {
            *attended.entry(record.date).or_default() += 1;
        }
    }

    let rows: Vec<ActivityStatistics> = bucket_ranges(from, to, bucket)?
        .into_iter()
        .map(|(start, end)| {
            let instances = occurrences.range(start..=end).count() as i64;
            let attendance = attended.range(start..=end).map(|(_, count)| count).sum();
            ActivityStatistics::new(activity_id, start, instances, attendance)
        })
        .collect();

    debug!(
        activity_id,
        rules = rules.len(),
        buckets = rows.len(),
        instances = occurrences.len(),
        "Aggregated attendance statistics"
    );

    Ok(rows)
}

/// Consecutive inclusive ranges covering `[from, to]` exactly. Weekly
/// buckets are Monday-aligned and monthly buckets follow calendar months;
/// the first and last bucket are clipped to the range.
pub fn bucket_ranges(
    from: NaiveDate,
    to: NaiveDate,
    bucket: StatisticsBucket,
) -> Result<Vec<(NaiveDate, NaiveDate)>> {
    if from > to {
        return Err(Error::InvalidWindow { start: from, end: to });
    }

    let mut ranges = Vec::new();
    let mut start = from;
    loop {
        let natural_end = match bucket {
            StatisticsBucket::Daily => start,
            StatisticsBucket::Weekly => calendar::add_days(calendar::week_start(start)?, 6)?,
            StatisticsBucket::Monthly => {
                calendar::add_days(calendar::add_months(calendar::month_start(start), 1)?, -1)?
            }
            StatisticsBucket::Range => to,
        };
        let end = natural_end.min(to);
        ranges.push((start, end));

        if end >= to {
            break;
        }
        start = calendar::add_days(end, 1)?;
    }

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::WeekdaySet;
    use crate::types::AttendanceStatus;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sundays() -> RecurrenceRule {
        RecurrenceRule::weekly(1, 1, "SUN".parse::<WeekdaySet>().unwrap(), d(2024, 1, 1))
    }

    fn mark(activity_id: i64, user_id: i64, date: NaiveDate, status: &str, counted: bool) -> AttendanceRecord {
        AttendanceRecord {
            activity_id,
            user_id,
            date,
            status: AttendanceStatus::new(status, counted),
        }
    }

    #[test]
    fn test_aggregate_counts_only_attended() {
        let records = vec![
            mark(1, 1, d(2024, 1, 7), "present", true),
            mark(1, 2, d(2024, 1, 7), "late", true),
            mark(1, 3, d(2024, 1, 7), "absent", false),
            mark(1, 1, d(2024, 1, 14), "present", true),
            mark(1, 2, d(2024, 1, 14), "excused", false),
        ];

        let stats = aggregate(1, &sundays(), &records, d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert_eq!(stats.activity_id, 1);
        assert_eq!(stats.date, d(2024, 1, 1));
        assert_eq!(stats.total_instances, 4);
        assert_eq!(stats.total_attendance, 3);
        assert_eq!(stats.average_attendance, 0.75);
    }

    #[test]
    fn test_aggregate_ignores_off_schedule_and_foreign_records() {
        let records = vec![
            // Monday: not an occurrence of the Sunday rule
            mark(1, 1, d(2024, 1, 8), "present", true),
            // another activity
            mark(2, 1, d(2024, 1, 7), "present", true),
            // outside the period
            mark(1, 1, d(2024, 2, 4), "present", true),
        ];

        let stats = aggregate(1, &sundays(), &records, d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert_eq!(stats.total_instances, 4);
        assert_eq!(stats.total_attendance, 0);
    }

    #[test]
    fn test_aggregate_no_instances() {
        let rule = sundays().until(d(2024, 1, 2));
        let stats = aggregate(1, &rule, &[], d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        assert_eq!(stats.total_instances, 0);
        assert_eq!(stats.total_attendance, 0);
        assert_eq!(stats.average_attendance, 0.0);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let records = vec![
            mark(1, 1, d(2024, 1, 7), "present", true),
            mark(1, 2, d(2024, 1, 21), "present", true),
        ];
        let first = aggregate(1, &sundays(), &records, d(2024, 1, 1), d(2024, 3, 31)).unwrap();
        let second = aggregate(1, &sundays(), &records, d(2024, 1, 1), d(2024, 3, 31)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.average_attendance.to_bits(), second.average_attendance.to_bits());
    }

    #[test]
    fn test_aggregate_propagates_rule_errors() {
        let rule = RecurrenceRule::monthly(1, 0, 1, d(2024, 1, 1));
        let err = aggregate(1, &rule, &[], d(2024, 1, 1), d(2024, 1, 31)).unwrap_err();
        assert_eq!(err.rule_field(), Some("interval"));

        let err = aggregate(1, &sundays(), &[], d(2024, 2, 1), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidWindow { .. }));
    }

    #[test]
    fn test_aggregate_rules_merges_overlap() {
        let wednesdays =
            RecurrenceRule::weekly(1, 1, "WED,SUN".parse::<WeekdaySet>().unwrap(), d(2024, 1, 1));
        let stats =
            aggregate_rules(1, &[sundays(), wednesdays], &[], d(2024, 1, 1), d(2024, 1, 31)).unwrap();
        // 5 Wednesdays + 4 Sundays, Sundays counted once
        assert_eq!(stats.total_instances, 9);
    }

    #[test]
    fn test_monthly_buckets() {
        let records = vec![
            mark(1, 1, d(2024, 1, 7), "present", true),
            mark(1, 1, d(2024, 2, 4), "present", true),
            mark(1, 2, d(2024, 2, 4), "present", true),
        ];
        let rows = aggregate_buckets(
            1,
            &[sundays()],
            &records,
            d(2024, 1, 15),
            d(2024, 3, 10),
            StatisticsBucket::Monthly,
        )
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, d(2024, 1, 15));
        assert_eq!(rows[0].total_instances, 2);
        assert_eq!(rows[0].total_attendance, 0);
        assert_eq!(rows[1].date, d(2024, 2, 1));
        assert_eq!(rows[1].total_instances, 4);
        assert_eq!(rows[1].total_attendance, 2);
        assert_eq!(rows[2].date, d(2024, 3, 1));
        assert_eq!(rows[2].total_instances, 2);
    }

    #[test]
    fn test_bucket_ranges_partition() {
        let from = d(2024, 1, 3);
        let to = d(2024, 1, 20);
        let weeks = bucket_ranges(from, to, StatisticsBucket::Weekly).unwrap();
        assert_eq!(
            weeks,
            vec![
                (d(2024, 1, 3), d(2024, 1, 7)),
                (d(2024, 1, 8), d(2024, 1, 14)),
                (d(2024, 1, 15), d(2024, 1, 20)),
            ]
        );

        let days = bucket_ranges(from, to, StatisticsBucket::Daily).unwrap();
        assert_eq!(days.len(), 18);
        assert!(days.iter().all(|(start, end)| start == end));

        let months = bucket_ranges(d(2024, 1, 31), d(2024, 3, 1), StatisticsBucket::Monthly).unwrap();
        assert_eq!(
            months,
            vec![
                (d(2024, 1, 31), d(2024, 1, 31)),
                (d(2024, 2, 1), d(2024, 2, 29)),
                (d(2024, 3, 1), d(2024, 3, 1)),
            ]
        );

        assert_eq!(bucket_ranges(from, to, StatisticsBucket::Range).unwrap(), vec![(from, to)]);
        assert!(bucket_ranges(to, from, StatisticsBucket::Daily).is_err());
    }
}
