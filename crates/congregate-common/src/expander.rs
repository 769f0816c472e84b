// Occurrence Expander
//
// Turns a recurrence rule plus a caller-supplied window into the ascending
// list of calendar dates on which the activity takes place. The window
// always bounds the output, so expansion terminates even for rules without
// an end date.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use tracing::trace;

use crate::calendar::{self, DayOfWeek};
use crate::error::{Error, Result};
use crate::recurrence::{RecurrenceRule, RecurrenceType};

/// A validated rule clipped to a window.
///
/// The expansion itself holds no iteration state: every call to
/// [`Expansion::iter`] starts again from the first occurrence.
#[derive(Debug, Clone)]
pub struct Expansion {
    rule: RecurrenceRule,
    lower: NaiveDate,
    upper: NaiveDate,
    anchor: NaiveDate,
    days: Vec<DayOfWeek>,
}

/// Expand `rule` over `[window_start, window_end]`, both inclusive.
pub fn expand(
    rule: &RecurrenceRule,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<Expansion> {
    rule.validate()?;

    if window_start > window_end {
        return Err(Error::InvalidWindow { start: window_start, end: window_end });
    }

    let lower = window_start.max(rule.start_date);
    let upper = rule.end_date.map_or(window_end, |end| end.min(window_end));

    let (anchor, days) = match rule.recurrence_type {
        RecurrenceType::Weekly => {
            (calendar::week_start(rule.start_date)?, rule.days_of_week.iter().collect())
        }
        _ => (rule.start_date, Vec::new()),
    };

    trace!(
        rule_id = rule.id,
        activity_id = rule.activity_id,
        %lower,
        %upper,
        "Expanding {} recurrence",
        rule.recurrence_type
    );

    Ok(Expansion { rule: rule.clone(), lower, upper, anchor, days })
}

/// Sorted, de-duplicated occurrences of several rules over one window.
pub fn expand_all<'a, I>(rules: I, window_start: NaiveDate, window_end: NaiveDate) -> Result<Vec<NaiveDate>>
where
    I: IntoIterator<Item = &'a RecurrenceRule>,
{
    let mut dates = BTreeSet::new();
    for rule in rules {
        dates.extend(expand(rule, window_start, window_end)?.iter());
    }
    Ok(dates.into_iter().collect())
}

/// First occurrence of `rule` on or after `from`, if the rule has one.
pub fn next_occurrence(rule: &RecurrenceRule, from: NaiveDate) -> Result<Option<NaiveDate>> {
    Ok(expand(rule, from, NaiveDate::MAX)?.iter().next())
}

impl Expansion {
    pub fn rule(&self) -> &RecurrenceRule {
        &self.rule
    }

    /// Effective first day: the later of the rule start and the window start.
    pub fn lower(&self) -> NaiveDate {
        self.lower
    }

    /// Effective last day: the earlier of the rule end and the window end.
    pub fn upper(&self) -> NaiveDate {
        self.upper
    }

    pub fn iter(&self) -> Occurrences<'_> {
        let empty = self.lower > self.upper;
        let step = if empty { 0 } else { self.first_step() };
        Occurrences { expansion: self, step, slot: 0, done: empty }
    }

    pub fn to_vec(&self) -> Vec<NaiveDate> {
        self.iter().collect()
    }

    fn interval(&self) -> i64 {
        i64::from(self.rule.interval)
    }

    /// Index of the first period that can contain a date at or after `lower`.
    /// Every caller guarantees `lower >= start_date >= anchor`.
    fn first_step(&self) -> i64 {
        let interval = self.interval();
        match self.rule.recurrence_type {
            RecurrenceType::Daily => {
                let elapsed = (self.lower - self.rule.start_date).num_days();
                (elapsed + interval - 1) / interval
            }
            RecurrenceType::Weekly => {
                let elapsed = (self.lower - self.anchor).num_days();
                elapsed / (7 * interval)
            }
            RecurrenceType::Monthly => {
                let elapsed =
                    calendar::month_ordinal(self.lower) - calendar::month_ordinal(self.rule.start_date);
                elapsed / interval
            }
            RecurrenceType::Yearly => {
                let elapsed = i64::from(self.lower.year() - self.rule.start_date.year());
                elapsed / interval
            }
        }
    }

    /// Candidate date for period `step` (and weekday `slot` for weekly rules).
    /// `None` once the arithmetic leaves the representable calendar.
    fn candidate(&self, step: i64, slot: usize) -> Option<NaiveDate> {
        let offset = step.checked_mul(self.interval())?;
        let start = self.rule.start_date;

        match self.rule.recurrence_type {
            RecurrenceType::Daily => calendar::add_days(start, offset).ok(),
            RecurrenceType::Weekly => {
                let day = self.days.get(slot)?;
                let block = calendar::add_weeks(self.anchor, offset).ok()?;
                calendar::add_days(block, i64::from(day.index())).ok()
            }
            RecurrenceType::Monthly => {
                let day = self.rule.day_of_month?;
                let ordinal = calendar::month_ordinal(start).checked_add(offset)?;
                calendar::from_month_ordinal(ordinal, day).ok()
            }
            RecurrenceType::Yearly => {
                let month = self.rule.month_of_year?;
                let day = self.rule.day_of_month?;
                let year = i32::try_from(i64::from(start.year()).checked_add(offset)?).ok()?;
                calendar::clamped_date(year, month, day).ok()
            }
        }
    }
}

impl<'a> IntoIterator for &'a Expansion {
    type Item = NaiveDate;
    type IntoIter = Occurrences<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over the occurrences of an [`Expansion`].
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    expansion: &'a Expansion,
    step: i64,
    slot: usize,
    done: bool,
}

impl Occurrences<'_> {
    fn advance(&mut self) {
        if self.expansion.rule.recurrence_type == RecurrenceType::Weekly {
            self.slot += 1;
            if self.slot < self.expansion.days.len() {
                return;
            }
            self.slot = 0;
        }
        self.step += 1;
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        // Candidates grow strictly with (step, slot), so the first one past
        // `upper` ends the sequence.
        while !self.done {
            let Some(candidate) = self.expansion.candidate(self.step, self.slot) else {
                self.done = true;
                break;
            };
            self.advance();

            if candidate > self.expansion.upper {
                self.done = true;
            } else if candidate >= self.expansion.lower {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::WeekdaySet;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn days(tags: &str) -> WeekdaySet {
        tags.parse().unwrap()
    }

    #[test]
    fn test_daily_every_day() {
        let rule = RecurrenceRule::daily(1, 1, d(2024, 1, 1));
        let dates = expand(&rule, d(2024, 1, 1), d(2024, 1, 5)).unwrap().to_vec();
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], d(2024, 1, 1));
        assert_eq!(dates[4], d(2024, 1, 5));
    }

    #[test]
    fn test_daily_first_candidate_is_aligned() {
        // 2024-01-01 + 3k: Jan 1, 4, 7, 10, 13 ...
        let rule = RecurrenceRule::daily(1, 3, d(2024, 1, 1));
        let dates = expand(&rule, d(2024, 1, 5), d(2024, 1, 14)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2024, 1, 7), d(2024, 1, 10), d(2024, 1, 13)]);
    }

    #[test]
    fn test_daily_window_far_from_start() {
        let rule = RecurrenceRule::daily(1, 7, d(2000, 1, 1));
        let dates = expand(&rule, d(2024, 1, 1), d(2024, 1, 31)).unwrap().to_vec();
        assert!(!dates.is_empty());
        for pair in dates.windows(2) {
            assert_eq!((pair[1] - pair[0]).num_days(), 7);
        }
        assert!(dates.iter().all(|date| (*date - d(2000, 1, 1)).num_days() % 7 == 0));
    }

    #[test]
    fn test_weekly_sundays_in_january() {
        let rule = RecurrenceRule::weekly(1, 1, days("SUN"), d(2024, 1, 1));
        let dates = expand(&rule, d(2024, 1, 1), d(2024, 1, 31)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2024, 1, 7), d(2024, 1, 14), d(2024, 1, 21), d(2024, 1, 28)]);
    }

    #[test]
    fn test_weekly_multiple_days_ordered() {
        let rule = RecurrenceRule::weekly(1, 1, days("SUN,WED"), d(2024, 1, 1));
        let dates = expand(&rule, d(2024, 1, 1), d(2024, 1, 14)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2024, 1, 3), d(2024, 1, 7), d(2024, 1, 10), d(2024, 1, 14)]);
    }

    #[test]
    fn test_weekly_interval_counts_from_start_week() {
        // Start on a Thursday: the Monday-aligned anchor is 2024-01-01, so
        // Tuesday of the first block is before the start and is dropped.
        let rule = RecurrenceRule::weekly(1, 2, days("TUE,FRI"), d(2024, 1, 4));
        let dates = expand(&rule, d(2024, 1, 1), d(2024, 2, 5)).unwrap().to_vec();
        assert_eq!(
            dates,
            vec![d(2024, 1, 5), d(2024, 1, 16), d(2024, 1, 19), d(2024, 1, 30), d(2024, 2, 2)]
        );
    }

    #[test]
    fn test_weekly_window_mid_block() {
        let rule = RecurrenceRule::weekly(1, 2, days("MON"), d(2024, 1, 1));
        let dates = expand(&rule, d(2024, 1, 10), d(2024, 2, 20)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2024, 1, 15), d(2024, 1, 29), d(2024, 2, 12)]);
    }

    #[test]
    fn test_monthly_day_31_clamps() {
        let rule = RecurrenceRule::monthly(1, 1, 31, d(2024, 1, 31));
        let dates = expand(&rule, d(2024, 1, 1), d(2024, 4, 30)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31), d(2024, 4, 30)]);
    }

    #[test]
    fn test_monthly_skips_day_before_start() {
        let rule = RecurrenceRule::monthly(1, 1, 10, d(2024, 1, 15));
        let dates = expand(&rule, d(2024, 1, 1), d(2024, 3, 31)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2024, 2, 10), d(2024, 3, 10)]);
    }

    #[test]
    fn test_monthly_interval() {
        let rule = RecurrenceRule::monthly(1, 3, 1, d(2024, 1, 1));
        let dates = expand(&rule, d(2024, 2, 1), d(2025, 1, 31)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2024, 4, 1), d(2024, 7, 1), d(2024, 10, 1), d(2025, 1, 1)]);
    }

    #[test]
    fn test_yearly_leap_day() {
        let rule = RecurrenceRule::yearly(1, 1, 2, 29, d(2024, 1, 1));
        let dates = expand(&rule, d(2024, 1, 1), d(2028, 12, 31)).unwrap().to_vec();
        assert_eq!(
            dates,
            vec![d(2024, 2, 29), d(2025, 2, 28), d(2026, 2, 28), d(2027, 2, 28), d(2028, 2, 29)]
        );
    }

    #[test]
    fn test_yearly_interval() {
        let rule = RecurrenceRule::yearly(1, 2, 12, 25, d(2020, 6, 1));
        let dates = expand(&rule, d(2021, 1, 1), d(2026, 12, 31)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2022, 12, 25), d(2024, 12, 25), d(2026, 12, 25)]);
    }

    #[test]
    fn test_end_date_bounds_output() {
        let rule = RecurrenceRule::daily(1, 1, d(2024, 1, 1)).until(d(2024, 1, 3));
        let dates = expand(&rule, d(2023, 12, 1), d(2024, 12, 31)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 2), d(2024, 1, 3)]);
    }

    #[test]
    fn test_window_before_rule_is_empty() {
        let rule = RecurrenceRule::daily(1, 1, d(2024, 6, 1));
        let expansion = expand(&rule, d(2024, 1, 1), d(2024, 5, 31)).unwrap();
        assert_eq!(expansion.iter().count(), 0);
    }

    #[test]
    fn test_window_after_rule_end_is_empty() {
        let rule = RecurrenceRule::monthly(1, 1, 5, d(2024, 1, 1)).until(d(2024, 3, 1));
        assert!(expand(&rule, d(2024, 4, 1), d(2024, 12, 31)).unwrap().to_vec().is_empty());
    }

    #[test]
    fn test_inverted_window() {
        let rule = RecurrenceRule::daily(1, 1, d(2024, 1, 1));
        let err = expand(&rule, d(2024, 2, 1), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidWindow { .. }));
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let rule = RecurrenceRule::weekly(1, 1, WeekdaySet::EMPTY, d(2024, 1, 1));
        let err = expand(&rule, d(2024, 1, 1), d(2024, 1, 31)).unwrap_err();
        assert_eq!(err.rule_field(), Some("daysOfWeek"));
    }

    #[test]
    fn test_stale_weekly_days_ignored_for_monthly() {
        let mut rule = RecurrenceRule::monthly(1, 1, 1, d(2024, 1, 1));
        rule.days_of_week = days("MON,TUE,WED");
        let dates = expand(&rule, d(2024, 1, 1), d(2024, 2, 29)).unwrap().to_vec();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 2, 1)]);
    }

    #[test]
    fn test_expansion_is_restartable() {
        let rule = RecurrenceRule::weekly(1, 1, days("SAT,SUN"), d(2024, 1, 1));
        let expansion = expand(&rule, d(2024, 1, 1), d(2024, 3, 31)).unwrap();
        let first: Vec<_> = expansion.iter().take(3).collect();
        let again: Vec<_> = (&expansion).into_iter().take(3).collect();
        assert_eq!(first, again);
        assert_eq!(expansion.iter().count(), 26);
    }

    #[test]
    fn test_unbounded_rule_and_window_terminates() {
        let rule = RecurrenceRule::yearly(1, 1000, 1, 1, d(2024, 1, 1));
        let dates = expand(&rule, d(2024, 1, 1), NaiveDate::MAX).unwrap().to_vec();
        assert!(!dates.is_empty());
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_expand_all_deduplicates() {
        let sundays = RecurrenceRule::weekly(1, 1, days("SUN"), d(2024, 1, 1));
        let daily = RecurrenceRule::daily(1, 1, d(2024, 1, 5));
        let dates = expand_all([&sundays, &daily], d(2024, 1, 1), d(2024, 1, 8)).unwrap();
        assert_eq!(dates, vec![d(2024, 1, 5), d(2024, 1, 6), d(2024, 1, 7), d(2024, 1, 8)]);
    }

    #[test]
    fn test_next_occurrence() {
        let rule = RecurrenceRule::weekly(1, 1, days("WED"), d(2024, 1, 1)).until(d(2024, 1, 31));
        assert_eq!(next_occurrence(&rule, d(2024, 1, 4)).unwrap(), Some(d(2024, 1, 10)));
        assert_eq!(next_occurrence(&rule, d(2024, 2, 1)).unwrap(), None);
    }
}
