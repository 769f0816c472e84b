use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{self, DayOfWeek};
use crate::error::{Error, Result};

/// How often a rule repeats. Stored in `activity_recurrence.recurrence_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceType {
    pub fn as_str(self) -> &'static str {
        match self {
            RecurrenceType::Daily => "DAILY",
            RecurrenceType::Weekly => "WEEKLY",
            RecurrenceType::Monthly => "MONTHLY",
            RecurrenceType::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(RecurrenceType::Daily),
            "WEEKLY" => Ok(RecurrenceType::Weekly),
            "MONTHLY" => Ok(RecurrenceType::Monthly),
            "YEARLY" => Ok(RecurrenceType::Yearly),
            _ => Err(Error::invalid_rule("recurrenceType")),
        }
    }
}

/// Fixed-size set of weekday tags, one bit per day with Monday in bit 0.
///
/// Persisted as the comma-separated text form of a SQL `SET` column
/// (`"MON,WED,SUN"`). Parsing is exhaustive: any unknown tag is an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    pub fn single(day: DayOfWeek) -> Self {
        Self::EMPTY.with(day)
    }

    pub fn with(self, day: DayOfWeek) -> Self {
        WeekdaySet(self.0 | (1 << day.index()))
    }

    pub fn contains(self, day: DayOfWeek) -> bool {
        self.0 & (1 << day.index()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Members in Monday-to-Sunday order.
    pub fn iter(self) -> impl Iterator<Item = DayOfWeek> {
        DayOfWeek::ALL.into_iter().filter(move |day| self.contains(*day))
    }
}

impl FromIterator<DayOfWeek> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = DayOfWeek>>(iter: I) -> Self {
        iter.into_iter().fold(WeekdaySet::EMPTY, WeekdaySet::with)
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.iter().map(DayOfWeek::tag).collect();
        f.write_str(&tags.join(","))
    }
}

impl FromStr for WeekdaySet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(DayOfWeek::from_str)
            .collect()
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let days = Vec::<DayOfWeek>::deserialize(deserializer)?;
        Ok(days.into_iter().collect())
    }
}

/// A persisted `activity_recurrence` row.
///
/// Only the fields relevant to `recurrence_type` are read: `days_of_week`
/// for WEEKLY, `day_of_month` for MONTHLY, `month_of_year` and
/// `day_of_month` for YEARLY. Anything else left over from an earlier type
/// is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub id: i64,
    pub activity_id: i64,
    pub recurrence_type: RecurrenceType,
    pub interval: u32,
    #[serde(default)]
    pub days_of_week: WeekdaySet,
    pub day_of_month: Option<u32>,
    pub month_of_year: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl RecurrenceRule {
    pub fn daily(activity_id: i64, interval: u32, start_date: NaiveDate) -> Self {
        Self::bare(activity_id, RecurrenceType::Daily, interval, start_date)
    }

    pub fn weekly(
        activity_id: i64,
        interval: u32,
        days_of_week: WeekdaySet,
        start_date: NaiveDate,
    ) -> Self {
        Self { days_of_week, ..Self::bare(activity_id, RecurrenceType::Weekly, interval, start_date) }
    }

    pub fn monthly(activity_id: i64, interval: u32, day_of_month: u32, start_date: NaiveDate) -> Self {
        Self {
            day_of_month: Some(day_of_month),
            ..Self::bare(activity_id, RecurrenceType::Monthly, interval, start_date)
        }
    }

    pub fn yearly(
        activity_id: i64,
        interval: u32,
        month_of_year: u32,
        day_of_month: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            month_of_year: Some(month_of_year),
            day_of_month: Some(day_of_month),
            ..Self::bare(activity_id, RecurrenceType::Yearly, interval, start_date)
        }
    }

    pub fn until(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    fn bare(
        activity_id: i64,
        recurrence_type: RecurrenceType,
        interval: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: 0,
            activity_id,
            recurrence_type,
            interval,
            days_of_week: WeekdaySet::EMPTY,
            day_of_month: None,
            month_of_year: None,
            start_date,
            end_date: None,
        }
    }

    /// Check the rule before it is expanded or persisted.
    ///
    /// Checks run in a fixed order and the first failure wins, so the
    /// reported field is stable for a given rule.
    pub fn validate(&self) -> Result<()> {
        if self.interval < 1 {
            return Err(Error::invalid_rule("interval"));
        }

        match self.recurrence_type {
            RecurrenceType::Daily => {}
            RecurrenceType::Weekly => {
                if self.days_of_week.is_empty() {
                    return Err(Error::invalid_rule("daysOfWeek"));
                }
            }
            RecurrenceType::Monthly => {
                if !matches!(self.day_of_month, Some(1..=31)) {
                    return Err(Error::invalid_rule("dayOfMonth"));
                }
            }
            RecurrenceType::Yearly => {
                let month = match self.month_of_year {
                    Some(month @ 1..=12) => month,
                    _ => return Err(Error::invalid_rule("monthOfYear")),
                };
                // Checked against a leap year so Feb 29 is accepted.
                let last = calendar::days_in_month(2000, month)?;
                match self.day_of_month {
                    Some(day) if (1..=last).contains(&day) => {}
                    _ => return Err(Error::invalid_rule("dayOfMonth")),
                }
            }
        }

        if let Some(end_date) = self.end_date {
            if end_date < self.start_date {
                return Err(Error::invalid_rule("endDate"));
            }
        }

        Ok(())
    }
}
