// Calendar Utilities
//
// Date-only arithmetic used by recurrence expansion. All values are
// `NaiveDate`: no time of day and no timezone, so the same rule expands
// identically for every caller.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Weekday tag as persisted in the `day_of_week` SET column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    /// All seven tags, Monday first.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
        DayOfWeek::Sun,
    ];

    /// Days since Monday (Monday = 0, Sunday = 6).
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn tag(self) -> &'static str {
        match self {
            DayOfWeek::Mon => "MON",
            DayOfWeek::Tue => "TUE",
            DayOfWeek::Wed => "WED",
            DayOfWeek::Thu => "THU",
            DayOfWeek::Fri => "FRI",
            DayOfWeek::Sat => "SAT",
            DayOfWeek::Sun => "SUN",
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(day: Weekday) -> Self {
        Self::ALL[day.num_days_from_monday() as usize]
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for DayOfWeek {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MON" | "MONDAY" => Ok(DayOfWeek::Mon),
            "TUE" | "TUESDAY" => Ok(DayOfWeek::Tue),
            "WED" | "WEDNESDAY" => Ok(DayOfWeek::Wed),
            "THU" | "THURSDAY" => Ok(DayOfWeek::Thu),
            "FRI" | "FRIDAY" => Ok(DayOfWeek::Fri),
            "SAT" | "SATURDAY" => Ok(DayOfWeek::Sat),
            "SUN" | "SUNDAY" => Ok(DayOfWeek::Sun),
            _ => Err(Error::InvalidWeekday(s.to_string())),
        }
    }
}

/// Build a calendar date, rejecting months outside 1-12 and days past the
/// end of the month.
pub fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    let last = days_in_month(year, month)?;
    if day == 0 || day > last {
        return Err(invalid(year, month, day));
    }

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid(year, month, day))
}

/// Like [`date`], but a day past the end of the month is clamped to the
/// month's last day.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    if day == 0 {
        return Err(invalid(year, month, day));
    }
    let last = days_in_month(year, month)?;
    date(year, month, day.min(last))
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Ok(31),
        4 | 6 | 9 | 11 => Ok(30),
        2 if is_leap_year(year) => Ok(29),
        2 => Ok(28),
        _ => Err(Error::InvalidDate(format!("month {} is outside 1-12", month))),
    }
}

pub fn add_days(date: NaiveDate, n: i64) -> Result<NaiveDate> {
    let days = Days::new(n.unsigned_abs());
    let shifted =
        if n >= 0 { date.checked_add_days(days) } else { date.checked_sub_days(days) };

    shifted.ok_or_else(|| out_of_range(date, n, "days"))
}

pub fn add_weeks(date: NaiveDate, n: i64) -> Result<NaiveDate> {
    let days = n.checked_mul(7).ok_or_else(|| out_of_range(date, n, "weeks"))?;
    add_days(date, days)
}

/// Add calendar months. A day-of-month that does not exist in the target
/// month is clamped to its last day (Jan 31 + 1 month = Feb 28/29).
pub fn add_months(date: NaiveDate, n: i64) -> Result<NaiveDate> {
    let months = u32::try_from(n.unsigned_abs())
        .map(Months::new)
        .map_err(|_| out_of_range(date, n, "months"))?;
    let shifted =
        if n >= 0 { date.checked_add_months(months) } else { date.checked_sub_months(months) };

    shifted.ok_or_else(|| out_of_range(date, n, "months"))
}

/// Add calendar years. Feb 29 lands on Feb 28 in non-leap target years.
pub fn add_years(date: NaiveDate, n: i64) -> Result<NaiveDate> {
    let months = n.checked_mul(12).ok_or_else(|| out_of_range(date, n, "years"))?;
    add_months(date, months)
}

pub fn weekday_of(date: NaiveDate) -> DayOfWeek {
    date.weekday().into()
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> Result<NaiveDate> {
    add_days(date, -i64::from(date.weekday().num_days_from_monday()))
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Months elapsed since year 0, so month offsets reduce to integer arithmetic.
pub fn month_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// Inverse of [`month_ordinal`], clamping `day` to the month's length.
pub fn from_month_ordinal(ordinal: i64, day: u32) -> Result<NaiveDate> {
    let year = i32::try_from(ordinal.div_euclid(12))
        .map_err(|_| Error::InvalidDate(format!("month ordinal {} is out of range", ordinal)))?;
    let month = ordinal.rem_euclid(12) as u32 + 1;
    clamped_date(year, month, day)
}

fn invalid(year: i32, month: u32, day: u32) -> Error {
    Error::InvalidDate(format!("{:04}-{:02}-{:02}", year, month, day))
}

fn out_of_range(date: NaiveDate, n: i64, unit: &str) -> Error {
    Error::InvalidDate(format!("{} {:+} {} is out of range", date, n, unit))
}
