use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Kind of worship gathering an activity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorshipType {
    SundayService,
    MidweekService,
    PrayerMeeting,
    BibleStudy,
    YouthService,
    SpecialService,
}

impl WorshipType {
    pub const ALL: [WorshipType; 6] = [
        WorshipType::SundayService,
        WorshipType::MidweekService,
        WorshipType::PrayerMeeting,
        WorshipType::BibleStudy,
        WorshipType::YouthService,
        WorshipType::SpecialService,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WorshipType::SundayService => "sunday_service",
            WorshipType::MidweekService => "midweek_service",
            WorshipType::PrayerMeeting => "prayer_meeting",
            WorshipType::BibleStudy => "bible_study",
            WorshipType::YouthService => "youth_service",
            WorshipType::SpecialService => "special_service",
        }
    }
}

impl fmt::Display for WorshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorshipType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| Error::InvalidWorshipType(s.to_string()))
    }
}

/// A scheduled church activity. Its dates come from its recurrence rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub worship_type: Option<WorshipType>,
    pub location: Option<String>,
}

/// Lookup row describing how an attendance mark is interpreted.
///
/// Only `is_counted_as_attended` matters to statistics; the rest is display
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStatus {
    pub name: String,
    pub description: Option<String>,
    pub is_counted_as_attended: bool,
}

impl AttendanceStatus {
    pub fn new(name: impl Into<String>, is_counted_as_attended: bool) -> Self {
        Self { name: name.into(), description: None, is_counted_as_attended }
    }
}

/// One member's attendance mark for one occurrence of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub activity_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn counts_as_attended(&self) -> bool {
        self.status.is_counted_as_attended
    }
}

/// Derived rollup for one activity over one period, keyed by
/// `(activity_id, date)` where `date` is the first day of the period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityStatistics {
    pub activity_id: i64,
    pub date: NaiveDate,
    pub total_instances: i64,
    pub total_attendance: i64,
    pub average_attendance: f64,
}

impl ActivityStatistics {
    pub fn new(activity_id: i64, date: NaiveDate, total_instances: i64, total_attendance: i64) -> Self {
        let average_attendance = if total_instances > 0 {
            total_attendance as f64 / total_instances as f64
        } else {
            0.0
        };

        Self { activity_id, date, total_instances, total_attendance, average_attendance }
    }
}

/// Period size used when splitting a date range into statistics rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsBucket {
    Daily,
    Weekly,
    #[default]
    Monthly,
    /// The whole requested range as a single row.
    Range,
}

impl FromStr for StatisticsBucket {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(StatisticsBucket::Daily),
            "weekly" | "week" => Ok(StatisticsBucket::Weekly),
            "monthly" | "month" => Ok(StatisticsBucket::Monthly),
            "range" => Ok(StatisticsBucket::Range),
            _ => Err(Error::InvalidConfig(format!("unknown statistics bucket '{}'", s))),
        }
    }
}

/// Combined statistics of every activity sharing a worship type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorshipSummary {
    pub worship_type: WorshipType,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub activities: Vec<ActivityStatistics>,
    pub total_instances: i64,
    pub total_attendance: i64,
    pub average_attendance: f64,
}

impl WorshipSummary {
    pub fn from_activities(
        worship_type: WorshipType,
        period_start: NaiveDate,
        period_end: NaiveDate,
        activities: Vec<ActivityStatistics>,
    ) -> Self {
        let total_instances = activities.iter().map(|s| s.total_instances).sum();
        let total_attendance = activities.iter().map(|s| s.total_attendance).sum();
        let combined = ActivityStatistics::new(0, period_start, total_instances, total_attendance);

        Self {
            worship_type,
            period_start,
            period_end,
            activities,
            total_instances,
            total_attendance,
            average_attendance: combined.average_attendance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_worship_type_parsing() {
        assert_eq!("sunday_service".parse::<WorshipType>().unwrap(), WorshipType::SundayService);
        assert_eq!("Bible-Study".parse::<WorshipType>().unwrap(), WorshipType::BibleStudy);
        assert!(matches!(
            "potluck".parse::<WorshipType>(),
            Err(Error::InvalidWorshipType(value)) if value == "potluck"
        ));
    }

    #[test]
    fn test_worship_type_serialization() {
        let json = serde_json::to_string(&WorshipType::PrayerMeeting).unwrap();
        assert_eq!(json, r#""prayer_meeting""#);
        for kind in WorshipType::ALL {
            assert_eq!(kind.to_string().parse::<WorshipType>().unwrap(), kind);
        }
    }

    #[test]
    fn test_statistics_average() {
        let stats = ActivityStatistics::new(1, d(2024, 1, 1), 4, 10);
        assert_eq!(stats.average_attendance, 2.5);
    }

    #[test]
    fn test_statistics_zero_instances() {
        let stats = ActivityStatistics::new(1, d(2024, 1, 1), 0, 0);
        assert_eq!(stats.average_attendance, 0.0);
        assert!(!stats.average_attendance.is_nan());
    }

    #[test]
    fn test_bucket_parsing() {
        assert_eq!("Weekly".parse::<StatisticsBucket>().unwrap(), StatisticsBucket::Weekly);
        assert_eq!(StatisticsBucket::default(), StatisticsBucket::Monthly);
        assert!("hourly".parse::<StatisticsBucket>().is_err());
    }

    #[test]
    fn test_worship_summary_totals() {
        let summary = WorshipSummary::from_activities(
            WorshipType::SundayService,
            d(2024, 1, 1),
            d(2024, 1, 31),
            vec![
                ActivityStatistics::new(1, d(2024, 1, 1), 4, 200),
                ActivityStatistics::new(2, d(2024, 1, 1), 4, 40),
            ],
        );
        assert_eq!(summary.total_instances, 8);
        assert_eq!(summary.total_attendance, 240);
        assert_eq!(summary.average_attendance, 30.0);
    }

    #[test]
    fn test_empty_worship_summary() {
        let summary = WorshipSummary::from_activities(
            WorshipType::YouthService,
            d(2024, 1, 1),
            d(2024, 1, 31),
            Vec::new(),
        );
        assert_eq!(summary.total_instances, 0);
        assert_eq!(summary.average_attendance, 0.0);
    }
}
