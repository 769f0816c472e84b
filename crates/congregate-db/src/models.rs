use chrono::{DateTime, NaiveDate, Utc};
use congregate_common::{
    Activity, ActivityStatistics, AttendanceRecord, AttendanceStatus, RecurrenceRule,
    RecurrenceType, WeekdaySet, WorshipType,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::DbError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbUser {
    pub id: i64,
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbActivity {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub worship_type: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivity {
    pub name: String,
    pub description: Option<String>,
    pub worship_type: Option<WorshipType>,
    pub location: Option<String>,
}

impl NewActivity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None, worship_type: None, location: None }
    }
}

impl TryFrom<DbActivity> for Activity {
    type Error = DbError;

    fn try_from(row: DbActivity) -> Result<Self, Self::Error> {
        let worship_type = row
            .worship_type
            .as_deref()
            .map(str::parse::<WorshipType>)
            .transpose()
            .map_err(|e| DbError::InvalidData(format!("activity {}: {}", row.id, e)))?;

        Ok(Activity {
            id: row.id,
            name: row.name,
            description: row.description,
            worship_type,
            location: row.location,
        })
    }
}

/// Raw `activity_recurrence` row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbRecurrence {
    pub id: i64,
    pub activity_id: i64,
    pub recurrence_type: String,
    pub interval: i64,
    pub day_of_week: String, // comma separated SET of MON..SUN
    pub day_of_month: Option<i64>,
    pub month_of_year: Option<i64>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbRecurrence> for RecurrenceRule {
    type Error = DbError;

    fn try_from(row: DbRecurrence) -> Result<Self, Self::Error> {
        let id = row.id;
        let invalid = |what: &str, e: &dyn std::fmt::Display| {
            DbError::InvalidData(format!("recurrence {} has invalid {}: {}", id, what, e))
        };

        let recurrence_type: RecurrenceType =
            row.recurrence_type.parse().map_err(|e| invalid("recurrence_type", &e))?;
        let interval = u32::try_from(row.interval).map_err(|e| invalid("interval", &e))?;
        let days_of_week: WeekdaySet =
            row.day_of_week.parse().map_err(|e| invalid("day_of_week", &e))?;
        let day_of_month = row
            .day_of_month
            .map(u32::try_from)
            .transpose()
            .map_err(|e| invalid("day_of_month", &e))?;
        let month_of_year = row
            .month_of_year
            .map(u32::try_from)
            .transpose()
            .map_err(|e| invalid("month_of_year", &e))?;

        Ok(RecurrenceRule {
            id: row.id,
            activity_id: row.activity_id,
            recurrence_type,
            interval,
            days_of_week,
            day_of_month,
            month_of_year,
            start_date: row.start_date,
            end_date: row.end_date,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbAttendanceStatus {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_counted_as_attended: bool,
}

impl From<DbAttendanceStatus> for AttendanceStatus {
    fn from(row: DbAttendanceStatus) -> Self {
        AttendanceStatus {
            name: row.name,
            description: row.description,
            is_counted_as_attended: row.is_counted_as_attended,
        }
    }
}

/// Attendance row joined with its status.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbAttendanceRecord {
    pub id: i64,
    pub activity_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
    pub status_name: String,
    pub status_description: Option<String>,
    pub is_counted_as_attended: bool,
}

impl From<DbAttendanceRecord> for AttendanceRecord {
    fn from(row: DbAttendanceRecord) -> Self {
        AttendanceRecord {
            activity_id: row.activity_id,
            user_id: row.user_id,
            date: row.date,
            status: AttendanceStatus {
                name: row.status_name,
                description: row.status_description,
                is_counted_as_attended: row.is_counted_as_attended,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttendanceRecord {
    pub activity_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbActivityStatistics {
    pub id: i64,
    pub activity_id: i64,
    pub date: NaiveDate,
    pub total_instances: i64,
    pub total_attendance: i64,
    pub average_attendance: f64,
    pub computed_at: DateTime<Utc>,
}

impl From<DbActivityStatistics> for ActivityStatistics {
    fn from(row: DbActivityStatistics) -> Self {
        ActivityStatistics {
            activity_id: row.activity_id,
            date: row.date,
            total_instances: row.total_instances,
            total_attendance: row.total_attendance,
            average_attendance: row.average_attendance,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbChurchOffice {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbPermission {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbUserRole {
    pub user_id: i64,
    pub office_id: i64,
    pub office_name: String,
    pub assigned_at: DateTime<Utc>,
}
