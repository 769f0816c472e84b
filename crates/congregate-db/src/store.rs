use async_trait::async_trait;
use chrono::NaiveDate;
use congregate_common::{Activity, ActivityStatistics, AttendanceRecord, RecurrenceRule, WorshipType};

use crate::connection::Database;
use crate::error::Result;
use crate::queries::{ActivityQueries, AttendanceQueries, RecurrenceQueries, StatisticsQueries};

/// Everything the statistics pipeline reads and writes.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn get_activity(&self, activity_id: i64) -> Result<Activity>;
    async fn activities_by_worship_type(&self, worship_type: WorshipType) -> Result<Vec<Activity>>;
    async fn recurrences_for_activity(&self, activity_id: i64) -> Result<Vec<RecurrenceRule>>;
    async fn attendance_for_activity(
        &self,
        activity_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>>;
    async fn upsert_statistics(&self, rows: &[ActivityStatistics]) -> Result<()>;
}

pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn into_inner(self) -> Database {
        self.db
    }
}

#[async_trait]
impl AttendanceStore for SqliteStore {
    async fn get_activity(&self, activity_id: i64) -> Result<Activity> {
        ActivityQueries::get(&self.db, activity_id).await
    }

    async fn activities_by_worship_type(&self, worship_type: WorshipType) -> Result<Vec<Activity>> {
        ActivityQueries::list_by_worship_type(&self.db, worship_type).await
    }

    async fn recurrences_for_activity(&self, activity_id: i64) -> Result<Vec<RecurrenceRule>> {
        RecurrenceQueries::list_for_activity(&self.db, activity_id).await
    }

    async fn attendance_for_activity(
        &self,
        activity_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>> {
        AttendanceQueries::list_for_activity_range(&self.db, activity_id, from, to).await
    }

    async fn upsert_statistics(&self, rows: &[ActivityStatistics]) -> Result<()> {
        StatisticsQueries::upsert_many(&self.db, rows).await
    }
}
