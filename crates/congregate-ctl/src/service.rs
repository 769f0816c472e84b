use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use congregate_common::config::StatisticsConfig;
use congregate_common::{
    aggregate_buckets, aggregate_rules, expand_all, next_occurrence, ActivityStatistics,
    StatisticsBucket, WorshipSummary, WorshipType,
};
use congregate_db::AttendanceStore;
use tracing::{debug, info, warn};

/// Expansion and statistics over whatever store it is handed.
pub struct StatisticsService<S> {
    store: S,
    config: StatisticsConfig,
}

impl<S: AttendanceStore> StatisticsService<S> {
    pub fn new(store: S, config: StatisticsConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fill in a missing window edge: `to` defaults to `today`, `from` to
    /// the configured lookback before `to`.
    pub fn window(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        today: NaiveDate,
    ) -> (NaiveDate, NaiveDate) {
        let to = to.unwrap_or(today);
        let from = from.unwrap_or_else(|| {
            to.checked_sub_days(Days::new(u64::from(self.config.lookback_days))).unwrap_or(NaiveDate::MIN)
        });
        (from, to)
    }

    /// Every occurrence of an activity in `[from, to]`, across all its rules.
    pub async fn occurrences(&self, activity_id: i64, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>> {
        let rules = self.store.recurrences_for_activity(activity_id).await?;
        if rules.is_empty() {
            warn!(activity_id, "Activity has no recurrence rules");
        }

        expand_all(&rules, from, to)
            .with_context(|| format!("Failed to expand activity {} over {}..{}", activity_id, from, to))
    }

    /// Earliest upcoming occurrence of an activity on or after `from`.
    pub async fn next_occurrence(&self, activity_id: i64, from: NaiveDate) -> Result<Option<NaiveDate>> {
        let rules = self.store.recurrences_for_activity(activity_id).await?;

        let mut next: Option<NaiveDate> = None;
        for rule in &rules {
            if let Some(date) = next_occurrence(rule, from)? {
                next = Some(next.map_or(date, |current| current.min(date)));
            }
        }
        Ok(next)
    }

    /// Recompute the statistics of an activity and upsert one row per bucket.
    pub async fn recompute(
        &self,
        activity_id: i64,
        from: NaiveDate,
        to: NaiveDate,
        bucket: Option<StatisticsBucket>,
    ) -> Result<Vec<ActivityStatistics>> {
        let bucket = bucket.unwrap_or(self.config.default_bucket);

        // Fails early for an unknown activity.
        self.store.get_activity(activity_id).await?;

        let rules = self.store.recurrences_for_activity(activity_id).await?;
        let records = self.store.attendance_for_activity(activity_id, from, to).await?;
        debug!(activity_id, rules = rules.len(), records = records.len(), "Loaded attendance inputs");

        let rows = aggregate_buckets(activity_id, &rules, &records, from, to, bucket)
            .with_context(|| format!("Failed to aggregate activity {}", activity_id))?;

        self.store.upsert_statistics(&rows).await?;
        info!(activity_id, %from, %to, rows = rows.len(), "Recomputed attendance statistics");

        Ok(rows)
    }

    /// One statistics row per activity of `worship_type` over `[from, to]`,
    /// combined into a summary. Nothing is persisted.
    pub async fn worship_summary(
        &self,
        worship_type: WorshipType,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<WorshipSummary> {
        let activities = self.store.activities_by_worship_type(worship_type).await?;

        let mut rows = Vec::with_capacity(activities.len());
        for activity in &activities {
            let rules = self.store.recurrences_for_activity(activity.id).await?;
            let records = self.store.attendance_for_activity(activity.id, from, to).await?;
            rows.push(aggregate_rules(activity.id, &rules, &records, from, to)?);
        }

        debug!(%worship_type, activities = rows.len(), "Built worship type summary");
        Ok(WorshipSummary::from_activities(worship_type, from, to, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use congregate_common::{
        Activity, AttendanceRecord, AttendanceStatus, DayOfWeek, RecurrenceRule, WeekdaySet,
    };
    use congregate_db::DbError;
    use std::sync::Mutex;

    fn d(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[derive(Default)]
    struct MemoryStore {
        activities: Vec<Activity>,
        rules: Vec<RecurrenceRule>,
        records: Vec<AttendanceRecord>,
        upserted: Mutex<Vec<ActivityStatistics>>,
    }

    #[async_trait]
    impl AttendanceStore for MemoryStore {
        async fn get_activity(&self, activity_id: i64) -> congregate_db::Result<Activity> {
            self.activities
                .iter()
                .find(|a| a.id == activity_id)
                .cloned()
                .ok_or_else(|| DbError::NotFound(format!("Activity {} not found", activity_id)))
        }

        async fn activities_by_worship_type(
            &self,
            worship_type: WorshipType,
        ) -> congregate_db::Result<Vec<Activity>> {
            Ok(self.activities.iter().filter(|a| a.worship_type == Some(worship_type)).cloned().collect())
        }

        async fn recurrences_for_activity(&self, activity_id: i64) -> congregate_db::Result<Vec<RecurrenceRule>> {
            Ok(self.rules.iter().filter(|r| r.activity_id == activity_id).cloned().collect())
        }

        async fn attendance_for_activity(
            &self,
            activity_id: i64,
            from: NaiveDate,
            to: NaiveDate,
        ) -> congregate_db::Result<Vec<AttendanceRecord>> {
            Ok(self
                .records
                .iter()
                .filter(|r| r.activity_id == activity_id && r.date >= from && r.date <= to)
                .cloned()
                .collect())
        }

        async fn upsert_statistics(&self, rows: &[ActivityStatistics]) -> congregate_db::Result<()> {
            self.upserted.lock().unwrap().extend_from_slice(rows);
            Ok(())
        }
    }

    fn activity(id: i64, worship_type: WorshipType) -> Activity {
        Activity {
            id,
            name: format!("activity {}", id),
            description: None,
            worship_type: Some(worship_type),
            location: None,
        }
    }

    fn present(activity_id: i64, user_id: i64, date: NaiveDate) -> AttendanceRecord {
        AttendanceRecord { activity_id, user_id, date, status: AttendanceStatus::new("present", true) }
    }

    fn sunday_store() -> MemoryStore {
        let sundays = WeekdaySet::single(DayOfWeek::Sun);
        MemoryStore {
            activities: vec![
                activity(1, WorshipType::SundayService),
                activity(2, WorshipType::SundayService),
                activity(3, WorshipType::BibleStudy),
            ],
            rules: vec![
                RecurrenceRule::weekly(1, 1, sundays, d(2024, 1, 1)),
                RecurrenceRule::weekly(2, 2, sundays, d(2024, 1, 1)),
                RecurrenceRule::daily(3, 1, d(2024, 1, 1)),
            ],
            records: vec![
                present(1, 10, d(2024, 1, 7)),
                present(1, 11, d(2024, 1, 7)),
                present(1, 10, d(2024, 1, 14)),
                present(2, 10, d(2024, 1, 7)),
                present(2, 11, d(2024, 1, 14)),
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_recompute_upserts_buckets() {
        let service = StatisticsService::new(sunday_store(), StatisticsConfig::default());

        let rows = service.recompute(1, d(2024, 1, 1), d(2024, 2, 29), None).await.unwrap();
        assert_eq!(
            rows,
            vec![
                ActivityStatistics::new(1, d(2024, 1, 1), 4, 3),
                ActivityStatistics::new(1, d(2024, 2, 1), 4, 0),
            ]
        );
        assert_eq!(*service.store().upserted.lock().unwrap(), rows);
    }

    #[tokio::test]
    async fn test_recompute_unknown_activity() {
        let service = StatisticsService::new(sunday_store(), StatisticsConfig::default());

        assert!(service.recompute(99, d(2024, 1, 1), d(2024, 1, 31), None).await.is_err());
        assert!(service.store().upserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_worship_summary_combines_activities() {
        let service = StatisticsService::new(sunday_store(), StatisticsConfig::default());

        let summary =
            service.worship_summary(WorshipType::SundayService, d(2024, 1, 1), d(2024, 1, 31)).await.unwrap();
        assert_eq!(summary.activities.len(), 2);
        // Activity 2 meets every other week: Jan 7, 21.
        assert_eq!(summary.activities[1].total_instances, 2);
        // Jan 14 is an off week for activity 2, so that mark is ignored.
        assert_eq!(summary.activities[1].total_attendance, 1);
        assert_eq!(summary.total_instances, 6);
        assert_eq!(summary.total_attendance, 4);
        assert!(service.store().upserted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_occurrences_and_next() {
        let service = StatisticsService::new(sunday_store(), StatisticsConfig::default());

        let dates = service.occurrences(2, d(2024, 1, 1), d(2024, 2, 10)).await.unwrap();
        assert_eq!(dates, vec![d(2024, 1, 7), d(2024, 1, 21), d(2024, 2, 4)]);

        assert_eq!(service.next_occurrence(2, d(2024, 1, 8)).await.unwrap(), Some(d(2024, 1, 21)));
        assert_eq!(service.next_occurrence(42, d(2024, 1, 8)).await.unwrap(), None);
        assert!(service.occurrences(1, d(2024, 2, 1), d(2024, 1, 1)).await.is_err());
    }

    #[test]
    fn test_window_defaults() {
        let config = StatisticsConfig { lookback_days: 30, ..Default::default() };
        let service = StatisticsService::new(MemoryStore::default(), config);
        let today = d(2024, 3, 31);

        assert_eq!(service.window(None, None, today), (d(2024, 3, 1), today));
        assert_eq!(
            service.window(Some(d(2024, 1, 1)), Some(d(2024, 1, 31)), today),
            (d(2024, 1, 1), d(2024, 1, 31))
        );
    }
}
