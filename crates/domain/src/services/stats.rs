//! On-demand registration statistics.
//!
//! Every call recomputes the snapshot from the store. Primary figures are
//! fetched concurrently and all must succeed. Visit counters come from an
//! independent source and are merged only when that source answers.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::errors::DomainError;
use crate::models::{
    RecentActivity, StatsSnapshot, VisitStats, RECENT_ACTIVITY_LIMIT, TOP_COUNTRIES_LIMIT,
};
use crate::ports::{RegistrationStore, VisitMetricsSource};
use crate::services::clock::Clock;

/// Number of pages kept in the visit ranking.
pub const TOP_PAGES_LIMIT: usize = 5;

/// Window boundaries derived from a single reading of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindows {
    pub now: DateTime<Utc>,
    pub day_start: DateTime<Utc>,
    pub week_start: DateTime<Utc>,
    pub month_start: DateTime<Utc>,
}

impl StatsWindows {
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            day_start: now - Duration::hours(24),
            week_start: now - Duration::days(7),
            month_start: now - Duration::days(30),
        }
    }
}

/// Assembles [`StatsSnapshot`]s.
#[derive(Clone)]
pub struct StatsService {
    registrations: Arc<dyn RegistrationStore>,
    visits: Option<Arc<dyn VisitMetricsSource>>,
    clock: Arc<dyn Clock>,
}

impl StatsService {
    pub fn new(
        registrations: Arc<dyn RegistrationStore>,
        visits: Option<Arc<dyn VisitMetricsSource>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registrations,
            visits,
            clock,
        }
    }

    pub async fn compute_stats(&self) -> Result<StatsSnapshot, DomainError> {
        let windows = StatsWindows::ending_at(self.clock.now());
        let store = &self.registrations;

        let primary = async {
            tokio::try_join!(
                store.count_all(),
                store.count_since(windows.day_start),
                store.count_since(windows.week_start),
                store.count_since(windows.month_start),
                store.top_countries(TOP_COUNTRIES_LIMIT),
                store.list_recent(RECENT_ACTIVITY_LIMIT),
            )
        };

        let (primary, visit_stats) = tokio::join!(primary, self.visit_stats(windows.day_start));

        let (total, today, week, month, top_countries, recent) = primary?;

        debug!(total, today, week, month, "Computed registration stats");

        Ok(StatsSnapshot {
            total_registrations: total,
            today_registrations: today,
            this_week_registrations: week,
            this_month_registrations: month,
            top_countries,
            recent_activity: recent.into_iter().map(RecentActivity::from).collect(),
            visit_stats,
        })
    }

    /// Best-effort visit counters. Failures are logged and dropped.
    async fn visit_stats(&self, since: DateTime<Utc>) -> Option<VisitStats> {
        let source = self.visits.as_ref()?;
        match source.visit_stats(since, TOP_PAGES_LIMIT).await {
            Ok(stats) => Some(stats),
            Err(e) => {
                let err = DomainError::SecondaryMetric(e.to_string());
                warn!(error = %err, "Visit stats unavailable, serving registration stats only");
                None
            }
        }
    }
}
