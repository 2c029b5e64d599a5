//! Site visit repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::errors::StoreError;
use domain::models::VisitStats;
use domain::ports::VisitMetricsSource;
use sqlx::PgPool;

use super::map_sqlx_error;
use crate::entities::{PageCountEntity, VisitTotalsEntity};
use crate::metrics::{QueryTimer, Table};

#[derive(Clone)]
pub struct PgVisitRepository {
    pool: PgPool,
}

impl PgVisitRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VisitMetricsSource for PgVisitRepository {
    async fn record_visit(&self, page: &str) -> Result<(), StoreError> {
        let timer = QueryTimer::start(Table::SiteVisits, "record_visit");
        let result = sqlx::query("INSERT INTO site_visits (page) VALUES ($1)")
            .bind(page)
            .execute(&self.pool)
            .await;
        timer.observe(result).map(|_| ()).map_err(map_sqlx_error)
    }

    async fn visit_stats(
        &self,
        since: DateTime<Utc>,
        top_n: usize,
    ) -> Result<VisitStats, StoreError> {
        let timer = QueryTimer::start(Table::SiteVisits, "visit_stats");
        let totals = sqlx::query_as::<_, VisitTotalsEntity>(
            r#"
            SELECT COUNT(*) AS total_visits,
                   COUNT(*) FILTER (WHERE visited_at >= $1) AS today_visits
            FROM site_visits
            "#,
        )
        .bind(since)
        .fetch_one(&self.pool);

        let pages = sqlx::query_as::<_, PageCountEntity>(
            r#"
            SELECT page, COUNT(*) AS count
            FROM site_visits
            GROUP BY page
            ORDER BY count DESC, MAX(visited_at) DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(top_n).unwrap_or(i64::MAX))
        .fetch_all(&self.pool);

        let result = tokio::try_join!(totals, pages);
        let (totals, pages) = timer.observe(result).map_err(map_sqlx_error)?;

        Ok(VisitStats {
            total_visits: totals.total_visits,
            today_visits: totals.today_visits,
            top_pages: pages.into_iter().map(Into::into).collect(),
        })
    }
}
