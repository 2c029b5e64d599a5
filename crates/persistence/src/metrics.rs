//! Storage metrics.
//!
//! Each repository call is timed per table and operation, with its outcome
//! as a label. Pool gauges are refreshed on every `/metrics` scrape.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Tables behind the storage ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Registrations,
    Partners,
    SiteVisits,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Registrations => "registrations",
            Table::Partners => "partners",
            Table::SiteVisits => "site_visits",
        }
    }
}

fn outcome<T>(result: &Result<T, sqlx::Error>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(sqlx::Error::RowNotFound) => "not_found",
        Err(_) => "error",
    }
}

/// Times one repository call.
///
/// ```ignore
/// let timer = QueryTimer::start(Table::Registrations, "find_by_id");
/// let result = sqlx::query_as::<_, RegistrationEntity>(&sql).fetch_optional(&pool).await;
/// timer.observe(result).map_err(map_sqlx_error)
/// ```
pub struct QueryTimer {
    table: Table,
    operation: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn start(table: Table, operation: &'static str) -> Self {
        Self {
            table,
            operation,
            start: Instant::now(),
        }
    }

    /// Records `database_query_duration_seconds` and, for driver failures,
    /// `database_query_errors_total`. The result is passed through.
    pub fn observe<T>(self, result: Result<T, sqlx::Error>) -> Result<T, sqlx::Error> {
        let outcome = outcome(&result);
        histogram!(
            "database_query_duration_seconds",
            "table" => self.table.as_str(),
            "operation" => self.operation,
            "outcome" => outcome
        )
        .record(self.start.elapsed().as_secs_f64());

        if outcome == "error" {
            counter!(
                "database_query_errors_total",
                "table" => self.table.as_str(),
                "operation" => self.operation
            )
            .increment(1);
        }
        result
    }
}

/// Publishes connection pool gauges for the PostgreSQL backend.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size();
    let idle = u32::try_from(pool.num_idle()).unwrap_or(u32::MAX);
    let max = pool.options().get_max_connections();

    gauge!("storage_pool_connections", "backend" => "postgres", "state" => "active")
        .set(f64::from(size.saturating_sub(idle)));
    gauge!("storage_pool_connections", "backend" => "postgres", "state" => "idle")
        .set(f64::from(idle));
    gauge!("storage_pool_max_connections", "backend" => "postgres").set(f64::from(max));
}
