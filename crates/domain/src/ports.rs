//! Storage ports.
//!
//! The services depend on these traits only, so the backing technology can be
//! swapped (PostgreSQL in production, in-memory for tests and local runs).
//! Implementations must give read-after-write consistency: a record is
//! visible to every read, including aggregates, as soon as `insert` returns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{
    CountryCount, NewPartner, NewRegistration, Partner, PartnerChanges, Registration,
    RegistrationChanges, RegistrationStatus, VisitStats,
};

/// Persistence for registrations.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Inserts a record. The store assigns `id`, `created_at` and `updated_at`.
    async fn insert(&self, new: NewRegistration) -> Result<Registration, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, StoreError>;

    /// All records, newest first.
    async fn list_all(&self) -> Result<Vec<Registration>, StoreError>;

    /// The `limit` most recent records, newest first.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Registration>, StoreError>;

    async fn count_all(&self) -> Result<i64, StoreError>;

    /// Number of records with `created_at >= since`.
    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, StoreError>;

    /// Country ranking over all records, see [`crate::models::rank_countries`].
    async fn top_countries(&self, limit: usize) -> Result<Vec<CountryCount>, StoreError>;

    /// Applies moderation changes. Fails with [`StoreError::NotFound`].
    async fn update(
        &self,
        id: Uuid,
        changes: RegistrationChanges,
    ) -> Result<Registration, StoreError>;

    async fn update_status(
        &self,
        id: Uuid,
        status: RegistrationStatus,
    ) -> Result<Registration, StoreError> {
        self.update(
            id,
            RegistrationChanges {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    /// Returns true if a record was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Persistence for partner applications.
#[async_trait]
pub trait PartnerStore: Send + Sync {
    async fn insert(&self, new: NewPartner) -> Result<Partner, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Partner>, StoreError>;

    /// All records, newest first.
    async fn list_all(&self) -> Result<Vec<Partner>, StoreError>;

    async fn update(&self, id: Uuid, changes: PartnerChanges) -> Result<Partner, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Independent source of site visit counters.
#[async_trait]
pub trait VisitMetricsSource: Send + Sync {
    async fn record_visit(&self, page: &str) -> Result<(), StoreError>;

    /// Totals, visits since `since`, and the `top_n` most visited pages.
    async fn visit_stats(
        &self,
        since: DateTime<Utc>,
        top_n: usize,
    ) -> Result<VisitStats, StoreError>;
}
