//! In-memory store implementations.
//!
//! Used when no database is configured and throughout the test suites. Every
//! operation holds a single lock, so reads observe all completed writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::StoreError;
use crate::models::{
    rank_countries, CountryCount, NewPartner, NewRegistration, PageCount, Partner,
    PartnerChanges, Registration, RegistrationChanges, VisitStats,
};
use crate::ports::{PartnerStore, RegistrationStore, VisitMetricsSource};
use crate::services::clock::{Clock, SystemClock};

/// Returns `now`, or `last` if the clock went backwards.
fn monotonic(now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    match last {
        Some(last) if last > now => last,
        _ => now,
    }
}

/// Registrations kept in insertion order (oldest first).
pub struct InMemoryRegistrationStore {
    records: RwLock<Vec<Registration>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            clock,
        }
    }
}

impl Default for InMemoryRegistrationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn insert(&self, new: NewRegistration) -> Result<Registration, StoreError> {
        let mut records = self.records.write().await;
        let created_at = monotonic(self.clock.now(), records.last().map(|r| r.created_at));
        let record = Registration {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            whatsapp_contact: new.whatsapp_contact,
            country_of_origin: new.country_of_origin,
            country_of_residence: new.country_of_residence,
            group_type: new.group_type,
            location: new.location,
            ip_address: new.ip_address,
            user_agent: new.user_agent,
            status: new.status,
            created_at,
            updated_at: created_at,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Registration>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Registration>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().rev().cloned().collect())
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Registration>, StoreError> {
        let records = self.records.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn count_all(&self) -> Result<i64, StoreError> {
        Ok(self.records.read().await.len() as i64)
    }

    async fn count_since(&self, since: DateTime<Utc>) -> Result<i64, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.created_at >= since).count() as i64)
    }

    async fn top_countries(&self, limit: usize) -> Result<Vec<CountryCount>, StoreError> {
        let records = self.records.read().await;
        Ok(rank_countries(
            records
                .iter()
                .rev()
                .map(|r| Some(r.country_of_residence.as_str())),
            limit,
        ))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: RegistrationChanges,
    ) -> Result<Registration, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        changes.apply_to(record, self.clock.now());
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}

/// Partner applications kept in insertion order (oldest first).
pub struct InMemoryPartnerStore {
    records: RwLock<Vec<Partner>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryPartnerStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            clock,
        }
    }
}

impl Default for InMemoryPartnerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PartnerStore for InMemoryPartnerStore {
    async fn insert(&self, new: NewPartner) -> Result<Partner, StoreError> {
        let mut records = self.records.write().await;
        let created_at = monotonic(self.clock.now(), records.last().map(|r| r.created_at));
        let record = Partner {
            id: Uuid::new_v4(),
            organization_name: new.organization_name,
            contact_name: new.contact_name,
            email: new.email,
            phone: new.phone,
            country: new.country,
            website: new.website,
            partnership_type: new.partnership_type,
            message: new.message,
            status: new.status,
            created_at,
            updated_at: created_at,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Partner>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Partner>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().rev().cloned().collect())
    }

    async fn update(&self, id: Uuid, changes: PartnerChanges) -> Result<Partner, StoreError> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)?;
        changes.apply_to(record, self.clock.now());
        Ok(record.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }
}

/// Visit log kept as `(page, visited_at)` pairs.
pub struct InMemoryVisitLog {
    visits: RwLock<Vec<(String, DateTime<Utc>)>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryVisitLog {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            visits: RwLock::new(Vec::new()),
            clock,
        }
    }
}

impl Default for InMemoryVisitLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisitMetricsSource for InMemoryVisitLog {
    async fn record_visit(&self, page: &str) -> Result<(), StoreError> {
        let now = self.clock.now();
        self.visits.write().await.push((page.to_string(), now));
        Ok(())
    }

    async fn visit_stats(
        &self,
        since: DateTime<Utc>,
        top_n: usize,
    ) -> Result<VisitStats, StoreError> {
        let visits = self.visits.read().await;

        let mut order: HashMap<&str, usize> = HashMap::new();
        let mut pages: Vec<PageCount> = Vec::new();
        for (page, _) in visits.iter().rev() {
            match order.get(page.as_str()) {
                Some(&idx) => pages[idx].count += 1,
                None => {
                    order.insert(page.as_str(), pages.len());
                    pages.push(PageCount {
                        page: page.clone(),
                        count: 1,
                    });
                }
            }
        }
        pages.sort_by(|a, b| b.count.cmp(&a.count));
        pages.truncate(top_n);

        Ok(VisitStats {
            total_visits: visits.len() as i64,
            today_visits: visits.iter().filter(|(_, at)| *at >= since).count() as i64,
            top_pages: pages,
        })
    }
}
