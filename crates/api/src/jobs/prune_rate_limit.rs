//! Drops rate-limit windows that have expired.

use domain::services::RateLimiter;
use std::sync::Arc;
use tracing::debug;

use super::scheduler::{Job, JobFrequency};

pub struct PruneRateLimitJob {
    limiter: Arc<RateLimiter>,
}

impl PruneRateLimitJob {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

#[async_trait::async_trait]
impl Job for PruneRateLimitJob {
    fn name(&self) -> &'static str {
        "prune_rate_limit"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<(), String> {
        let removed = self.limiter.prune();
        debug!(
            removed,
            tracked = self.limiter.tracked_clients(),
            "Pruned rate-limit windows"
        );
        Ok(())
    }
}
