//! Background jobs.

mod prune_rate_limit;
mod scheduler;

pub use prune_rate_limit::PruneRateLimitJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
