//! Domain services for the community registry.
//!
//! Services hold the intake and analytics logic and depend only on the
//! storage ports, never on a concrete backend.

pub mod clock;
pub mod partner_intake;
pub mod rate_limit;
pub mod registration_intake;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use partner_intake::{partner_changes, PartnerIntake, PARTNER_RATE_KEY_PREFIX};
pub use rate_limit::{RateDecision, RateLimitPolicy, RateLimiter, UNKNOWN_CLIENT};
pub use registration_intake::{
    registration_changes, IntakeOptions, RegistrationIntake, SubmissionContext,
    REQUIRED_REGISTRATION_FIELDS,
};
pub use stats::{StatsService, StatsWindows, TOP_PAGES_LIMIT};
