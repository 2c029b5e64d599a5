//! Domain models for the community registry.

pub mod partner;
pub mod registration;
pub mod stats;
pub mod visit;

pub use partner::{
    ListPartnersResponse, NewPartner, Partner, PartnerChanges, PartnerResponse, PartnerStatus,
    UpdatePartnerRequest,
};
pub use registration::{
    GroupType, ListRegistrationsResponse, NewRegistration, Registration, RegistrationChanges,
    RegistrationResponse, RegistrationStatus, UpdateRegistrationRequest,
};
pub use stats::{
    rank_countries, CountryCount, RecentActivity, StatsSnapshot, RECENT_ACTIVITY_LIMIT,
    TOP_COUNTRIES_LIMIT, UNKNOWN_COUNTRY,
};
pub use visit::{PageCount, RecordVisitRequest, VisitStats, MAX_PAGE_LEN};
