//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod partner;
pub mod registration;
pub mod site_visit;

pub use partner::PartnerEntity;
pub use registration::{CountryCountEntity, RegistrationEntity};
pub use site_visit::{PageCountEntity, VisitTotalsEntity};
