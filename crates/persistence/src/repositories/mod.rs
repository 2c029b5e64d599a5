//! Repository implementations for the domain storage ports.

pub mod partner;
pub mod registration;
pub mod site_visit;

pub use partner::PgPartnerRepository;
pub use registration::PgRegistrationRepository;
pub use site_visit::PgVisitRepository;

use domain::errors::StoreError;
use tracing::error;

/// Converts a driver error into the domain store error. Row-not-found maps
/// to [`StoreError::NotFound`]; everything else is logged and kept opaque.
pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => {
            error!(error = %other, "Database query failed");
            StoreError::Backend(other.to_string())
        }
    }
}
