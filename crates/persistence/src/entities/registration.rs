//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{GroupType, Registration, RegistrationStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub whatsapp_contact: String,
    pub country_of_origin: String,
    pub country_of_residence: String,
    pub group_type: String,
    pub location: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RegistrationEntity> for Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            whatsapp_contact: entity.whatsapp_contact,
            country_of_origin: entity.country_of_origin,
            country_of_residence: entity.country_of_residence,
            // CHECK constraints keep both columns inside their enums.
            group_type: GroupType::resolve_lenient(Some(&entity.group_type)),
            location: entity.location,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
            status: entity.status.parse::<RegistrationStatus>().unwrap_or_default(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// `{country, count}` aggregate row.
#[derive(Debug, Clone, FromRow)]
pub struct CountryCountEntity {
    pub country: String,
    pub count: i64,
}

impl From<CountryCountEntity> for domain::models::CountryCount {
    fn from(entity: CountryCountEntity) -> Self {
        Self {
            country: entity.country,
            count: entity.count,
        }
    }
}
