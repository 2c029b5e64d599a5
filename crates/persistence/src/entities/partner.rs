//! Partner entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Partner, PartnerStatus};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the partners table.
#[derive(Debug, Clone, FromRow)]
pub struct PartnerEntity {
    pub id: Uuid,
    pub organization_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub partnership_type: Option<String>,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PartnerEntity> for Partner {
    fn from(entity: PartnerEntity) -> Self {
        Self {
            id: entity.id,
            organization_name: entity.organization_name,
            contact_name: entity.contact_name,
            email: entity.email,
            phone: entity.phone,
            country: entity.country,
            website: entity.website,
            partnership_type: entity.partnership_type,
            message: entity.message,
            status: entity.status.parse::<PartnerStatus>().unwrap_or_default(),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
