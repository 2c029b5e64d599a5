//! Partner domain model.
//!
//! Partners are organisations that apply to work with the community. The
//! resource mirrors registrations: public create, moderated read/update/delete.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::registration::{validate_status_value, RegistrationStatus};

/// Partner applications share the registration moderation states.
pub type PartnerStatus = RegistrationStatus;

/// A persisted partner application.
#[derive(Debug, Clone, PartialEq)]
pub struct Partner {
    pub id: Uuid,
    pub organization_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub partnership_type: Option<String>,
    pub message: Option<String>,
    pub status: PartnerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A normalized partner application ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPartner {
    pub organization_name: String,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub partnership_type: Option<String>,
    pub message: Option<String>,
    pub status: PartnerStatus,
}

/// Moderation changes for a partner application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartnerChanges {
    pub organization_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub partnership_type: Option<String>,
    pub message: Option<String>,
    pub status: Option<PartnerStatus>,
}

impl PartnerChanges {
    pub fn is_empty(&self) -> bool {
        self.organization_name.is_none()
            && self.contact_name.is_none()
            && self.phone.is_none()
            && self.country.is_none()
            && self.website.is_none()
            && self.partnership_type.is_none()
            && self.message.is_none()
            && self.status.is_none()
    }

    /// Applies the changes to a record in place and bumps `updated_at`.
    pub fn apply_to(self, record: &mut Partner, now: DateTime<Utc>) {
        if let Some(v) = self.organization_name {
            record.organization_name = v;
        }
        if let Some(v) = self.contact_name {
            record.contact_name = v;
        }
        if self.phone.is_some() {
            record.phone = self.phone;
        }
        if self.country.is_some() {
            record.country = self.country;
        }
        if self.website.is_some() {
            record.website = self.website;
        }
        if self.partnership_type.is_some() {
            record.partnership_type = self.partnership_type;
        }
        if self.message.is_some() {
            record.message = self.message;
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        record.updated_at = now.max(record.created_at);
    }
}

/// Externally visible partner shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerResponse {
    pub id: Uuid,
    pub organization_name: String,
    pub contact_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partnership_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub status: PartnerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Partner> for PartnerResponse {
    fn from(p: Partner) -> Self {
        Self {
            id: p.id,
            organization_name: p.organization_name,
            contact_name: p.contact_name,
            email: p.email,
            phone: p.phone,
            country: p.country,
            website: p.website,
            partnership_type: p.partnership_type,
            message: p.message,
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// Response for partner listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListPartnersResponse {
    pub partners: Vec<PartnerResponse>,
}

/// Request payload for moderating a partner application.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartnerRequest {
    pub organization_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub partnership_type: Option<String>,
    pub message: Option<String>,

    #[validate(custom(function = "validate_status_value"))]
    pub status: Option<String>,
}
