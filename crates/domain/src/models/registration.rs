//! Registration domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Community cohort. Each cohort is routed to its own downstream channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Local,
    Diaspora,
}

impl GroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Local => "local",
            GroupType::Diaspora => "diaspora",
        }
    }

    /// Resolves a submitted value, falling back to `Diaspora` for anything
    /// unrecognized or absent.
    pub fn resolve_lenient(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(GroupType::Diaspora)
    }
}

impl FromStr for GroupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(GroupType::Local),
            "diaspora" => Ok(GroupType::Diaspora),
            other => Err(format!("Invalid group type: {}", other)),
        }
    }
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation status. Only changed by a moderation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Active,
    Verified,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Active => "active",
            RegistrationStatus::Verified => "verified",
        }
    }
}

impl FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RegistrationStatus::Pending),
            "active" => Ok(RegistrationStatus::Active),
            "verified" => Ok(RegistrationStatus::Verified),
            other => Err(format!("Invalid status: {}", other)),
        }
    }
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub whatsapp_contact: String,
    pub country_of_origin: String,
    pub country_of_residence: String,
    pub group_type: GroupType,
    /// Opaque location bag (city, country, timezone, coordinates and
    /// cohort-specific extras). Passed through unvalidated.
    pub location: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A normalized registration ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    pub whatsapp_contact: String,
    pub country_of_origin: String,
    pub country_of_residence: String,
    pub group_type: GroupType,
    pub location: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: RegistrationStatus,
}

/// Moderation changes applied to an existing registration.
///
/// `group_type`, `email` and `created_at` cannot be changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationChanges {
    pub name: Option<String>,
    pub whatsapp_contact: Option<String>,
    pub country_of_origin: Option<String>,
    pub country_of_residence: Option<String>,
    pub location: Option<serde_json::Value>,
    pub status: Option<RegistrationStatus>,
}

impl RegistrationChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.whatsapp_contact.is_none()
            && self.country_of_origin.is_none()
            && self.country_of_residence.is_none()
            && self.location.is_none()
            && self.status.is_none()
    }

    /// The new status when nothing else changes.
    pub fn status_only(&self) -> Option<RegistrationStatus> {
        let rest_empty = self.name.is_none()
            && self.whatsapp_contact.is_none()
            && self.country_of_origin.is_none()
            && self.country_of_residence.is_none()
            && self.location.is_none();
        self.status.filter(|_| rest_empty)
    }

    /// Applies the changes to a record in place and bumps `updated_at`.
    pub fn apply_to(self, record: &mut Registration, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(contact) = self.whatsapp_contact {
            record.whatsapp_contact = contact;
        }
        if let Some(origin) = self.country_of_origin {
            record.country_of_origin = origin;
        }
        if let Some(residence) = self.country_of_residence {
            record.country_of_residence = residence;
        }
        if let Some(location) = self.location {
            record.location = Some(location);
        }
        if let Some(status) = self.status {
            record.status = status;
        }
        record.updated_at = now.max(record.created_at);
    }
}

/// Externally visible registration shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub whatsapp_contact: String,
    pub country_of_origin: String,
    pub country_of_residence: String,
    pub group_type: GroupType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Registration> for RegistrationResponse {
    fn from(r: Registration) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            whatsapp_contact: r.whatsapp_contact,
            country_of_origin: r.country_of_origin,
            country_of_residence: r.country_of_residence,
            group_type: r.group_type,
            location: r.location,
            ip_address: r.ip_address,
            user_agent: r.user_agent,
            status: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Response for registration listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListRegistrationsResponse {
    pub registrations: Vec<RegistrationResponse>,
}

/// Request payload for moderating a registration.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRegistrationRequest {
    pub name: Option<String>,
    pub whatsapp_contact: Option<String>,
    pub country_of_origin: Option<String>,
    pub country_of_residence: Option<String>,
    pub location: Option<serde_json::Value>,

    #[validate(custom(function = "validate_status_value"))]
    pub status: Option<String>,
}

/// Validates a moderation status string against the fixed enum.
pub fn validate_status_value(status: &str) -> Result<(), validator::ValidationError> {
    match status.parse::<RegistrationStatus>() {
        Ok(_) => Ok(()),
        Err(_) => {
            let mut err = validator::ValidationError::new("invalid_status");
            err.message = Some("Status must be one of: pending, active, verified".into());
            Err(err)
        }
    }
}
