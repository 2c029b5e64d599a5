//! Registration submission pipeline.
//!
//! A submission moves through sanitize, rate check, required fields, email
//! shape, normalization and a single store insert. Any step can reject it,
//! and nothing is persisted unless every step before the insert succeeded.

use serde_json::{Map, Value};
use shared::validation::{
    check_required, is_valid_email, sanitize_fields, sanitize_text, string_field, truncate,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::errors::DomainError;
use crate::models::{
    GroupType, NewRegistration, Registration, RegistrationChanges, RegistrationStatus,
    UpdateRegistrationRequest,
};
use crate::ports::RegistrationStore;
use crate::services::rate_limit::RateLimiter;

/// Fields every registration must carry, in reporting order.
pub const REQUIRED_REGISTRATION_FIELDS: [&str; 4] =
    ["name", "email", "whatsappContact", "countryOfResidence"];

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_CONTACT_LEN: usize = 50;
pub const MAX_COUNTRY_LEN: usize = 100;
pub const MAX_USER_AGENT_LEN: usize = 500;

/// Network facts about the caller, gathered by the transport layer.
#[derive(Debug, Clone, Default)]
pub struct SubmissionContext {
    /// Rate-limit key. See [`crate::services::rate_limit::UNKNOWN_CLIENT`].
    pub client_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Pipeline behaviour switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntakeOptions {
    /// Reject unrecognized `groupType` values instead of defaulting to
    /// diaspora.
    pub strict_group_type: bool,
}

/// Accepts public registration submissions.
#[derive(Clone)]
pub struct RegistrationIntake {
    store: Arc<dyn RegistrationStore>,
    limiter: Arc<RateLimiter>,
    options: IntakeOptions,
}

impl RegistrationIntake {
    pub fn new(
        store: Arc<dyn RegistrationStore>,
        limiter: Arc<RateLimiter>,
        options: IntakeOptions,
    ) -> Self {
        Self {
            store,
            limiter,
            options,
        }
    }

    /// Runs a raw submission through the pipeline and persists it.
    pub async fn submit(
        &self,
        fields: Map<String, Value>,
        ctx: &SubmissionContext,
    ) -> Result<Registration, DomainError> {
        let fields = sanitize_fields(fields);

        if let Err(retry_after_secs) = self.limiter.check(&ctx.client_id) {
            info!(
                client_id = %ctx.client_id,
                retry_after_secs,
                "Registration rejected by rate limiter"
            );
            return Err(DomainError::RateLimited { retry_after_secs });
        }

        let required = check_required(&fields, &REQUIRED_REGISTRATION_FIELDS);
        if !required.valid {
            debug!(missing = ?required.missing, "Registration missing required fields");
            return Err(DomainError::missing_fields(required.missing));
        }

        let new = normalize_registration(&fields, ctx, self.options)?;

        let record = self.store.insert(new).await.map_err(|e| {
            error!(error = %e, "Failed to persist registration");
            DomainError::from(e)
        })?;

        info!(
            registration_id = %record.id,
            group_type = %record.group_type,
            "Registration accepted"
        );

        Ok(record)
    }
}

/// Builds the record to insert from sanitized fields that passed the
/// required-field check.
pub fn normalize_registration(
    fields: &Map<String, Value>,
    ctx: &SubmissionContext,
    options: IntakeOptions,
) -> Result<NewRegistration, DomainError> {
    let email = string_field(fields, "email").unwrap_or_default();
    if !is_valid_email(&email) {
        debug!("Registration email failed shape check");
        return Err(DomainError::invalid("Invalid email format"));
    }

    let group_type = resolve_group_type(fields.get("groupType"), options)?;

    let residence = string_field(fields, "countryOfResidence").unwrap_or_default();
    let origin = string_field(fields, "countryOfOrigin").unwrap_or_else(|| residence.clone());

    let location = match fields.get("location") {
        Some(Value::Object(bag)) => Some(Value::Object(bag.clone())),
        _ => None,
    };

    Ok(NewRegistration {
        name: truncate(
            &string_field(fields, "name").unwrap_or_default(),
            MAX_NAME_LEN,
        ),
        email: truncate(&email.to_lowercase(), MAX_EMAIL_LEN),
        whatsapp_contact: truncate(
            &string_field(fields, "whatsappContact").unwrap_or_default(),
            MAX_CONTACT_LEN,
        ),
        country_of_origin: truncate(&origin, MAX_COUNTRY_LEN),
        country_of_residence: truncate(&residence, MAX_COUNTRY_LEN),
        group_type,
        location,
        ip_address: ctx.ip_address.clone(),
        user_agent: ctx
            .user_agent
            .as_deref()
            .map(|ua| truncate(ua, MAX_USER_AGENT_LEN)),
        status: RegistrationStatus::Pending,
    })
}

fn resolve_group_type(
    value: Option<&Value>,
    options: IntakeOptions,
) -> Result<GroupType, DomainError> {
    let raw = value.and_then(Value::as_str).filter(|s| !s.trim().is_empty());
    if !options.strict_group_type {
        return Ok(GroupType::resolve_lenient(raw));
    }
    match raw {
        Some(v) => v
            .parse()
            .map_err(|_| DomainError::invalid("groupType must be one of: local, diaspora")),
        None => Err(DomainError::invalid("groupType is required")),
    }
}

/// Converts a validated moderation request into store changes. Free text is
/// sanitized and truncated like a submission.
pub fn registration_changes(
    req: UpdateRegistrationRequest,
) -> Result<RegistrationChanges, DomainError> {
    let clean = |value: Option<String>, max: usize| {
        value
            .map(|v| truncate(&sanitize_text(&v), max))
            .filter(|v| !v.is_empty())
    };

    let status = match req.status.as_deref() {
        Some(s) => Some(s.parse::<RegistrationStatus>().map_err(DomainError::invalid)?),
        None => None,
    };

    let location = match req.location {
        Some(Value::Object(bag)) => Some(shared::validation::sanitize_value(Value::Object(bag))),
        Some(Value::Null) | None => None,
        Some(_) => return Err(DomainError::invalid("location must be an object")),
    };

    Ok(RegistrationChanges {
        name: clean(req.name, MAX_NAME_LEN),
        whatsapp_contact: clean(req.whatsapp_contact, MAX_CONTACT_LEN),
        country_of_origin: clean(req.country_of_origin, MAX_COUNTRY_LEN),
        country_of_residence: clean(req.country_of_residence, MAX_COUNTRY_LEN),
        location,
        status,
    })
}
