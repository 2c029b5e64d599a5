//! Partner application pipeline.

use serde_json::{Map, Value};
use shared::validation::{
    check_required, is_valid_email, sanitize_fields, sanitize_text, string_field, truncate,
};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::errors::DomainError;
use crate::models::{NewPartner, Partner, PartnerChanges, PartnerStatus, UpdatePartnerRequest};
use crate::ports::PartnerStore;
use crate::services::rate_limit::RateLimiter;
use crate::services::registration_intake::{
    SubmissionContext, MAX_CONTACT_LEN, MAX_COUNTRY_LEN, MAX_EMAIL_LEN, MAX_NAME_LEN,
};

pub const REQUIRED_PARTNER_FIELDS: [&str; 3] = ["organizationName", "contactName", "email"];

pub const MAX_WEBSITE_LEN: usize = 255;
pub const MAX_PARTNERSHIP_TYPE_LEN: usize = 100;
pub const MAX_MESSAGE_LEN: usize = 2000;

/// Prefix separating partner submissions from registrations in the shared
/// rate limiter.
pub const PARTNER_RATE_KEY_PREFIX: &str = "partner:";

/// Accepts partner applications.
#[derive(Clone)]
pub struct PartnerIntake {
    store: Arc<dyn PartnerStore>,
    limiter: Arc<RateLimiter>,
}

impl PartnerIntake {
    pub fn new(store: Arc<dyn PartnerStore>, limiter: Arc<RateLimiter>) -> Self {
        Self { store, limiter }
    }

    pub async fn submit(
        &self,
        fields: Map<String, Value>,
        ctx: &SubmissionContext,
    ) -> Result<Partner, DomainError> {
        let fields = sanitize_fields(fields);

        let key = format!("{}{}", PARTNER_RATE_KEY_PREFIX, ctx.client_id);
        if let Err(retry_after_secs) = self.limiter.check(&key) {
            info!(client_id = %ctx.client_id, retry_after_secs, "Partner application rate limited");
            return Err(DomainError::RateLimited { retry_after_secs });
        }

        let required = check_required(&fields, &REQUIRED_PARTNER_FIELDS);
        if !required.valid {
            debug!(missing = ?required.missing, "Partner application missing required fields");
            return Err(DomainError::missing_fields(required.missing));
        }

        let new = normalize_partner(&fields)?;

        let record = self.store.insert(new).await.map_err(|e| {
            error!(error = %e, "Failed to persist partner application");
            DomainError::from(e)
        })?;

        info!(partner_id = %record.id, "Partner application accepted");
        Ok(record)
    }
}

fn optional(fields: &Map<String, Value>, name: &str, max: usize) -> Option<String> {
    string_field(fields, name).map(|v| truncate(&v, max))
}

/// Builds the record to insert from sanitized fields.
pub fn normalize_partner(fields: &Map<String, Value>) -> Result<NewPartner, DomainError> {
    let email = string_field(fields, "email").unwrap_or_default();
    if !is_valid_email(&email) {
        return Err(DomainError::invalid("Invalid email format"));
    }

    Ok(NewPartner {
        organization_name: truncate(
            &string_field(fields, "organizationName").unwrap_or_default(),
            MAX_NAME_LEN,
        ),
        contact_name: truncate(
            &string_field(fields, "contactName").unwrap_or_default(),
            MAX_NAME_LEN,
        ),
        email: truncate(&email.to_lowercase(), MAX_EMAIL_LEN),
        phone: optional(fields, "phone", MAX_CONTACT_LEN),
        country: optional(fields, "country", MAX_COUNTRY_LEN),
        website: optional(fields, "website", MAX_WEBSITE_LEN),
        partnership_type: optional(fields, "partnershipType", MAX_PARTNERSHIP_TYPE_LEN),
        message: optional(fields, "message", MAX_MESSAGE_LEN),
        status: PartnerStatus::Pending,
    })
}

/// Converts a validated moderation request into store changes.
pub fn partner_changes(req: UpdatePartnerRequest) -> Result<PartnerChanges, DomainError> {
    let clean = |value: Option<String>, max: usize| {
        value
            .map(|v| truncate(&sanitize_text(&v), max))
            .filter(|v| !v.is_empty())
    };

    let status = match req.status.as_deref() {
        Some(s) => Some(s.parse::<PartnerStatus>().map_err(DomainError::invalid)?),
        None => None,
    };

    Ok(PartnerChanges {
        organization_name: clean(req.organization_name, MAX_NAME_LEN),
        contact_name: clean(req.contact_name, MAX_NAME_LEN),
        phone: clean(req.phone, MAX_CONTACT_LEN),
        country: clean(req.country, MAX_COUNTRY_LEN),
        website: clean(req.website, MAX_WEBSITE_LEN),
        partnership_type: clean(req.partnership_type, MAX_PARTNERSHIP_TYPE_LEN),
        message: clean(req.message, MAX_MESSAGE_LEN),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryPartnerStore;
    use crate::services::clock::ManualClock;
    use crate::services::rate_limit::RateLimitPolicy;
    use chrono::Duration;
    use serde_json::json;

    fn submission() -> Map<String, Value> {
        match json!({
            "organizationName": "Harvest Trust",
            "contactName": "Kofi Mensah",
            "email": "KOFI@harvest.org",
            "website": "https://harvest.org",
            "message": "m".repeat(2500)
        }) {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    fn ctx() -> SubmissionContext {
        SubmissionContext {
            client_id: "9.9.9.9".into(),
            ..Default::default()
        }
    }

    fn build_intake(limiter: Arc<RateLimiter>) -> (PartnerIntake, Arc<InMemoryPartnerStore>) {
        let store = Arc::new(InMemoryPartnerStore::new());
        (PartnerIntake::new(store.clone(), limiter), store)
    }

    fn limiter(max: u32) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(
            RateLimitPolicy::new(max, Duration::seconds(60)),
            Arc::new(ManualClock::default()),
        ))
    }

    #[tokio::test]
    async fn test_submit_normalizes_partner() {
        let (intake, store) = build_intake(limiter(5));
        let partner = intake.submit(submission(), &ctx()).await.unwrap();

        assert_eq!(partner.email, "kofi@harvest.org");
        assert_eq!(partner.status, PartnerStatus::Pending);
        assert_eq!(partner.message.as_ref().map(|m| m.len()), Some(MAX_MESSAGE_LEN));
        assert!(partner.phone.is_none());
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_missing_fields() {
        let (intake, store) = build_intake(limiter(5));
        let mut fields = submission();
        fields.remove("contactName");
        fields.insert("email".into(), json!(""));

        match intake.submit(fields, &ctx()).await {
            Err(DomainError::Validation { missing, .. }) => {
                assert_eq!(missing, vec!["contactName", "email"])
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partner_key_does_not_consume_registration_budget() {
        let shared = limiter(1);
        let (intake, _) = build_intake(shared.clone());

        intake.submit(submission(), &ctx()).await.unwrap();
        assert!(matches!(
            intake.submit(submission(), &ctx()).await,
            Err(DomainError::RateLimited { .. })
        ));
        assert!(shared.allow(&ctx().client_id).allowed);
    }

    #[test]
    fn test_partner_changes() {
        let changes = partner_changes(UpdatePartnerRequest {
            status: Some("active".into()),
            website: Some("   ".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.status, Some(PartnerStatus::Active));
        assert!(changes.website.is_none());
    }
}
