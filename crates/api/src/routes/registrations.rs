//! Registration endpoint handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ClientIdentity;
use crate::middleware::admin::has_admin_access;
use crate::middleware::metrics::{record_registration_rejected, record_registration_submitted};
use domain::models::{
    ListRegistrationsResponse, RegistrationResponse, UpdateRegistrationRequest,
};
use domain::services::registration_changes;

/// Query parameters for registration listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListRegistrationsQuery {
    pub stats: Option<String>,
}

impl ListRegistrationsQuery {
    /// `?stats`, `?stats=true` and `?stats=1` all request the snapshot.
    pub fn wants_stats(&self) -> bool {
        match self.stats.as_deref().map(str::trim) {
            None => false,
            Some(v) => v.is_empty() || v.eq_ignore_ascii_case("true") || v == "1",
        }
    }
}

/// Unwraps a JSON body into a field map, rejecting anything but an object.
pub(crate) fn json_object(
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Map<String, Value>, ApiError> {
    match body {
        Ok(Json(Value::Object(fields))) => Ok(fields),
        Ok(Json(_)) => Err(ApiError::validation("Request body must be a JSON object")),
        Err(rejection) => Err(rejection.into()),
    }
}

/// Submit a registration.
///
/// POST /api/v1/registrations
pub async fn create_registration(
    State(state): State<AppState>,
    identity: ClientIdentity,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<RegistrationResponse>), ApiError> {
    let result = async {
        let fields = json_object(body)?;
        let record = state
            .registration_intake
            .submit(fields, &identity.submission_context())
            .await?;
        Ok::<_, ApiError>(record)
    }
    .await;

    match result {
        Ok(record) => {
            record_registration_submitted(record.group_type.as_str());
            Ok((StatusCode::CREATED, Json(record.into())))
        }
        Err(e) => {
            record_registration_rejected(e.reason());
            Err(e)
        }
    }
}

/// List registrations newest first, or the statistics snapshot with
/// `?stats=true`. The plain list is moderated.
///
/// GET /api/v1/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<Response, ApiError> {
    if query.wants_stats() {
        let snapshot = state.stats.compute_stats().await?;
        return Ok(Json(snapshot).into_response());
    }

    if !has_admin_access(&state, &headers) {
        return Err(ApiError::Unauthorized("Invalid or missing admin key".into()));
    }

    let registrations = state.stores.registrations.list_all().await?;
    Ok(Json(ListRegistrationsResponse {
        registrations: registrations.into_iter().map(Into::into).collect(),
    })
    .into_response())
}

/// Fetch one registration.
///
/// GET /api/v1/registrations/:id
pub async fn get_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RegistrationResponse>, ApiError> {
    let record = state
        .stores
        .registrations
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".into()))?;

    Ok(Json(record.into()))
}

/// Moderate a registration.
///
/// PATCH /api/v1/registrations/:id
pub async fn update_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateRegistrationRequest>, JsonRejection>,
) -> Result<Json<RegistrationResponse>, ApiError> {
    let Json(request) = body?;
    request.validate()?;

    let changes = registration_changes(request)?;
    if changes.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }
    let status = changes.status;

    let store = &state.stores.registrations;
    let record = match changes.status_only() {
        Some(status) => store.update_status(id, status).await?,
        None => store.update(id, changes).await?,
    };

    info!(registration_id = %id, status = ?status, "Registration updated");
    Ok(Json(record.into()))
}

/// Delete a registration.
///
/// DELETE /api/v1/registrations/:id
pub async fn delete_registration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.stores.registrations.delete(id).await? {
        info!(registration_id = %id, "Registration deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Registration not found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_stats() {
        let query = |v: Option<&str>| ListRegistrationsQuery {
            stats: v.map(str::to_string),
        };
        assert!(!query(None).wants_stats());
        assert!(query(Some("true")).wants_stats());
        assert!(query(Some("TRUE")).wants_stats());
        assert!(query(Some("1")).wants_stats());
        assert!(query(Some("")).wants_stats());
        assert!(!query(Some("false")).wants_stats());
    }

    #[test]
    fn test_json_object_rejects_arrays() {
        let err = json_object(Ok(Json(serde_json::json!([1, 2])))).unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));

        let fields = json_object(Ok(Json(serde_json::json!({"name": "A"})))).unwrap();
        assert_eq!(fields["name"], "A");
    }
}
