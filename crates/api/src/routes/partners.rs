//! Partner application endpoint handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::ClientIdentity;
use crate::middleware::admin::has_admin_access;
use crate::routes::registrations::json_object;
use domain::models::{ListPartnersResponse, PartnerResponse, UpdatePartnerRequest};
use domain::services::partner_changes;

/// Submit a partner application.
///
/// POST /api/v1/partners
pub async fn create_partner(
    State(state): State<AppState>,
    identity: ClientIdentity,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<PartnerResponse>), ApiError> {
    let fields = json_object(body)?;
    let record = state
        .partner_intake
        .submit(fields, &identity.submission_context())
        .await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// List partner applications newest first.
///
/// GET /api/v1/partners
pub async fn list_partners(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ListPartnersResponse>, ApiError> {
    if !has_admin_access(&state, &headers) {
        return Err(ApiError::Unauthorized("Invalid or missing admin key".into()));
    }

    let partners = state.stores.partners.list_all().await?;
    Ok(Json(ListPartnersResponse {
        partners: partners.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/partners/:id
pub async fn get_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PartnerResponse>, ApiError> {
    let record = state
        .stores
        .partners
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Partner not found".into()))?;

    Ok(Json(record.into()))
}

/// PATCH /api/v1/partners/:id
pub async fn update_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdatePartnerRequest>, JsonRejection>,
) -> Result<Json<PartnerResponse>, ApiError> {
    let Json(request) = body?;
    request.validate()?;

    let changes = partner_changes(request)?;
    if changes.is_empty() {
        return Err(ApiError::validation("No fields to update"));
    }

    let record = state.stores.partners.update(id, changes).await?;

    info!(partner_id = %id, "Partner updated");
    Ok(Json(record.into()))
}

/// DELETE /api/v1/partners/:id
pub async fn delete_partner(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.stores.partners.delete(id).await? {
        info!(partner_id = %id, "Partner deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Partner not found".into()))
    }
}
