//! Site visit tracking.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use shared::validation::{sanitize_text, truncate};
use tracing::debug;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::{RecordVisitRequest, MAX_PAGE_LEN};

/// Record a page view. A no-op when visit stats are disabled.
///
/// POST /api/v1/visits
pub async fn record_visit(
    State(state): State<AppState>,
    body: Result<Json<RecordVisitRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = body?;
    request.validate()?;

    let page = truncate(&sanitize_text(&request.page), MAX_PAGE_LEN);
    if page.is_empty() {
        return Err(ApiError::validation("Page is required"));
    }

    if state.config.stats.visit_stats_enabled {
        state.stores.visits.record_visit(&page).await?;
        debug!(page = %page, "Visit recorded");
    }

    Ok(StatusCode::NO_CONTENT)
}
