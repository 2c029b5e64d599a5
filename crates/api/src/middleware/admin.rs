//! Shared admin key middleware.
//!
//! Moderation endpoints are guarded by a single shared key sent in the
//! `X-Admin-Key` header. When no key is configured the guard is a no-op.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::error::ApiError;

/// Header carrying the shared admin key.
pub const ADMIN_KEY_HEADER: &str = "X-Admin-Key";

/// Compares two byte strings without short-circuiting on the first mismatch.
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

/// Rejects the request with 401 unless it carries the configured admin key.
pub async fn require_admin_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.config.admin_key() else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();

    if keys_match(provided, expected.as_bytes()) {
        next.run(req).await
    } else {
        tracing::debug!(path = %req.uri().path(), "Rejected request without valid admin key");
        ApiError::Unauthorized("Invalid or missing admin key".into()).into_response()
    }
}

/// True when the request carries the configured admin key, or when none is
/// configured. Used by handlers that mix public and moderated behaviour.
pub fn has_admin_access(state: &AppState, headers: &axum::http::HeaderMap) -> bool {
    match state.config.admin_key() {
        None => true,
        Some(expected) => headers
            .get(ADMIN_KEY_HEADER)
            .map(|v| keys_match(v.as_bytes(), expected.as_bytes()))
            .unwrap_or(false),
    }
}
