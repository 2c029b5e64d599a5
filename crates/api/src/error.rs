use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use domain::errors::{DomainError, StoreError};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        missing: Vec<String>,
        details: Vec<ValidationDetail>,
    },

    #[error("Rate limited")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            missing: Vec::new(),
            details: Vec::new(),
        }
    }

    /// Label used for the `registrations_rejected_total` metric.
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::Validation { missing, .. } if !missing.is_empty() => "missing_fields",
            ApiError::Validation { .. } => "validation",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::Internal(_) => "store_error",
            ApiError::ServiceUnavailable(_) => "unavailable",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = ErrorBody {
            error: String::new(),
            message: String::new(),
            missing: None,
            retry_after: None,
            details: None,
        };

        let status = match self {
            ApiError::Unauthorized(msg) => {
                body.error = "unauthorized".into();
                body.message = msg;
                StatusCode::UNAUTHORIZED
            }
            ApiError::NotFound(msg) => {
                body.error = "not_found".into();
                body.message = msg;
                StatusCode::NOT_FOUND
            }
            ApiError::Validation {
                message,
                missing,
                details,
            } => {
                body.error = "validation_error".into();
                body.message = message;
                body.missing = (!missing.is_empty()).then_some(missing);
                body.details = (!details.is_empty()).then_some(details);
                StatusCode::BAD_REQUEST
            }
            ApiError::RateLimited { retry_after_secs } => {
                body.error = "rate_limit_exceeded".into();
                body.message = format!(
                    "Too many submissions. Please try again in {} seconds.",
                    retry_after_secs
                );
                body.retry_after = Some(retry_after_secs);
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                response.headers_mut().insert(
                    header::RETRY_AFTER,
                    HeaderValue::from(retry_after_secs),
                );
                return response;
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                body.error = "internal_error".into();
                body.message = "An internal error occurred".into();
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::ServiceUnavailable(msg) => {
                body.error = "service_unavailable".into();
                body.message = msg;
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation { message, missing } => ApiError::Validation {
                message,
                missing,
                details: Vec::new(),
            },
            DomainError::RateLimited { retry_after_secs } => {
                ApiError::RateLimited { retry_after_secs }
            }
            DomainError::NotFound(what) => ApiError::NotFound(format!("{} not found", what)),
            DomainError::Store(e) => ApiError::Internal(e.to_string()),
            DomainError::SecondaryMetric(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        DomainError::from(err).into()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(rejection = %rejection.body_text(), "Rejected request body");
        let message = match rejection {
            JsonRejection::JsonDataError(_) => "Request body has fields of the wrong type",
            JsonRejection::JsonSyntaxError(_) => "Request body is not valid JSON",
            JsonRejection::MissingJsonContentType(_) => "Expected Content-Type: application/json",
            _ => "Invalid request body",
        };
        ApiError::validation(message)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<ValidationDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| ValidationDetail {
                    field: field.to_string(),
                    message: e.message.clone().map(|m| m.to_string()).unwrap_or_default(),
                })
            })
            .collect();

        let message = if details.len() == 1 {
            details[0].message.clone()
        } else {
            format!("{} validation errors", details.len())
        };

        ApiError::Validation {
            message,
            missing: Vec::new(),
            details,
        }
    }
}
