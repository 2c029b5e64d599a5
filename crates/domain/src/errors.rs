//! Domain error types.

use thiserror::Error;

/// Failure of a backing store call.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("record not found")]
    NotFound,

    /// The storage backend itself failed. The message is for logs only.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Errors surfaced by the intake and stats services.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing or malformed input. Always recoverable by the caller.
    #[error("{message}")]
    Validation {
        message: String,
        missing: Vec<String>,
    },

    /// The caller exceeded its submission window.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The caller referenced a record that does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The backing store failed.
    #[error(transparent)]
    Store(StoreError),

    /// A best-effort metric could not be computed.
    #[error("secondary metric unavailable: {0}")]
    SecondaryMetric(String),
}

impl DomainError {
    /// Validation failure that lists missing field names.
    pub fn missing_fields(missing: Vec<String>) -> Self {
        DomainError::Validation {
            message: format!("Missing required fields: {}", missing.join(", ")),
            missing,
        }
    }

    /// Validation failure with a message only.
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::Validation {
            message: message.into(),
            missing: Vec::new(),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => DomainError::NotFound("Record"),
            other => DomainError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_message_lists_names() {
        let err = DomainError::missing_fields(vec!["name".into(), "email".into()]);
        assert_eq!(err.to_string(), "Missing required fields: name, email");
        match err {
            DomainError::Validation { missing, .. } => assert_eq!(missing, vec!["name", "email"]),
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err: DomainError = StoreError::NotFound.into();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn test_store_backend_maps_to_store() {
        let err: DomainError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, DomainError::Store(StoreError::Backend(_))));
    }

    #[test]
    fn test_rate_limited_display() {
        let err = DomainError::RateLimited {
            retry_after_secs: 42,
        };
        assert_eq!(err.to_string(), "rate limited, retry after 42s");
    }
}
