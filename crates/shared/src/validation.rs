//! Input sanitization and validation utilities.
//!
//! Everything in this module is a pure transform. Problems with the input are
//! reported through return values, never by panicking, so callers can collect
//! every missing field into a single response.

use serde_json::{Map, Value};
use validator::ValidationError;

lazy_static::lazy_static! {
    static ref SCRIPT_SCHEME_REGEX: regex::Regex =
        regex::Regex::new(r"(?i)javascript\s*:").unwrap();
    static ref EVENT_HANDLER_REGEX: regex::Regex =
        regex::Regex::new(r"(?i)\bon[a-z]+\s*=").unwrap();
    static ref EMAIL_REGEX: regex::Regex =
        regex::Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)+$").unwrap();
}

/// Result of a required-field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields {
    pub valid: bool,
    /// Missing field names, in the order they were requested.
    pub missing: Vec<String>,
}

/// Strips markup, script fragments and control characters from a single
/// string, then trims surrounding whitespace.
pub fn sanitize_text(input: &str) -> String {
    let without_controls: String = input.chars().filter(|c| !c.is_control()).collect();
    let without_markup = without_controls.replace(['<', '>'], "");
    let without_scheme = SCRIPT_SCHEME_REGEX.replace_all(&without_markup, "");
    let without_handlers = EVENT_HANDLER_REGEX.replace_all(&without_scheme, "");
    without_handlers.trim().to_string()
}

/// Sanitizes every string value of a JSON value, descending into nested
/// objects and arrays. Non-string scalars are returned unchanged.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(sanitize_fields(map)),
        other => other,
    }
}

/// Sanitizes every string value in a field map.
pub fn sanitize_fields(fields: Map<String, Value>) -> Map<String, Value> {
    fields
        .into_iter()
        .map(|(key, value)| (key, sanitize_value(value)))
        .collect()
}

/// A field counts as present only when [`string_field`] can read text from
/// it. Booleans, objects and arrays are missing.
fn is_missing(fields: &Map<String, Value>, name: &str) -> bool {
    string_field(fields, name).is_none()
}

/// Checks that every named field is present and non-blank.
pub fn check_required(fields: &Map<String, Value>, required: &[&str]) -> RequiredFields {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| is_missing(fields, name))
        .map(|name| name.to_string())
        .collect();

    RequiredFields {
        valid: missing.is_empty(),
        missing,
    }
}

/// Checks email shape: `local@domain.tld`, no whitespace, one `@`, and at
/// least one dot in the domain with non-empty labels.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// Validator-compatible wrapper around [`is_valid_email`].
pub fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        let mut err = ValidationError::new("email_shape");
        err.message = Some("Invalid email format".into());
        Err(err)
    }
}

/// Truncates to at most `max_chars` characters, never splitting a character.
pub fn truncate(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => input[..byte_idx].to_string(),
        None => input.to_string(),
    }
}

/// Reads a string field from a field map, treating blank strings as absent.
pub fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    match fields.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
