//! JSON body parsing with the service's client-facing validation messages.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::AppError;

pub const INVALID_JSON: &str = "Invalid JSON in request body";
pub const BODY_REQUIRED: &str = "Request body is required";

/// Parses a raw request body into `T`.
///
/// A body that is not JSON is rejected with `INVALID_JSON`; an empty body or
/// an empty JSON value (`null`, `{}`, `[]`, `""`, `0`, `false`) is rejected
/// with `empty_message`.
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8], empty_message: &str) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::Validation(empty_message.to_string()));
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|_| AppError::Validation(INVALID_JSON.to_string()))?;

    if is_empty_value(&value) {
        return Err(AppError::Validation(empty_message.to_string()));
    }

    serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

/// Mirrors JSON truthiness: null, false, zero and empty containers are empty.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Returns the string if present and non-blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
