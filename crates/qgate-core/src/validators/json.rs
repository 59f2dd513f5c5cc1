//! Field-level helpers for validators that inspect raw JSON.
//!
//! Validators report every violation they can find, so they work on
//! `serde_json::Value` instead of stopping at the first serde error.

use serde_json::{Map, Value};

use qgate_domain::ValidationError;

/// Parse `raw` as a JSON object or return the single terminal error.
pub fn parse_object(
    raw: &str,
    invalid_json: &str,
    invalid_object: &str,
    what: &str,
) -> Result<Map<String, Value>, ValidationError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        ValidationError::new(invalid_json, "json", format!("Invalid JSON payload: {}", e))
    })?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(ValidationError::new(
            invalid_object,
            "payload",
            format!("{} payload must be a JSON object.", what),
        )),
    }
}

/// `prefix.name`, or `name` at the top level.
pub fn field_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

pub fn non_negative_integer(value: Option<&Value>) -> Option<u64> {
    value.and_then(Value::as_u64)
}

pub fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Every element a string, or `None`.
pub fn string_array(value: Option<&Value>) -> Option<Vec<&str>> {
    value
        .and_then(Value::as_array)?
        .iter()
        .map(Value::as_str)
        .collect()
}

pub fn finite_number(value: Option<&Value>) -> Option<f64> {
    value.and_then(Value::as_f64).filter(|n| n.is_finite())
}

/// Whether `value` is exactly the integer `expected`.
pub fn is_version(value: Option<&Value>, expected: u32) -> bool {
    non_negative_integer(value) == Some(u64::from(expected))
}
