//! Response decoding
//!
//! Raw response text decodes either into a loosely-typed JSON object
//! ([`decode_dynamic`]) or into typed models ([`decode_one`], [`decode_many`]).
//!
//! Typed decoding leniency:
//! - optional model fields that are absent or null become `None`
//! - missing required fields fail with [`ApiError::Schema`]
//! - in a sequence, each element decodes on its own; null or malformed
//!   elements become `None` in place instead of failing the whole sequence

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Loosely-typed response object
pub type JsonMap = Map<String, Value>;

/// Short name of a JSON value's type, for error messages
fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Decodes text into a JSON object
///
/// Fails with [`ApiError::Schema`] if the top-level value is not an object.
pub fn decode_dynamic(text: &str) -> Result<JsonMap, ApiError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Schema(format!(
            "expected a JSON object, found {}",
            kind(&other)
        ))),
    }
}

/// Decodes text into a single model
pub fn decode_one<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    Ok(serde_json::from_str(text)?)
}

/// Decodes text holding a JSON array into a sequence of models
///
/// Only malformed JSON or a non-array top level fails the call.
pub fn decode_many<T: DeserializeOwned>(text: &str) -> Result<Vec<Option<T>>, ApiError> {
    let items = match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items,
        other => {
            return Err(ApiError::Schema(format!(
                "expected a JSON array, found {}",
                kind(&other)
            )))
        }
    };

    let decoded = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if item.is_null() {
                return None;
            }
            serde_json::from_value(item)
                .map_err(|e| tracing::warn!(index, error = %e, "skipping undecodable element"))
                .ok()
        })
        .collect();

    Ok(decoded)
}
