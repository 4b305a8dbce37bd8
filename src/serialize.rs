//! [`Condition`] → canonical JSON serialization.

use crate::error::SerializeError;
use crate::types::Condition;
use serde_json::Value;

/// Serialize a validated condition to its canonical JSON text.
///
/// Keys are emitted in schema order and tokens in their normalized casing
/// (lower-cased url entries, upper-cased methods and weekday tokens), so
/// validating the output yields a condition equal to the input.
pub fn serialize(condition: &Condition) -> Result<String, SerializeError> {
    serde_json::to_string_pretty(condition).map_err(|e| SerializeError {
        message: format!("failed to serialize condition: {}", e),
    })
}

/// Canonical JSON value form of a validated condition.
pub fn to_value(condition: &Condition) -> Result<Value, SerializeError> {
    serde_json::to_value(condition).map_err(|e| SerializeError {
        message: format!("failed to convert condition to JSON value: {}", e),
    })
}
