//! Conversion between free-form JSON and Terraform values
//!
//! API payloads such as JSON schemas, annotations and capability documents
//! have no fixed shape. They are stored in `dynamic` attributes: JSON arrays
//! become tuples and JSON objects become objects, with the concrete type
//! inferred from the value.

use crate::error::{Result, TfplugError};
use crate::schema::AttributeType;
use crate::types::Dynamic;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Maps a JSON document onto a Terraform value, recursing through arrays
/// and objects
pub fn json_to_dynamic(value: &JsonValue) -> Result<Dynamic> {
    match value {
        JsonValue::Null => Ok(Dynamic::Null),
        JsonValue::Bool(b) => Ok(Dynamic::Bool(*b)),
        JsonValue::String(s) => Ok(Dynamic::String(s.clone())),
        JsonValue::Number(n) => n
            .as_f64()
            .map(Dynamic::Number)
            .ok_or_else(|| TfplugError::UnsupportedValue(format!("number {}", n))),
        JsonValue::Array(items) => Ok(Dynamic::List(
            items.iter().map(json_to_dynamic).collect::<Result<_>>()?,
        )),
        JsonValue::Object(fields) => {
            let mut map = HashMap::with_capacity(fields.len());
            for (key, field) in fields {
                let converted = json_to_dynamic(field)
                    .map_err(|e| TfplugError::UnsupportedValue(format!("{}: {}", key, e)))?;
                map.insert(key.clone(), converted);
            }
            Ok(Dynamic::Map(map))
        }
    }
}

/// Maps a Terraform value back to JSON for request bodies
///
/// Unknown values cannot be sent to an API and are rejected, as are
/// non-finite numbers which JSON cannot represent.
pub fn dynamic_to_json(value: &Dynamic) -> Result<JsonValue> {
    match value {
        Dynamic::Null => Ok(JsonValue::Null),
        Dynamic::Unknown => Err(TfplugError::UnsupportedValue(
            "unknown value cannot be converted to JSON".to_string(),
        )),
        Dynamic::Bool(b) => Ok(JsonValue::Bool(*b)),
        Dynamic::String(s) => Ok(JsonValue::String(s.clone())),
        Dynamic::Number(n) => number_to_json(*n),
        Dynamic::List(items) => Ok(JsonValue::Array(
            items.iter().map(dynamic_to_json).collect::<Result<_>>()?,
        )),
        Dynamic::Map(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (key, field) in map {
                object.insert(key.clone(), dynamic_to_json(field)?);
            }
            Ok(JsonValue::Object(object))
        }
    }
}

fn number_to_json(n: f64) -> Result<JsonValue> {
    if !n.is_finite() {
        return Err(TfplugError::UnsupportedValue(format!("number {}", n)));
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        return Ok(JsonValue::from(n as i64));
    }
    serde_json::Number::from_f64(n)
        .map(JsonValue::Number)
        .ok_or_else(|| TfplugError::UnsupportedValue(format!("number {}", n)))
}

/// Infers the structural type of a value stored in a `dynamic` attribute
pub fn infer_type(value: &Dynamic) -> AttributeType {
    match value {
        Dynamic::Null | Dynamic::Unknown => AttributeType::Dynamic,
        Dynamic::Bool(_) => AttributeType::Bool,
        Dynamic::Number(_) => AttributeType::Number,
        Dynamic::String(_) => AttributeType::String,
        Dynamic::List(items) => AttributeType::Tuple(items.iter().map(infer_type).collect()),
        Dynamic::Map(map) => AttributeType::Object(
            map.iter()
                .map(|(key, field)| (key.clone(), infer_type(field)))
                .collect(),
        ),
    }
}
