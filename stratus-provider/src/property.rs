//! Generic property bags.
//!
//! The property map is the dynamically-typed view of a resource's fields:
//! the canonical form used for diffing and replace decisions, independent
//! of the strongly-typed resource object a kind's operations see. Wire
//! payloads are JSON objects; unknown fields are ignored on unmarshal for
//! forward compatibility.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::ident::{REF_KEY, ResourceId};

/// A dynamically-typed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    /// Numbers are carried as `f64`, the wire format's native domain.
    /// Integers beyond 2^53 in magnitude lose precision on unmarshal and
    /// may compare equal in diffs despite differing on the wire.
    Number(f64),
    String(String),
    Array(Vec<PropertyValue>),
    Object(PropertyMap),
    /// Reference to another resource, `{"@ref": id}` on the wire.
    Ref(ResourceId),
}

/// Ordered mapping from property name to value.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single field-level validation failure. Reported as data, never as a
/// fault: a non-empty failure list rejects the request without side
/// effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldFailure {
    /// Property name the failure applies to.
    pub field: String,
    /// Human-readable reason.
    pub reason: String,
}

impl FieldFailure {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Decodes a wire payload into a property map. The payload must be a JSON
/// object; anything else is a structural decode error.
pub fn unmarshal_properties(payload: &Value) -> Result<PropertyMap, String> {
    match payload {
        Value::Object(fields) => Ok(fields
            .iter()
            .map(|(k, v)| (k.clone(), value_to_property(v)))
            .collect()),
        other => Err(format!(
            "expected a property object, got {}",
            json_type_name(other)
        )),
    }
}

/// Encodes a property map back onto the wire.
pub fn marshal_properties(props: &PropertyMap) -> Value {
    Value::Object(
        props
            .iter()
            .map(|(k, v)| (k.clone(), property_to_value(v)))
            .collect(),
    )
}

fn value_to_property(v: &Value) -> PropertyValue {
    match v {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::Number(n) => PropertyValue::Number(n.as_f64().unwrap_or_default()),
        Value::String(s) => PropertyValue::String(s.clone()),
        Value::Array(items) => PropertyValue::Array(items.iter().map(value_to_property).collect()),
        Value::Object(fields) => {
            // A single-key {"@ref": "<id>"} object is a resource reference.
            if fields.len() == 1 {
                if let Some(Value::String(id)) = fields.get(REF_KEY) {
                    return PropertyValue::Ref(ResourceId::new(id.clone()));
                }
            }
            PropertyValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), value_to_property(v)))
                    .collect(),
            )
        }
    }
}

fn property_to_value(p: &PropertyValue) -> Value {
    match p {
        PropertyValue::Null => Value::Null,
        PropertyValue::Bool(b) => Value::Bool(*b),
        PropertyValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        PropertyValue::String(s) => Value::String(s.clone()),
        PropertyValue::Array(items) => Value::Array(items.iter().map(property_to_value).collect()),
        PropertyValue::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), property_to_value(v)))
                .collect(),
        ),
        PropertyValue::Ref(id) => {
            let mut obj = serde_json::Map::with_capacity(1);
            obj.insert(REF_KEY.to_string(), Value::String(id.to_string()));
            Value::Object(obj)
        }
    }
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Converts a typed-decode error into a field failure. serde names the
/// offending field in backticks ("missing field `bucketName`"); fall back
/// to the whole payload when it does not.
pub fn decode_failure(err: &serde_json::Error) -> FieldFailure {
    let reason = err.to_string();
    let field = reason
        .split('`')
        .nth(1)
        .unwrap_or("<payload>")
        .to_string();
    FieldFailure { field, reason }
}
