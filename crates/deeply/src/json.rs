//! Conversions between [`Value`] and `serde_json::Value`.
//!
//! Decoding is total. Encoding is lossy by construction: nullish values and
//! holes become JSON null, sets become arrays, maps become arrays of
//! `[key, value]` pairs, temporals become RFC 3339 text and patterns their
//! source text. Only enumerable record fields are emitted. A callable or
//! opaque value cannot be encoded, and neither can a cyclic graph; both are
//! an [`Error::InvalidArgument`].

use rustc_hash::FxHashSet;
use serde_json::{Map as JsonObject, Number, Value as JsonValue};

use crate::error::Error;
use crate::value::{List, Record, Value};

pub fn from_json(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(value) => Value::Bool(*value),
        JsonValue::Number(number) => match number.as_i64() {
            Some(value) => Value::Int(value),
            None => Value::Float(number.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(value) => Value::Text(value.clone()),
        JsonValue::Array(items) => Value::List(List::from_values(items.iter().map(from_json))),
        JsonValue::Object(fields) => {
            let record = Record::new();
            for (key, value) in fields {
                record.insert(key.clone(), from_json(value));
            }
            Value::Record(record)
        }
    }
}

pub fn to_json(value: &Value) -> Result<JsonValue, Error> {
    let mut active = FxHashSet::default();
    to_json_within(value, &mut active)
}

fn to_json_within(value: &Value, active: &mut FxHashSet<usize>) -> Result<JsonValue, Error> {
    if let Some(identity) = value.composite_identity() {
        if !active.insert(identity) {
            return Err(Error::InvalidArgument(
                "cannot encode a cyclic value as JSON".to_string(),
            ));
        }
    }
    let encoded = match value {
        Value::Null | Value::Undefined => JsonValue::Null,
        Value::Bool(v) => JsonValue::Bool(*v),
        Value::Int(v) => JsonValue::Number(Number::from(*v)),
        // Non-finite floats have no JSON spelling and encode as null.
        Value::Float(v) => Number::from_f64(*v)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(v) => JsonValue::String(v.clone()),
        Value::Symbol(v) => JsonValue::String(v.to_string()),
        Value::DateTime(v) => JsonValue::String(v.to_rfc3339()),
        Value::Pattern(v) => JsonValue::String(v.source().to_string()),
        Value::List(list) => {
            let items: Result<Vec<JsonValue>, Error> = list
                .values()
                .iter()
                .map(|item| to_json_within(item, active))
                .collect();
            JsonValue::Array(items?)
        }
        Value::Record(record) => {
            let mut fields = JsonObject::new();
            let mut entries = record.entries();
            // Deterministic field order for output stability.
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, field) in entries {
                if field.meta.enumerable {
                    fields.insert(key, to_json_within(&field.value, active)?);
                }
            }
            JsonValue::Object(fields)
        }
        Value::Set(set) => {
            let members: Result<Vec<JsonValue>, Error> = set
                .values()
                .iter()
                .map(|member| to_json_within(member, active))
                .collect();
            JsonValue::Array(members?)
        }
        Value::Map(map) => {
            let pairs: Result<Vec<JsonValue>, Error> = map
                .entries()
                .iter()
                .map(|(key, value)| {
                    Ok(JsonValue::Array(vec![
                        to_json_within(key, active)?,
                        to_json_within(value, active)?,
                    ]))
                })
                .collect();
            JsonValue::Array(pairs?)
        }
        Value::Func(func) => {
            return Err(Error::InvalidArgument(format!(
                "cannot encode callable {:?} as JSON",
                func.name
            )));
        }
        Value::Opaque(_) => {
            return Err(Error::InvalidArgument(
                "cannot encode an opaque value as JSON".to_string(),
            ));
        }
    };
    if let Some(identity) = value.composite_identity() {
        active.remove(&identity);
    }
    Ok(encoded)
}
