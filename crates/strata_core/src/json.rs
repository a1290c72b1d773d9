//! Helpers for reading and writing class data as `serde_json::Value`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{Result, StrataError};

/// Serialize a value that can't fail to serialize (no non-string map keys).
#[must_use]
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(v) => v,
        Err(err) => {
            log::error!("Failed to serialize value. [error='{err}']");
            Value::Null
        }
    }
}

/// Read a required field.
pub fn read<T: DeserializeOwned>(
    value: &Value,
    context: &'static str,
    field: &'static str,
) -> Result<T> {
    let Some(v) = value.get(field) else {
        return Err(StrataError::MissingField { context, field });
    };
    T::deserialize(v).map_err(|err| StrataError::InvalidField {
        context,
        field,
        reason: err.to_string(),
    })
}

/// Read an optional field, falling back to `default` when it is absent.
/// A present but malformed value is still an error.
pub fn read_or<T: DeserializeOwned>(
    value: &Value,
    context: &'static str,
    field: &'static str,
    default: T,
) -> Result<T> {
    match value.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(_) => read(value, context, field),
    }
}

/// Read a required string field.
pub fn read_str<'a>(value: &'a Value, context: &'static str, field: &'static str) -> Result<&'a str> {
    match value.get(field) {
        None => Err(StrataError::MissingField { context, field }),
        Some(v) => v.as_str().ok_or_else(|| StrataError::InvalidField {
            context,
            field,
            reason: "expected a string".into(),
        }),
    }
}

/// Iterate the elements of an optional array field.
pub fn read_array<'a>(value: &'a Value, field: &str) -> impl Iterator<Item = &'a Value> + 'a {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|a| a.iter())
        .into_iter()
        .flatten()
}
