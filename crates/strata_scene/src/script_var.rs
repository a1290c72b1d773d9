//! Script variables: named values exposed to game scripts on entity and
//! scene classes. Read-only variables are shared through the class, while
//! writable ones are copied into every instance.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strata_core::hash::{StableHash, Xxh3, hash_combine};
use strata_core::json::{read, read_or, read_str, to_json};
use strata_core::{Result, new_id};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptValue {
    Bool(bool),
    Float(f32),
    Integer(i32),
    String(String),
    Vec2(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptValueType {
    Bool,
    Float,
    Integer,
    String,
    Vec2,
}

impl ScriptValue {
    #[must_use]
    pub fn value_type(&self) -> ScriptValueType {
        match self {
            Self::Bool(_) => ScriptValueType::Bool,
            Self::Float(_) => ScriptValueType::Float,
            Self::Integer(_) => ScriptValueType::Integer,
            Self::String(_) => ScriptValueType::String,
            Self::Vec2(_) => ScriptValueType::Vec2,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            Self::Vec2(v) => Some(*v),
            _ => None,
        }
    }
}

impl StableHash for ScriptValue {
    fn stable_hash(&self, state: &mut Xxh3) {
        (self.value_type() as u32).stable_hash(state);
        match self {
            Self::Bool(v) => v.stable_hash(state),
            Self::Float(v) => v.stable_hash(state),
            Self::Integer(v) => v.stable_hash(state),
            Self::String(v) => v.stable_hash(state),
            Self::Vec2(v) => v.stable_hash(state),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for ScriptValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<i32> for ScriptValue {
    fn from(v: i32) -> Self {
        Self::Integer(v)
    }
}

impl From<&str> for ScriptValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for ScriptValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec2> for ScriptValue {
    fn from(v: Vec2) -> Self {
        Self::Vec2(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptVar {
    id: String,
    name: String,
    value: ScriptValue,
    read_only: bool,
}

impl ScriptVar {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<ScriptValue>, read_only: bool) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            value: value.into(),
            read_only,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> &ScriptValue {
        &self.value
    }

    /// Replace the value. The type is allowed to change here; only the
    /// scripting surface insists on matching types.
    pub fn set_value(&mut self, value: impl Into<ScriptValue>) {
        self.value = value.into();
    }

    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    #[must_use]
    pub fn value_type(&self) -> ScriptValueType {
        self.value.value_type()
    }

    #[must_use]
    pub fn hash_value(&self) -> u64 {
        let mut hash = hash_combine(0, &self.id);
        hash = hash_combine(hash, &self.name);
        hash = hash_combine(hash, &self.value);
        hash_combine(hash, &self.read_only)
    }

    #[must_use]
    pub fn into_json(&self) -> Value {
        let mut chunk = Map::new();
        chunk.insert("id".into(), Value::String(self.id.clone()));
        chunk.insert("name".into(), Value::String(self.name.clone()));
        chunk.insert("value".into(), to_json(&self.value));
        chunk.insert("readonly".into(), Value::Bool(self.read_only));
        Value::Object(chunk)
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        const CONTEXT: &str = "script variable";
        Ok(Self {
            id: read_str(value, CONTEXT, "id")?.to_owned(),
            name: read_or(value, CONTEXT, "name", String::new())?,
            value: read(value, CONTEXT, "value")?,
            read_only: read_or(value, CONTEXT, "readonly", true)?,
        })
    }
}

/// Assign `value` to the writable variable `name` in `vars`. Read-only,
/// missing and type mismatched variables are rejected with a warning.
pub(crate) fn assign(vars: &mut [ScriptVar], owner: &str, name: &str, value: ScriptValue) -> bool {
    let Some(var) = vars.iter_mut().find(|v| v.name == name) else {
        log::warn!("No such writable script variable. [owner='{owner}', var='{name}']");
        return false;
    };
    if var.read_only {
        log::warn!("Script variable is read only. [owner='{owner}', var='{name}']");
        return false;
    }
    if var.value_type() != value.value_type() {
        log::warn!(
            "Script variable type mismatch. [owner='{}', var='{}', expected={:?}, got={:?}]",
            owner,
            name,
            var.value_type(),
            value.value_type()
        );
        return false;
    }
    var.value = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_rejects_read_only_and_mismatched_types() {
        let mut vars = vec![
            ScriptVar::new("speed", 1.0f32, false),
            ScriptVar::new("kind", "enemy", true),
        ];
        assert!(assign(&mut vars, "test", "speed", ScriptValue::Float(2.0)));
        assert_eq!(vars[0].value().as_f32(), Some(2.0));

        assert!(!assign(&mut vars, "test", "speed", ScriptValue::Integer(3)));
        assert!(!assign(&mut vars, "test", "kind", "boss".into()));
        assert!(!assign(&mut vars, "test", "missing", true.into()));
        assert_eq!(vars[1].value().as_str(), Some("enemy"));
    }

    #[test]
    fn json_keeps_value_type() {
        let var = ScriptVar::new("count", 3, false);
        let copy = ScriptVar::from_json(&var.into_json()).unwrap();
        assert_eq!(copy, var);
        assert_eq!(copy.value_type(), ScriptValueType::Integer);
    }
}
