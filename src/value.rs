//! Raw source values.
//!
//! This module provides the `Value` enum for flat source entries and for the
//! nested tree rebuilt from them, before coercion and validation.

use indexmap::IndexMap;

/// Raw value as supplied by a configuration source.
///
/// `Undefined` is distinct from `Null`: it marks a key that is present in the
/// source but unset, and a schema property that nothing resolved. Falsy values
/// (`0`, `false`, `""`) are ordinary values and never collapse to `Undefined`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Present but unset, or unresolved
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object of key-value pairs, in insertion order
    Table(IndexMap<String, Value>),
}

impl Value {
    /// Check if this value is undefined.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a table.
    pub fn as_table(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Get a value by dot-notation path (e.g., "database.host").
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(self, |current, part| match current {
            Value::Table(table) => table.get(part),
            _ => None,
        })
    }

    /// Get a human-readable type name for this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Table(_) => "object",
        }
    }

    /// Convert to JSON for the validation engine.
    ///
    /// Returns `None` for `Undefined`. Undefined table entries are dropped and
    /// undefined array items become `null`, mirroring how JSON serializes
    /// unset values.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        let json = match self {
            Value::Undefined => return None,
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => serde_json::Value::Array(
                arr.iter()
                    .map(|v| v.to_json().unwrap_or(serde_json::Value::Null))
                    .collect(),
            ),
            Value::Table(table) => serde_json::Value::Object(
                table
                    .iter()
                    .filter_map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
                    .collect(),
            ),
        };
        Some(json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Undefined)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            // u64 beyond i64::MAX has no exact variant; its text survives
            // and coerces back to an exact number.
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Integer(i),
                (None, Some(u)) => Value::String(u.to_string()),
                _ => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(map) => {
                Value::Table(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
