use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{AccessError, DataError, GeneralError};

pub mod dotpath;

/// Data applied to a template
///
/// A mapping from placeholder names to values. Values are scalars, nested
/// mappings, or lists of mappings (for array placeholders).
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Data(Map<String, Value>);

impl Data {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse data from a JSON document. The document must be an object.
    pub fn from_json(input: &str) -> Result<Self, GeneralError> {
        let value: Value = serde_json::from_str(input).map_err(|e| DataError::Malformed {
            format: "JSON".to_string(),
            message: e.to_string(),
        })?;

        Ok(Data::try_from(value)?)
    }

    /// Parse data from a TOML document. Tables become nested mappings.
    pub fn from_toml(input: &str) -> Result<Self, GeneralError> {
        let map: Map<String, Value> = toml::from_str(input).map_err(|e| DataError::Malformed {
            format: "TOML".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self(map))
    }

    /// Shallow lookup of a key. `null` values count as missing.
    pub fn get(&self, key: &str) -> Option<&Value> {
        lookup(&self.0, key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Read a value using a dotted path (e.g. `server.port`)
    pub fn get_path(&self, path: &str) -> Result<&Value, AccessError> {
        dotpath::get(&self.0, path)
    }

    /// Write a value using a dotted path. Intermediate mappings must already exist.
    pub fn set_path(&mut self, path: &str, value: impl Into<Value>) -> Result<(), AccessError> {
        dotpath::set(&mut self.0, path, value.into())
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Data {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Data {
    type Error = DataError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DataError::NotAMapping(kind(&other).to_string())),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Data {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Shallow lookup of a key in a mapping. `null` values count as missing.
pub fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

/// Name of a value's kind, used in type mismatch messages
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(n) if n.is_u64() && !n.is_i64() => "large integer",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Textual representation of a value as emitted by a placeholder
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(_) => inspect(value),
        other => other.to_string(),
    }
}

fn inspect(value: &Value) -> String {
    match value {
        Value::Null => "nil".to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(inspect).collect();
            format!("[{}]", items.join(", "))
        }
        other => other.to_string(),
    }
}
