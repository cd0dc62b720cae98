use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::path::DocumentPath;

/// Field payload of a single document, keyed by field name.
///
/// Uses `BTreeMap` for deterministic iteration and serialization order.
pub type Fields = BTreeMap<String, Value>;

/// Generic runtime value stored in a document field.
///
/// Supports all JSON-compatible types plus a timestamp, which the document
/// store keeps distinct from plain integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON integer (signed 64-bit).
    Int(i64),
    /// JSON floating-point (64-bit IEEE 754).
    Float(f64),
    /// JSON string (UTF-8).
    String(String),
    /// Point in time, milliseconds since the Unix epoch.
    Timestamp(u64),
    /// JSON array (ordered sequence of values).
    Array(Vec<Value>),
    /// JSON object (ordered map of string keys to values).
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the string slice if this is a `Value::String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// An empty array.
    #[must_use]
    pub fn empty_array() -> Self {
        Self::Array(Vec::new())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<Fields> for Value {
    fn from(map: Fields) -> Self {
        Self::Map(map)
    }
}

/// Builds a [`Fields`] map from `(name, value)` pairs.
pub fn fields<I, K, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A document read from the store: its full path plus its field payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    /// Full path of the document.
    pub path: DocumentPath,
    /// Field payload at read time.
    pub fields: Fields,
}

impl DocumentSnapshot {
    #[must_use]
    pub fn new(path: DocumentPath, fields: Fields) -> Self {
        Self { path, fields }
    }

    /// Key of the document within its collection.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Looks up a single field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a string field, or `""` when absent or not a string.
    #[must_use]
    pub fn str_field(&self, field: &str) -> &str {
        self.get(field).and_then(Value::as_str).unwrap_or_default()
    }
}
