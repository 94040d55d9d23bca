//! Schema-agnostic records.
//!
//! The migration engine moves records between schema versions it does not
//! know at compile time, so records are ordered maps of field name to a
//! small closed set of value types. Schema descriptors constrain which
//! fields a record may carry via [`FieldKind`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The type of a field as declared by a schema descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// UTF-8 string
    #[serde(rename = "string")]
    Str,
    /// Signed 64-bit integer
    #[serde(rename = "int")]
    Int,
    /// Boolean flag
    #[serde(rename = "bool")]
    Bool,
    /// Raw byte payload
    #[serde(rename = "bytes")]
    Bytes,
    /// Ordered list of strings
    #[serde(rename = "string_list")]
    StrList,
}

impl FieldKind {
    /// The value a field of this kind takes when nothing else supplies one.
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Str => FieldValue::Str(String::new()),
            FieldKind::Int => FieldValue::Int(0),
            FieldKind::Bool => FieldValue::Bool(false),
            FieldKind::Bytes => FieldValue::Bytes(Vec::new()),
            FieldKind::StrList => FieldValue::StrList(Vec::new()),
        }
    }

    /// Stable lowercase name, as written in schema resources.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Str => "string",
            FieldKind::Int => "int",
            FieldKind::Bool => "bool",
            FieldKind::Bytes => "bytes",
            FieldKind::StrList => "string_list",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue {
    /// UTF-8 string
    Str(String),
    /// Signed 64-bit integer
    Int(i64),
    /// Boolean flag
    Bool(bool),
    /// Raw byte payload
    Bytes(Vec<u8>),
    /// Ordered list of strings
    StrList(Vec<String>),
}

impl FieldValue {
    /// The kind this value belongs to.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Str(_) => FieldKind::Str,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Bytes(_) => FieldKind::Bytes,
            FieldValue::StrList(_) => FieldKind::StrList,
        }
    }

    /// Borrow as a string, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Extract an integer, if this is an integer value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract a boolean, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as bytes, if this is a byte payload.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow as a string list, if this is one.
    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::StrList(l) => Some(l),
            _ => None,
        }
    }
}

/// One stored record: an ordered map of field name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Record::default()
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    /// Whether the record carries a field with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Record {
            fields: iter.into_iter().collect(),
        }
    }
}
