//! Tagged values for the keyspace
//!
//! This module defines:
//! - DataType: the tag discriminating what a key holds
//! - TypedValue: the tagged payload stored under a key
//! - WAL record conversions (`to_record` / `from_record`)
//!
//! The WAL stores each value as a JSON envelope `{"type": tag, "value":
//! payload}`. Records written before the envelope existed carry a bare
//! JSON scalar instead; those are read back as STRING values.

use serde_json::Value as Json;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use crate::error::{Error, Result};

/// Tag identifying what kind of payload a key holds
///
/// The tag is fixed at key creation and never changes for the lifetime
/// of the key. `Int` and `Float` are reserved tags: they round-trip
/// through the WAL but no command currently produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// UTF-8 string
    String,
    /// Ordered sequence of strings
    List,
    /// Field to value mapping
    Hash,
    /// Unordered set of strings
    Set,
    /// 64-bit signed integer (reserved)
    Int,
    /// 64-bit float (reserved)
    Float,
}

impl DataType {
    /// The lowercase tag written into WAL records
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::List => "list",
            DataType::Hash => "hash",
            DataType::Set => "set",
            DataType::Int => "int",
            DataType::Float => "float",
        }
    }

    /// Parse a WAL tag. Returns `None` for unknown tags; callers fall
    /// back to STRING for those (legacy compatibility).
    pub fn from_tag(tag: &str) -> Option<DataType> {
        match tag {
            "string" => Some(DataType::String),
            "list" => Some(DataType::List),
            "hash" => Some(DataType::Hash),
            "set" => Some(DataType::Set),
            "int" => Some(DataType::Int),
            "float" => Some(DataType::Float),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value stored in the keyspace, tagged with its type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// STRING payload
    Str(String),
    /// LIST payload, head at the front
    List(VecDeque<String>),
    /// HASH payload, field order not observable
    Hash(HashMap<String, String>),
    /// SET payload
    Set(HashSet<String>),
    /// INT payload (reserved)
    Int(i64),
    /// FLOAT payload (reserved)
    Float(f64),
}

impl TypedValue {
    /// The tag for this value
    pub fn data_type(&self) -> DataType {
        match self {
            TypedValue::Str(_) => DataType::String,
            TypedValue::List(_) => DataType::List,
            TypedValue::Hash(_) => DataType::Hash,
            TypedValue::Set(_) => DataType::Set,
            TypedValue::Int(_) => DataType::Int,
            TypedValue::Float(_) => DataType::Float,
        }
    }

    /// Whether this is a container (LIST/HASH/SET) with no elements.
    ///
    /// Empty containers are removed from the keyspace rather than kept
    /// around, so an empty container is never installed.
    pub fn is_empty_container(&self) -> bool {
        match self {
            TypedValue::List(l) => l.is_empty(),
            TypedValue::Hash(h) => h.is_empty(),
            TypedValue::Set(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Serialise to the WAL record envelope `{"type": tag, "value": payload}`.
    ///
    /// Sets are written as JSON arrays; member order is not significant.
    pub fn to_record(&self) -> Json {
        let payload = match self {
            TypedValue::Str(s) => Json::String(s.clone()),
            TypedValue::List(l) => Json::Array(l.iter().cloned().map(Json::String).collect()),
            TypedValue::Hash(h) => Json::Object(
                h.iter()
                    .map(|(k, v)| (k.clone(), Json::String(v.clone())))
                    .collect(),
            ),
            TypedValue::Set(s) => Json::Array(s.iter().cloned().map(Json::String).collect()),
            TypedValue::Int(i) => Json::from(*i),
            TypedValue::Float(f) => Json::from(*f),
        };
        serde_json::json!({ "type": self.data_type().as_str(), "value": payload })
    }

    /// Construct from the `value` field of a WAL record.
    ///
    /// Accepts both the tagged envelope and the legacy bare form; the
    /// legacy form, and any envelope with an unknown tag, materialises
    /// as a STRING. A tagged envelope whose payload does not match its
    /// tag is malformed and rejected.
    pub fn from_record(value: &Json) -> Result<TypedValue> {
        let (tag, payload) = match envelope(value) {
            Some((tag, payload)) => (tag, payload),
            // Legacy record: no envelope, treat as string
            None => return Ok(TypedValue::Str(scalar_string(value))),
        };

        let data_type = match DataType::from_tag(tag) {
            Some(dt) => dt,
            // Unknown tag: read as string for forward compatibility
            None => return Ok(TypedValue::Str(scalar_string(payload))),
        };

        match data_type {
            DataType::String => Ok(TypedValue::Str(scalar_string(payload))),
            DataType::List => {
                let items = payload
                    .as_array()
                    .ok_or_else(|| malformed("list payload is not an array", payload))?;
                Ok(TypedValue::List(items.iter().map(scalar_string).collect()))
            }
            DataType::Hash => {
                let fields = payload
                    .as_object()
                    .ok_or_else(|| malformed("hash payload is not an object", payload))?;
                Ok(TypedValue::Hash(
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), scalar_string(v)))
                        .collect(),
                ))
            }
            DataType::Set => {
                let items = payload
                    .as_array()
                    .ok_or_else(|| malformed("set payload is not an array", payload))?;
                Ok(TypedValue::Set(items.iter().map(scalar_string).collect()))
            }
            DataType::Int => payload
                .as_i64()
                .or_else(|| payload.as_str().and_then(|s| s.parse().ok()))
                .map(TypedValue::Int)
                .ok_or_else(|| malformed("int payload is not an integer", payload)),
            DataType::Float => payload
                .as_f64()
                .or_else(|| payload.as_str().and_then(|s| s.parse().ok()))
                .map(TypedValue::Float)
                .ok_or_else(|| malformed("float payload is not a number", payload)),
        }
    }
}

/// Split a tagged envelope into `(tag, payload)`, if the value is one
fn envelope(value: &Json) -> Option<(&str, &Json)> {
    let obj = value.as_object()?;
    let tag = obj.get("type")?.as_str()?;
    let payload = obj.get("value")?;
    Some((tag, payload))
}

/// Render a JSON scalar as the string the engine stores
fn scalar_string(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn malformed(what: &str, payload: &Json) -> Error {
    Error::InvalidRecord(format!("{what}: {payload}"))
}
