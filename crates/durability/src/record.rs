//! WAL record format
//!
//! One record per line, encoded as a single JSON object:
//!
//! ```json
//! {"operation": "LPUSH", "key": "jobs", "value": {"type": "list", "value": ["a", "b"]}}
//! ```
//!
//! Mutating container operations persist the full resulting container
//! under `value`, SET persists the string, and DEL carries no value at
//! all. Replay therefore never has to interpret an operation; it just
//! installs (or removes) whatever the record carries.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use shoal_core::TypedValue;

/// Operation discriminant written into each WAL record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    /// Install a string value
    Set,
    /// Remove a key
    Del,
    /// List head push; carries the full resulting list
    Lpush,
    /// List tail push; carries the full resulting list
    Rpush,
    /// List head pop; carries the full resulting list
    Lpop,
    /// List tail pop; carries the full resulting list
    Rpop,
    /// Hash field write; carries the full resulting hash
    Hset,
    /// Hash field removal; carries the full resulting hash
    Hdel,
    /// Set member add; carries the full resulting set
    Sadd,
    /// Set member removal; carries the full resulting set
    Srem,
    /// Set member pop; carries the full resulting set
    Spop,
}

/// A single durable mutation record
///
/// `value` stays a raw JSON value rather than a typed envelope so that
/// legacy records (bare strings without the `{"type", "value"}` wrapper)
/// still deserialize; `TypedValue::from_record` sorts that out on replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalRecord {
    /// What happened
    pub operation: Operation,
    /// The key it happened to
    pub key: String,
    /// Resulting value, absent for DEL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Json>,
}

impl WalRecord {
    /// Record carrying the state a mutation produced
    pub fn mutation(operation: Operation, key: impl Into<String>, value: &TypedValue) -> Self {
        WalRecord {
            operation,
            key: key.into(),
            value: Some(value.to_record()),
        }
    }

    /// Record for a key removal
    pub fn del(key: impl Into<String>) -> Self {
        WalRecord {
            operation: Operation::Del,
            key: key.into(),
            value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_are_uppercase() {
        let json = serde_json::to_string(&Operation::Lpush).unwrap();
        assert_eq!(json, "\"LPUSH\"");
        let op: Operation = serde_json::from_str("\"SADD\"").unwrap();
        assert_eq!(op, Operation::Sadd);
    }

    #[test]
    fn test_set_record_shape() {
        let record = WalRecord::mutation(
            Operation::Set,
            "greeting",
            &TypedValue::Str("hello".to_string()),
        );
        let line = serde_json::to_string(&record).unwrap();
        let parsed: Json = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["operation"], "SET");
        assert_eq!(parsed["key"], "greeting");
        assert_eq!(parsed["value"]["type"], "string");
        assert_eq!(parsed["value"]["value"], "hello");
    }

    #[test]
    fn test_del_record_omits_value() {
        let line = serde_json::to_string(&WalRecord::del("gone")).unwrap();
        assert!(!line.contains("value"));

        let back: WalRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back.operation, Operation::Del);
        assert_eq!(back.value, None);
    }

    #[test]
    fn test_legacy_record_deserializes() {
        // Bare string value, no type envelope
        let back: WalRecord =
            serde_json::from_str(r#"{"operation": "SET", "key": "k", "value": "plain"}"#).unwrap();
        assert_eq!(back.value, Some(Json::String("plain".to_string())));
    }

    #[test]
    fn test_unknown_operation_is_an_error() {
        let result: Result<WalRecord, _> =
            serde_json::from_str(r#"{"operation": "FLUSHALL", "key": "k"}"#);
        assert!(result.is_err());
    }
}
