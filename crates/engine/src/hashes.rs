//! Hash operations
//!
//! A key tagged HASH maps string fields to string values. Field
//! insertion order is not observable. Deleting the last field removes
//! the key. Every mutation persists the full resulting hash in its WAL
//! record.

use crate::store::Store;
use shoal_core::{DataType, Result, TypedValue};
use shoal_durability::Operation;
use std::collections::HashMap;

impl Store {
    /// Write `pairs` into the hash, creating it if absent. A later
    /// pair for the same field wins. Returns how many fields were
    /// newly created (overwrites do not count).
    pub fn hset(&self, key: &str, pairs: &[(String, String)]) -> Result<usize> {
        let _guard = self.lock();
        let mut hash = self
            .read_as(key, DataType::Hash, as_hash)?
            .unwrap_or_default();
        let mut created = 0;
        for (field, value) in pairs {
            if hash.insert(field.clone(), value.clone()).is_none() {
                created += 1;
            }
        }
        self.commit(key, Operation::Hset, TypedValue::Hash(hash))?;
        Ok(created)
    }

    /// Value of one field, `None` when the key or field is absent
    pub fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let _guard = self.lock();
        Ok(self
            .read_as(key, DataType::Hash, |v| {
                as_hash_ref(v).map(|h| h.get(field).cloned())
            })?
            .flatten())
    }

    /// Values for `fields`, aligned with the input; absent fields (or
    /// a wholly absent key) come back as `None`
    pub fn hmget(&self, key: &str, fields: &[String]) -> Result<Vec<Option<String>>> {
        let _guard = self.lock();
        let Some(hash) = self.read_as(key, DataType::Hash, as_hash)? else {
            return Ok(vec![None; fields.len()]);
        };
        Ok(fields.iter().map(|f| hash.get(f).cloned()).collect())
    }

    /// Snapshot of every field, empty for an absent key
    pub fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let _guard = self.lock();
        Ok(self
            .read_as(key, DataType::Hash, as_hash)?
            .unwrap_or_default())
    }

    /// Remove `fields`. Returns how many were present. Removes the key
    /// when the hash empties; an absent key or a miss on every field
    /// writes no WAL record.
    pub fn hdel(&self, key: &str, fields: &[String]) -> Result<usize> {
        let _guard = self.lock();
        let Some(mut hash) = self.read_as(key, DataType::Hash, as_hash)? else {
            return Ok(0);
        };
        let mut removed = 0;
        for field in fields {
            if hash.remove(field).is_some() {
                removed += 1;
            }
        }
        if removed == 0 {
            return Ok(0);
        }
        self.commit(key, Operation::Hdel, TypedValue::Hash(hash))?;
        Ok(removed)
    }

    /// Number of fields, 0 when the key is absent
    pub fn hlen(&self, key: &str) -> Result<usize> {
        let _guard = self.lock();
        Ok(self
            .read_as(key, DataType::Hash, |v| as_hash_ref(v).map(|h| h.len()))?
            .unwrap_or(0))
    }

    /// Whether `field` is present in the hash
    pub fn hexists(&self, key: &str, field: &str) -> Result<bool> {
        let _guard = self.lock();
        Ok(self
            .read_as(key, DataType::Hash, |v| {
                as_hash_ref(v).map(|h| h.contains_key(field))
            })?
            .unwrap_or(false))
    }
}

fn as_hash(value: &TypedValue) -> Option<HashMap<String, String>> {
    as_hash_ref(value).cloned()
}

fn as_hash_ref(value: &TypedValue) -> Option<&HashMap<String, String>> {
    match value {
        TypedValue::Hash(h) => Some(h),
        _ => None,
    }
}
