//! The keyspace and its string operations
//!
//! ## Design
//!
//! `Store` owns the authoritative in-memory state: a map from key to
//! `TypedValue`, guarded by a single re-entrant keyspace lock. Every
//! operation runs to completion under the lock, so operations are
//! linearisable with respect to one another; `atomic` holds the lock
//! across a whole closure, which is how EXEC batches exclude other
//! connections while each drained command re-acquires the lock.
//!
//! ## Write-through
//!
//! Mutations append their WAL record (fsynced under `SyncMode::Always`)
//! before the keyspace changes. If the append fails, the keyspace is
//! untouched and the caller sees `FailedToPersist`.
//!
//! ## Startup
//!
//! `Store::open` drains the WAL's replay stream and rebuilds the
//! keyspace before accepting any operation. Container records carry the
//! full resulting container, so replay just installs (or, for an empty
//! container, removes) whatever each record carries.

use parking_lot::ReentrantMutex;
use shoal_core::{DataType, Error, Result, TypedValue};
use shoal_durability::{Operation, Wal, WalRecord};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// The shared typed key-value engine
///
/// `Store` is `Send + Sync`; clones of the surrounding `Arc` may be
/// used from any number of connection tasks. The keyspace lock is
/// re-entrant so a task already holding it (an EXEC batch) can invoke
/// further operations without deadlocking; the inner `RefCell` borrow
/// is scoped strictly inside each operation and never held across one.
pub struct Store {
    wal: Arc<Wal>,
    keys: ReentrantMutex<RefCell<HashMap<String, TypedValue>>>,
}

impl Store {
    /// Replay the WAL and return a ready store.
    ///
    /// Malformed records are skipped with a warning; they never halt
    /// startup.
    pub fn open(wal: Arc<Wal>) -> Result<Store> {
        let mut keys = HashMap::new();
        for record in wal.replay()? {
            apply_replay(&mut keys, record);
        }
        info!(keys = keys.len(), "WAL replayed, store ready");
        Ok(Store {
            wal,
            keys: ReentrantMutex::new(RefCell::new(keys)),
        })
    }

    /// The WAL this store writes through to
    pub fn wal(&self) -> &Arc<Wal> {
        &self.wal
    }

    /// Run `f` with the keyspace lock held.
    ///
    /// Nothing else can touch the keyspace until `f` returns. The lock
    /// is re-entrant, so `f` may freely call store operations.
    pub fn atomic<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.keys.lock();
        f()
    }

    // ========== String operations ==========

    /// Install a string value under `key`, creating or replacing it.
    ///
    /// Replaces the previous value whatever its tag; string SET is the
    /// one operation exempt from the WRONGTYPE check.
    pub fn set(&self, key: &str, value: &str) -> Result<bool> {
        let guard = self.keys.lock();
        let typed = TypedValue::Str(value.to_string());
        self.wal
            .append(&WalRecord::mutation(Operation::Set, key, &typed))?;
        guard.borrow_mut().insert(key.to_string(), typed);
        Ok(true)
    }

    /// Read the string stored under `key`.
    ///
    /// Returns `None` when the key is absent. A key holding a
    /// non-string answers the literal sentinel `"NULL"`; this is
    /// preserved historical behaviour, not a nil marker.
    pub fn get(&self, key: &str) -> Option<String> {
        let guard = self.keys.lock();
        let keys = guard.borrow();
        match keys.get(key) {
            None => None,
            Some(TypedValue::Str(s)) => Some(s.clone()),
            Some(_) => Some("NULL".to_string()),
        }
    }

    /// Remove `key`. Returns whether it existed; no WAL record is
    /// written for a miss.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let guard = self.keys.lock();
        let mut keys = guard.borrow_mut();
        if !keys.contains_key(key) {
            return Ok(false);
        }
        self.wal.append(&WalRecord::del(key))?;
        keys.remove(key);
        Ok(true)
    }

    /// Tag of the value under `key`, if any
    pub fn type_of(&self, key: &str) -> Option<DataType> {
        let guard = self.keys.lock();
        let keys = guard.borrow();
        keys.get(key).map(TypedValue::data_type)
    }

    /// Whether `key` is present
    pub fn exists(&self, key: &str) -> bool {
        let guard = self.keys.lock();
        let result = guard.borrow().contains_key(key);
        result
    }

    /// Number of keys in the keyspace
    pub fn len(&self) -> usize {
        let guard = self.keys.lock();
        let result = guard.borrow().len();
        result
    }

    /// Whether the keyspace is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point-in-time copy of the whole keyspace, for tests and
    /// invariant checks
    pub fn snapshot(&self) -> HashMap<String, TypedValue> {
        let guard = self.keys.lock();
        let result = guard.borrow().clone();
        result
    }

    // ========== Shared internals ==========

    /// Take the keyspace lock for the duration of a compound
    /// operation. Re-entrant: safe to call while already held.
    pub(crate) fn lock(&self) -> parking_lot::ReentrantMutexGuard<'_, RefCell<HashMap<String, TypedValue>>> {
        self.keys.lock()
    }

    /// Read a key's value through `extract`, enforcing its tag.
    ///
    /// `Ok(None)` means absent; `Err` means present with another tag
    /// (`extract` returning `None` is the mismatch signal).
    pub(crate) fn read_as<T>(
        &self,
        key: &str,
        expected: DataType,
        extract: impl FnOnce(&TypedValue) -> Option<T>,
    ) -> Result<Option<T>> {
        let guard = self.keys.lock();
        let keys = guard.borrow();
        match keys.get(key) {
            None => Ok(None),
            Some(value) => match extract(value) {
                Some(out) => Ok(Some(out)),
                None => Err(wrong_type(expected, value)),
            },
        }
    }

    /// Append `record`, then install `value` under `key`, removing the
    /// key instead when the container came out empty.
    ///
    /// The append happens first: a failed append leaves the keyspace
    /// exactly as it was.
    pub(crate) fn commit(&self, key: &str, operation: Operation, value: TypedValue) -> Result<()> {
        let guard = self.keys.lock();
        self.wal
            .append(&WalRecord::mutation(operation, key, &value))?;
        let mut keys = guard.borrow_mut();
        if value.is_empty_container() {
            keys.remove(key);
        } else {
            keys.insert(key.to_string(), value);
        }
        Ok(())
    }
}

fn wrong_type(expected: DataType, actual: &TypedValue) -> Error {
    Error::WrongType {
        expected,
        actual: actual.data_type(),
    }
}

/// Apply one replayed record to the keyspace being rebuilt
fn apply_replay(keys: &mut HashMap<String, TypedValue>, record: WalRecord) {
    match record.operation {
        Operation::Del => {
            keys.remove(&record.key);
        }
        _ => {
            // SET and every container operation carry the value that
            // resulted from the mutation; installing it is the whole
            // replay step.
            let Some(raw) = record.value else {
                warn!(key = %record.key, op = ?record.operation, "skipping WAL record with no value");
                return;
            };
            match TypedValue::from_record(&raw) {
                Ok(value) if value.is_empty_container() => {
                    keys.remove(&record.key);
                }
                Ok(value) => {
                    keys.insert(record.key, value);
                }
                Err(err) => {
                    warn!(key = %record.key, %err, "skipping unreadable WAL record");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_durability::SyncMode;
    use tempfile::tempdir;

    fn open_store(path: &std::path::Path) -> Store {
        let wal = Wal::open(path, SyncMode::OsBuffered).unwrap();
        Store::open(wal).unwrap()
    }

    #[test]
    fn test_set_get_delete_round_trip() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("wal.log"));

        assert!(store.set("foo", "bar").unwrap());
        assert_eq!(store.get("foo"), Some("bar".to_string()));
        assert_eq!(store.type_of("foo"), Some(DataType::String));

        assert!(store.delete("foo").unwrap());
        assert_eq!(store.get("foo"), None);
        assert_eq!(store.type_of("foo"), None);
        assert!(!store.delete("foo").unwrap());
        store.wal().close().unwrap();
    }

    #[test]
    fn test_set_overwrites_any_tag() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("wal.log"));

        store.lpush("k", &["a".to_string()]).unwrap();
        assert_eq!(store.type_of("k"), Some(DataType::List));

        // SET replaces the list outright; no WRONGTYPE for string SET
        store.set("k", "now a string").unwrap();
        assert_eq!(store.type_of("k"), Some(DataType::String));
        assert_eq!(store.get("k"), Some("now a string".to_string()));
        store.wal().close().unwrap();
    }

    #[test]
    fn test_get_on_non_string_answers_null_sentinel() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("wal.log"));

        store.lpush("jobs", &["a".to_string()]).unwrap();
        assert_eq!(store.get("jobs"), Some("NULL".to_string()));
        store.wal().close().unwrap();
    }

    #[test]
    fn test_replay_rebuilds_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        {
            let store = open_store(&path);
            store.set("a", "1").unwrap();
            store.set("b", "2").unwrap();
            store.delete("a").unwrap();
            store.lpush("l", &["x".to_string(), "y".to_string()]).unwrap();
            store.wal().close().unwrap();
        }

        let store = open_store(&path);
        assert_eq!(store.get("a"), None);
        assert_eq!(store.get("b"), Some("2".to_string()));
        assert_eq!(store.type_of("l"), Some(DataType::List));
        assert_eq!(store.len(), 2);
        store.wal().close().unwrap();
    }

    #[test]
    fn test_replay_skips_malformed_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");

        {
            let store = open_store(&path);
            store.set("keep", "me").unwrap();
            store.wal().close().unwrap();
        }
        // A record whose payload contradicts its tag, then garbage
        std::fs::write(
            &path,
            format!(
                "{}{}\n{}\n",
                std::fs::read_to_string(&path).unwrap(),
                r#"{"operation": "LPUSH", "key": "bad", "value": {"type": "list", "value": 7}}"#,
                "not json",
            ),
        )
        .unwrap();

        let store = open_store(&path);
        assert_eq!(store.get("keep"), Some("me".to_string()));
        assert!(!store.exists("bad"));
        store.wal().close().unwrap();
    }

    #[test]
    fn test_legacy_set_record_replays_as_string() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");
        std::fs::write(&path, "{\"operation\": \"SET\", \"key\": \"old\", \"value\": \"plain\"}\n")
            .unwrap();

        let store = open_store(&path);
        assert_eq!(store.get("old"), Some("plain".to_string()));
        assert_eq!(store.type_of("old"), Some(DataType::String));
        store.wal().close().unwrap();
    }

    #[test]
    fn test_failed_append_leaves_state_unchanged() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("wal.log"));
        store.set("k", "v").unwrap();

        // Closing the WAL makes every append fail
        store.wal().close().unwrap();

        assert!(matches!(
            store.set("k", "new"),
            Err(Error::FailedToPersist(_))
        ));
        assert!(matches!(
            store.delete("k"),
            Err(Error::FailedToPersist(_))
        ));
        assert_eq!(store.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_atomic_is_reentrant() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir.path().join("wal.log"));

        let result = store.atomic(|| {
            store.set("a", "1").unwrap();
            store.atomic(|| store.set("b", "2").unwrap());
            store.get("a")
        });
        assert_eq!(result, Some("1".to_string()));
        assert_eq!(store.len(), 2);
        store.wal().close().unwrap();
    }
}
