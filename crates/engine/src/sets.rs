//! Set operations
//!
//! A key tagged SET holds unordered unique strings. Removing the last
//! member removes the key. Random sampling (SRANDMEMBER, SPOP) uses the
//! thread-local generator; SRANDMEMBER never mutates. Every mutation
//! persists the full resulting set in its WAL record.

use crate::store::Store;
use rand::seq::IteratorRandom;
use rand::Rng;
use shoal_core::{DataType, Result, TypedValue};
use shoal_durability::Operation;
use std::collections::HashSet;

impl Store {
    /// Add `members`, creating the set if absent. Returns how many were
    /// newly added; a call that adds nothing writes no WAL record.
    pub fn sadd(&self, key: &str, members: &[String]) -> Result<usize> {
        let _guard = self.lock();
        let mut set = self
            .read_as(key, DataType::Set, as_set)?
            .unwrap_or_default();
        let mut added = 0;
        for member in members {
            if set.insert(member.clone()) {
                added += 1;
            }
        }
        if added == 0 {
            return Ok(0);
        }
        self.commit(key, Operation::Sadd, TypedValue::Set(set))?;
        Ok(added)
    }

    /// Remove `members`. Returns how many were present. Removes the key
    /// when the set empties; a call that removes nothing writes no WAL
    /// record.
    pub fn srem(&self, key: &str, members: &[String]) -> Result<usize> {
        let _guard = self.lock();
        let Some(mut set) = self.read_as(key, DataType::Set, as_set)? else {
            return Ok(0);
        };
        let mut removed = 0;
        for member in members {
            if set.remove(member) {
                removed += 1;
            }
        }
        if removed == 0 {
            return Ok(0);
        }
        self.commit(key, Operation::Srem, TypedValue::Set(set))?;
        Ok(removed)
    }

    /// Whether `member` is in the set (false for an absent key)
    pub fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let _guard = self.lock();
        Ok(self
            .read_as(key, DataType::Set, |v| {
                as_set_ref(v).map(|s| s.contains(member))
            })?
            .unwrap_or(false))
    }

    /// Membership for each of `members`, aligned with the input
    pub fn smismember(&self, key: &str, members: &[String]) -> Result<Vec<bool>> {
        let _guard = self.lock();
        let Some(set) = self.read_as(key, DataType::Set, as_set)? else {
            return Ok(vec![false; members.len()]);
        };
        Ok(members.iter().map(|m| set.contains(m)).collect())
    }

    /// Snapshot of the members. Order is unspecified but stable within
    /// a single call; empty for an absent key.
    pub fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let _guard = self.lock();
        Ok(self
            .read_as(key, DataType::Set, |v| {
                as_set_ref(v).map(|s| s.iter().cloned().collect())
            })?
            .unwrap_or_default())
    }

    /// Number of members, 0 when the key is absent
    pub fn scard(&self, key: &str) -> Result<usize> {
        let _guard = self.lock();
        Ok(self
            .read_as(key, DataType::Set, |v| as_set_ref(v).map(|s| s.len()))?
            .unwrap_or(0))
    }

    /// One random member without removing it, `None` when the key is
    /// absent
    pub fn srandmember(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock();
        let Some(set) = self.read_as(key, DataType::Set, as_set)? else {
            return Ok(None);
        };
        let mut rng = rand::thread_rng();
        Ok(set.iter().choose(&mut rng).cloned())
    }

    /// Random members without removing any.
    ///
    /// A positive `count` yields up to `count` distinct members; a
    /// negative one yields `|count|` members sampled with replacement.
    pub fn srandmember_count(&self, key: &str, count: i64) -> Result<Vec<String>> {
        let _guard = self.lock();
        let Some(set) = self.read_as(key, DataType::Set, as_set)? else {
            return Ok(Vec::new());
        };
        if count == 0 || set.is_empty() {
            return Ok(Vec::new());
        }
        let mut rng = rand::thread_rng();
        if count > 0 {
            Ok(set
                .iter()
                .choose_multiple(&mut rng, count as usize)
                .into_iter()
                .cloned()
                .collect())
        } else {
            let members: Vec<&String> = set.iter().collect();
            Ok((0..count.unsigned_abs())
                .map(|_| members[rng.gen_range(0..members.len())].clone())
                .collect())
        }
    }

    /// Remove and return a random member, `None` when the key is
    /// absent. Removes the key when the set empties.
    pub fn spop(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock();
        let Some(mut set) = self.read_as(key, DataType::Set, as_set)? else {
            return Ok(None);
        };
        let mut rng = rand::thread_rng();
        let Some(member) = set.iter().choose(&mut rng).cloned() else {
            return Ok(None);
        };
        set.remove(&member);
        self.commit(key, Operation::Spop, TypedValue::Set(set))?;
        Ok(Some(member))
    }
}

fn as_set(value: &TypedValue) -> Option<HashSet<String>> {
    as_set_ref(value).cloned()
}

fn as_set_ref(value: &TypedValue) -> Option<&HashSet<String>> {
    match value {
        TypedValue::Set(s) => Some(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoal_core::Error;
    use shoal_durability::{SyncMode, Wal};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn open_store(dir: &tempfile::TempDir) -> Store {
        let wal = Wal::open(dir.path().join("wal.log"), SyncMode::OsBuffered).unwrap();
        Store::open(wal).unwrap()
    }

    fn members(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sadd_counts_only_new_members() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);

        assert_eq!(store.sadd("s", &members(&["a", "b", "a"])).unwrap(), 2);
        assert_eq!(store.sadd("s", &members(&["b", "c"])).unwrap(), 1);
        assert_eq!(store.scard("s").unwrap(), 3);
        store.wal().close().unwrap();
    }

    #[test]
    fn test_sadd_of_nothing_new_writes_no_record() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.sadd("s", &members(&["a"])).unwrap();
        let before = store.wal().size().unwrap();

        assert_eq!(store.sadd("s", &members(&["a"])).unwrap(), 0);
        assert_eq!(store.wal().size().unwrap(), before);
        store.wal().close().unwrap();
    }

    #[test]
    fn test_srem_and_empty_set_gc() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.sadd("s", &members(&["a", "b"])).unwrap();

        assert_eq!(store.srem("s", &members(&["a", "nope"])).unwrap(), 1);
        assert!(store.exists("s"));
        assert_eq!(store.srem("s", &members(&["b"])).unwrap(), 1);
        assert!(!store.exists("s"));
        assert_eq!(store.type_of("s"), None);
        assert_eq!(store.srem("s", &members(&["a"])).unwrap(), 0);
        store.wal().close().unwrap();
    }

    #[test]
    fn test_membership_queries() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.sadd("s", &members(&["a", "b"])).unwrap();

        assert!(store.sismember("s", "a").unwrap());
        assert!(!store.sismember("s", "z").unwrap());
        assert!(!store.sismember("missing", "a").unwrap());
        assert_eq!(
            store.smismember("s", &members(&["a", "z", "b"])).unwrap(),
            vec![true, false, true]
        );
        assert_eq!(
            store.smismember("missing", &members(&["a"])).unwrap(),
            vec![false]
        );

        let mut all = store.smembers("s").unwrap();
        all.sort();
        assert_eq!(all, members(&["a", "b"]));
        assert!(store.smembers("missing").unwrap().is_empty());
        store.wal().close().unwrap();
    }

    #[test]
    fn test_srandmember_samples_without_mutating() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.sadd("s", &members(&["a", "b", "c"])).unwrap();
        let before = store.wal().size().unwrap();

        let one = store.srandmember("s").unwrap().unwrap();
        assert!(store.sismember("s", &one).unwrap());

        let distinct = store.srandmember_count("s", 2).unwrap();
        assert_eq!(distinct.len(), 2);
        let unique: HashSet<_> = distinct.iter().collect();
        assert_eq!(unique.len(), 2);

        // More distinct members than exist caps at the cardinality
        assert_eq!(store.srandmember_count("s", 10).unwrap().len(), 3);

        // Negative count samples with replacement
        let replaced = store.srandmember_count("s", -5).unwrap();
        assert_eq!(replaced.len(), 5);
        for m in &replaced {
            assert!(store.sismember("s", m).unwrap());
        }

        assert_eq!(store.srandmember("missing").unwrap(), None);
        assert!(store.srandmember_count("missing", 3).unwrap().is_empty());
        assert_eq!(store.scard("s").unwrap(), 3);
        assert_eq!(store.wal().size().unwrap(), before);
        store.wal().close().unwrap();
    }

    #[test]
    fn test_spop_drains_to_key_removal() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.sadd("s", &members(&["a", "b", "c"])).unwrap();

        let mut popped = HashSet::new();
        for _ in 0..3 {
            popped.insert(store.spop("s").unwrap().unwrap());
        }
        assert_eq!(popped.len(), 3);
        assert!(!store.exists("s"));
        assert_eq!(store.spop("s").unwrap(), None);
        store.wal().close().unwrap();
    }

    #[test]
    fn test_wrong_tag_fails_without_mutating() {
        let dir = tempdir().unwrap();
        let store = open_store(&dir);
        store.set("k", "scalar").unwrap();

        assert!(matches!(
            store.sadd("k", &members(&["a"])),
            Err(Error::WrongType { .. })
        ));
        assert!(matches!(store.smembers("k"), Err(Error::WrongType { .. })));
        assert!(matches!(store.spop("k"), Err(Error::WrongType { .. })));
        assert_eq!(store.get("k"), Some("scalar".to_string()));
        store.wal().close().unwrap();
    }

    #[test]
    fn test_set_survives_replay() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wal.log");
        {
            let wal = Wal::open(&path, SyncMode::OsBuffered).unwrap();
            let store = Store::open(Arc::clone(&wal)).unwrap();
            store.sadd("s", &members(&["a", "b", "c"])).unwrap();
            store.srem("s", &members(&["b"])).unwrap();
            wal.close().unwrap();
        }

        let wal = Wal::open(&path, SyncMode::OsBuffered).unwrap();
        let store = Store::open(Arc::clone(&wal)).unwrap();
        let mut all = store.smembers("s").unwrap();
        all.sort();
        assert_eq!(all, members(&["a", "c"]));
        wal.close().unwrap();
    }
}
