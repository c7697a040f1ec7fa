//! List operations
//!
//! A key tagged LIST holds an ordered sequence of strings with cheap
//! pushes and pops at both ends. Pushing to an absent key creates the
//! list; popping the last element removes the key. Every mutation
//! persists the full resulting list in its WAL record.

use crate::store::Store;
use shoal_core::{DataType, Result, TypedValue};
use shoal_durability::Operation;
use std::collections::VecDeque;

impl Store {
    /// Prepend `values` as a block to the front of the list.
    ///
    /// The block keeps its argument order, so the first value supplied
    /// ends up leftmost of the new prefix. Creates the list when the
    /// key is absent. Returns the new length.
    pub fn lpush(&self, key: &str, values: &[String]) -> Result<usize> {
        let _guard = self.lock();
        let next = match self.read_as(key, DataType::List, as_list)? {
            None => values.iter().cloned().collect::<VecDeque<_>>(),
            Some(existing) => {
                let mut next: VecDeque<String> = values.iter().cloned().collect();
                next.extend(existing);
                next
            }
        };
        let len = next.len();
        self.commit(key, Operation::Lpush, TypedValue::List(next))?;
        Ok(len)
    }

    /// Append `values` at the tail, preserving argument order. Creates
    /// the list when the key is absent. Returns the new length.
    pub fn rpush(&self, key: &str, values: &[String]) -> Result<usize> {
        let _guard = self.lock();
        let mut next = self
            .read_as(key, DataType::List, as_list)?
            .unwrap_or_default();
        next.extend(values.iter().cloned());
        let len = next.len();
        self.commit(key, Operation::Rpush, TypedValue::List(next))?;
        Ok(len)
    }

    /// Remove and return the head element, or `None` if the key is
    /// absent. Removes the key when the list empties.
    pub fn lpop(&self, key: &str) -> Result<Option<String>> {
        self.pop(key, Operation::Lpop, VecDeque::pop_front)
    }

    /// Remove and return the tail element, or `None` if the key is
    /// absent. Removes the key when the list empties.
    pub fn rpop(&self, key: &str) -> Result<Option<String>> {
        self.pop(key, Operation::Rpop, VecDeque::pop_back)
    }

    fn pop(
        &self,
        key: &str,
        operation: Operation,
        take: impl FnOnce(&mut VecDeque<String>) -> Option<String>,
    ) -> Result<Option<String>> {
        let _guard = self.lock();
        let Some(mut list) = self.read_as(key, DataType::List, as_list)? else {
            return Ok(None);
        };
        let Some(element) = take(&mut list) else {
            return Ok(None);
        };
        self.commit(key, operation, TypedValue::List(list))?;
        Ok(Some(element))
    }

    /// Elements from `start` through `stop` inclusive; `stop == -1`
    /// means through the end. An absent key yields an empty sequence.
    /// Reads never touch the WAL.
    pub fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let _guard = self.lock();
        let Some(list) = self.read_as(key, DataType::List, as_list)? else {
            return Ok(Vec::new());
        };
        let (lo, hi) = range_bounds(list.len(), start, stop);
        Ok(list.into_iter().skip(lo).take(hi - lo).collect())
    }

    /// Length of the list, 0 when the key is absent
    pub fn llen(&self, key: &str) -> Result<usize> {
        let _guard = self.lock();
        Ok(self
            .read_as(key, DataType::List, |v| as_list(v).map(|l| l.len()))?
            .unwrap_or(0))
    }
}

fn as_list(value: &TypedValue) -> Option<VecDeque<String>> {
    match value {
        TypedValue::List(l) => Some(l.clone()),
        _ => None,
    }
}

/// Resolve an inclusive `[start, stop]` request into half-open bounds.
/// Negative indices count from the end; out-of-range bounds clamp
/// rather than error.
fn range_bounds(len: usize, start: i64, stop: i64) -> (usize, usize) {
    let clamp = |i: i64| -> usize {
        if i < 0 {
            (len as i64 + i).max(0) as usize
        } else {
            (i as usize).min(len)
        }
    };
    let lo = clamp(start);
    let hi = if stop == -1 { len } else { clamp(stop + 1) };
    (lo, hi.max(lo))
}
