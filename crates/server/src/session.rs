//! Per-connection transaction coordinator
//!
//! Each connection owns one `Session`. Outside a transaction, commands
//! dispatch straight through. MULTI flips the session into queueing
//! mode: every command except EXEC/DISCARD/MULTI is appended to the
//! queue and answered `QUEUED`, with no validation beyond tokenizing.
//! EXEC drains the queue in order while holding the engine's keyspace
//! lock, so no other connection can interleave a mutation; per-command
//! errors are collected like any other response and never abort the
//! batch. There is no rollback and no WATCH.

use crate::dispatch::apply;
use shoal_engine::Store;
use std::collections::VecDeque;
use std::sync::Arc;

/// Transaction state machine for one client connection
pub struct Session {
    store: Arc<Store>,
    in_txn: bool,
    queue: VecDeque<Vec<String>>,
}

impl Session {
    /// New idle session against the shared store
    pub fn new(store: Arc<Store>) -> Session {
        Session {
            store,
            in_txn: false,
            queue: VecDeque::new(),
        }
    }

    /// Whether the session is currently queueing a transaction
    pub fn in_transaction(&self) -> bool {
        self.in_txn
    }

    /// Handle one decoded command tuple and produce the response line
    pub fn execute(&mut self, argv: Vec<String>) -> String {
        let op = argv
            .first()
            .map(|token| token.to_ascii_uppercase())
            .unwrap_or_default();

        match op.as_str() {
            "MULTI" => {
                if self.in_txn {
                    return "ERR: Cannot be in a Nested Transaction State".to_string();
                }
                self.in_txn = true;
                self.queue.clear();
                "OK".to_string()
            }
            "EXEC" => {
                if !self.in_txn {
                    return "ERR: Not in Transaction Mode for EXEC".to_string();
                }
                let queued: Vec<Vec<String>> = self.queue.drain(..).collect();
                let store = &self.store;
                // The whole batch runs under the keyspace lock; each
                // drained command re-acquires it re-entrantly.
                let responses: Vec<String> =
                    store.atomic(|| queued.iter().map(|cmd| apply(store, cmd)).collect());
                self.in_txn = false;
                responses.join("\n")
            }
            "DISCARD" => {
                if !self.in_txn {
                    return "ERR: Not in Transaction Mode for DISCARD".to_string();
                }
                self.in_txn = false;
                self.queue.clear();
                "OK".to_string()
            }
            _ if self.in_txn => {
                self.queue.push_back(argv);
                "QUEUED".to_string()
            }
            _ => apply(&self.store, &argv),
        }
    }
}
