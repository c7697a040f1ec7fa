//! Durability layer for shoal
//!
//! This crate owns everything that touches the write-ahead log:
//! - WalRecord / Operation: the JSON-line record format
//! - SyncMode: fsync policy (Always / OsBuffered)
//! - Wal: append, replay, close, and the one-handle-per-path registry
//!
//! The engine appends a record before every in-memory commit and drains
//! `replay()` at startup to rebuild its keyspace.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod mode;
pub mod record;
pub mod wal;

pub use mode::SyncMode;
pub use record::{Operation, WalRecord};
pub use wal::{Replay, Wal};
