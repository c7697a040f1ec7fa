//! # shoal
//!
//! An in-memory, single-node, typed key-value store with a Redis-style
//! text protocol, a write-ahead log for crash recovery, and
//! per-connection MULTI/EXEC/DISCARD batching.
//!
//! # Quick start
//!
//! ```no_run
//! use shoal::{Store, SyncMode, Wal};
//! use std::sync::Arc;
//!
//! fn main() -> shoal::Result<()> {
//!     let wal = Wal::open("wal.log", SyncMode::Always)?;
//!     let store = Arc::new(Store::open(wal)?);
//!
//!     store.set("user:name", "Alice")?;
//!     assert_eq!(store.get("user:name"), Some("Alice".into()));
//!
//!     store.rpush("jobs", &["a".into(), "b".into()])?;
//!     assert_eq!(store.llen("jobs")?, 2);
//!
//!     store.wal().close()?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! | Crate | Responsibility |
//! |-------|----------------|
//! | `shoal-core` | Tagged values and the error taxonomy |
//! | `shoal-durability` | WAL records, fsync policy, append/replay |
//! | `shoal-engine` | Keyspace, typed operations, write-through |
//! | `shoal-server` | Dispatcher, sessions, TCP front end |
//!
//! Every mutation appends its WAL record before the in-memory state
//! changes, and startup replays the WAL from the beginning, so the
//! store after a crash equals the store that wrote the log.

pub use shoal_core::{DataType, Error, Result, TypedValue};
pub use shoal_durability::{Operation, Replay, SyncMode, Wal, WalRecord};
pub use shoal_engine::Store;
pub use shoal_server::{apply, serve, Config, Session};
