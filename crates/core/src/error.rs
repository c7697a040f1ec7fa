//! Error types for shoal
//!
//! One unified error enum for the whole system, built with `thiserror`.
//! The engine signals failures through this type; the dispatcher turns
//! them into `ERR <message>` response strings at the protocol boundary.

use crate::value::DataType;
use std::io;
use thiserror::Error;

/// Result type alias for shoal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the shoal store
#[derive(Debug, Error)]
pub enum Error {
    /// Operation applied to a key whose tag disallows it.
    ///
    /// The keyspace is never mutated and no WAL record is written when
    /// this is returned.
    #[error("WRONGTYPE key holds {actual}, not {expected}")]
    WrongType {
        /// Tag the operation requires
        expected: DataType,
        /// Tag the key actually holds
        actual: DataType,
    },

    /// WAL append or fsync failed; the mutation was not applied
    #[error("failed to persist WAL record: {0}")]
    FailedToPersist(#[source] io::Error),

    /// I/O error outside the append path (open, replay, close)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A numeric command argument could not be parsed
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A WAL record's value payload does not match its tag
    #[error("malformed value record: {0}")]
    InvalidRecord(String),
}

impl Error {
    /// Check if this error is a type mismatch
    ///
    /// WRONGTYPE failures are the only engine errors that are part of
    /// normal command flow; everything else indicates an I/O or protocol
    /// problem.
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, Error::WrongType { .. })
    }
}
