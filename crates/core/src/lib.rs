//! Core types for shoal
//!
//! This crate defines the foundational types used throughout the system:
//! - DataType: tag discriminating what a key holds
//! - TypedValue: tagged value stored under a key, with WAL record conversions
//! - Error: the unified error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod value;

pub use error::{Error, Result};
pub use value::{DataType, TypedValue};
