//! Network front end for shoal
//!
//! - dispatch: command tuple in, response string out
//! - session: per-connection MULTI/EXEC/DISCARD coordinator
//! - server: TCP accept loop and line framing
//! - config: CLI surface for the binary

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatch;
pub mod server;
pub mod session;

pub use config::Config;
pub use dispatch::apply;
pub use server::serve;
pub use session::Session;
