//! SQLite backend for the rankstats ledger.
//!
//! Reads the `rankme` table written by the game server plugin and the
//! `sql_matches*` tables written by the match plugin, and owns the `players`
//! identity table and the `profiles` cache table. Wraps
//! [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::{DEFAULT_QUERY_TIMEOUT, SqliteStore};
