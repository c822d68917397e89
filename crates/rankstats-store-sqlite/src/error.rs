//! Error type for `rankstats-store-sqlite`.

use std::time::Duration;

use rankstats_core::SteamId64;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// The statement was interrupted after running past the store deadline.
  #[error("query exceeded deadline of {0:?}")]
  Timeout(Duration),

  #[error("malformed row: {0}")]
  Decode(String),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("steam id {0} does not fit in an SQLite integer")]
  IdOutOfRange(SteamId64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
