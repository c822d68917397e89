//! Error type for `rankstats-steam`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("steam api returned {0}")]
  Status(reqwest::StatusCode),

  #[error("profile store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("steam api returned a malformed steam id: {0:?}")]
  InvalidSteamId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
