//! Error types for `rankstats-core`.

use thiserror::Error;

use crate::steam_id::SteamId64;

/// Failure to convert a short identifier into a [`SteamId64`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
  #[error("unrecognised steam id format: {0:?}")]
  Format(String),

  #[error("steam id {0:?} is outside the individual account range")]
  OutOfRange(String),
}

#[derive(Debug, Error)]
pub enum Error {
  /// Aborts the backfill pass that hit it.
  #[error("identity resolution failed: {0}")]
  Resolution(#[from] ResolutionError),

  #[error("data access error: {0}")]
  DataAccess(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("player not found: {0}")]
  NotFound(SteamId64),

  #[error("invalid argument: {0}")]
  Validation(String),

  #[error("steam id {0} is shared by more than one player")]
  DuplicateIdentity(SteamId64),
}

impl Error {
  pub(crate) fn data_access<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::DataAccess(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
