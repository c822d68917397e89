//! Display-profile metadata and the best-effort cache contract.

use std::{convert::Infallible, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::steam_id::SteamId64;

/// Public profile details as last fetched from Steam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub steam_id:     SteamId64,
  pub persona_name: String,
  pub profile_url:  Option<String>,
  pub avatar_url:   Option<String>,
  pub fetched_at:   DateTime<Utc>,
}

/// A side-channel cache warmed by ranked reads.
///
/// Failures are advisory: [`StatsService`](crate::service::StatsService)
/// logs and discards them.
pub trait ProfileCache: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn refresh(
    &self,
    steam_id: SteamId64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// A cache that never does anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProfileCache;

impl ProfileCache for NoopProfileCache {
  type Error = Infallible;

  async fn refresh(&self, _steam_id: SteamId64) -> Result<(), Infallible> { Ok(()) }
}
