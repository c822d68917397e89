//! The storage traits and supporting query types.
//!
//! Backends (e.g. `rankstats-store-sqlite`) implement these; the
//! [`StatsService`](crate::service::StatsService) depends only on the
//! abstraction.

use std::future::Future;

use crate::{
  matches::{MatchSearch, MatchSummary},
  profile::Profile,
  stats::PlayerRecord,
  steam_id::SteamId64,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// A short id paired with its resolved canonical id, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub short_id: String,
  pub steam_id: SteamId64,
}

/// Parameters for [`StatsStore::search`]. A row matches if any filter does.
#[derive(Debug, Clone, Default)]
pub struct PlayerSearch {
  /// Case-sensitive substring of the display name; also compared for
  /// equality against the short id.
  pub text:     String,
  /// Exact canonical id, when the query text parsed as one.
  pub steam_id: Option<SteamId64>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Read access to the joined ledger, plus the single write path that keeps
/// identities in step with it.
///
/// Every ranked read orders by score descending, then by short id ascending
/// so that consecutive pages never overlap.
pub trait StatsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Number of ledger rows, with or without an identity.
  fn count_players(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Short ids present in the ledger that have no identity row yet.
  fn unresolved_short_ids(
    &self,
  ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// Persist identities atomically: either all rows are written or none.
  ///
  /// A short id that already has an identity (e.g. written concurrently by
  /// another process) is skipped silently. Returns the number of rows
  /// actually inserted.
  fn insert_identities(
    &self,
    identities: Vec<Identity>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Ranked window of joined rows.
  fn ranked(
    &self,
    offset: u64,
    limit: u64,
  ) -> impl Future<Output = Result<Vec<PlayerRecord>, Self::Error>> + Send + '_;

  /// All joined rows matching `query`, ranked, unbounded.
  fn search(
    &self,
    query: &PlayerSearch,
  ) -> impl Future<Output = Result<Vec<PlayerRecord>, Self::Error>> + Send;

  /// Joined rows whose canonical id is `steam_id`. Implementations may stop
  /// after two rows; more than one is already an integrity violation.
  fn find_by_steam_id(
    &self,
    steam_id: SteamId64,
  ) -> impl Future<Output = Result<Vec<PlayerRecord>, Self::Error>> + Send + '_;
}

/// Persistence for cached display profiles.
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_profile(
    &self,
    steam_id: SteamId64,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// Insert or replace the profile for `profile.steam_id`.
  fn put_profile(
    &self,
    profile: Profile,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

/// Read access to the match history written by the match plugin.
///
/// Every listing orders by match id descending, newest first.
pub trait MatchStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn count_matches(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn recent_matches(
    &self,
    offset: u64,
    limit: u64,
  ) -> impl Future<Output = Result<Vec<MatchSummary>, Self::Error>> + Send + '_;

  /// All matches matching `query`, unbounded.
  fn search_matches(
    &self,
    query: &MatchSearch,
  ) -> impl Future<Output = Result<Vec<MatchSummary>, Self::Error>> + Send;
}
