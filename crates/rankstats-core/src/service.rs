//! [`StatsService`]: the aggregation pipeline callers talk to.
//!
//! Joins ledger rows to identities through a [`StatsStore`], derives ratios,
//! and warms the injected [`ProfileCache`] for ranked reads.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
  error::{Error, Result},
  profile::ProfileCache,
  stats::{PlayerRecord, PlayerView},
  steam_id::{IdentityResolver, SteamId64, SteamIdResolver},
  store::{Identity, PlayerSearch, StatsStore},
};

/// Outcome of [`StatsService::ensure_identities`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
  /// Short ids that had no identity when the pass started.
  pub missing:  u64,
  /// Identity rows this pass wrote. Lower than `missing` only when another
  /// process filled the gap concurrently.
  pub inserted: u64,
}

/// Read-side facade over the player ledger.
pub struct StatsService<S, C, R = SteamIdResolver> {
  store:    S,
  cache:    C,
  resolver: R,
}

impl<S, C> StatsService<S, C>
where
  S: StatsStore,
  C: ProfileCache,
{
  pub fn new(store: S, cache: C) -> Self { Self::with_resolver(store, cache, SteamIdResolver) }
}

impl<S, C, R> StatsService<S, C, R>
where
  S: StatsStore,
  C: ProfileCache,
  R: IdentityResolver,
{
  pub fn with_resolver(store: S, cache: C, resolver: R) -> Self {
    Self { store, cache, resolver }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn resolver(&self) -> &R { &self.resolver }

  // ── Backfill ──────────────────────────────────────────────────────────────

  /// Give every ledger row an identity row.
  ///
  /// All short ids are resolved before anything is written, so a single
  /// malformed id aborts the pass with no rows inserted. Safe to call
  /// repeatedly; a pass with nothing to do performs no writes.
  pub async fn ensure_identities(&self) -> Result<BackfillReport> {
    let missing = self
      .store
      .unresolved_short_ids()
      .await
      .map_err(Error::data_access)?;

    if missing.is_empty() {
      debug!("all ledger rows already have identities");
      return Ok(BackfillReport::default());
    }

    let identities = missing
      .iter()
      .map(|short_id| -> Result<Identity> {
        let steam_id = self.resolver.resolve(short_id)?;
        Ok(Identity { short_id: short_id.clone(), steam_id })
      })
      .collect::<Result<Vec<_>>>()?;

    let report = BackfillReport {
      missing:  identities.len() as u64,
      inserted: self
        .store
        .insert_identities(identities)
        .await
        .map_err(Error::data_access)?,
    };

    info!(missing = report.missing, inserted = report.inserted, "identity backfill complete");
    Ok(report)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Total number of ledger rows.
  pub async fn count(&self) -> Result<u64> {
    self.store.count_players().await.map_err(Error::data_access)
  }

  /// One page of the ranking. `page` is 1-based.
  pub async fn list(&self, page: u32, page_size: u32) -> Result<Vec<PlayerView>> {
    if page == 0 {
      return Err(Error::Validation("page must be at least 1".into()));
    }
    if page_size == 0 {
      return Err(Error::Validation("page size must be at least 1".into()));
    }

    let offset = u64::from(page - 1) * u64::from(page_size);
    debug!(page, page_size, offset, "listing players");

    let records = self
      .store
      .ranked(offset, u64::from(page_size))
      .await
      .map_err(Error::data_access)?;
    Ok(self.present(records, true).await)
  }

  /// The `n` highest-scoring players.
  pub async fn top(&self, n: u32) -> Result<Vec<PlayerView>> {
    if n == 0 {
      return Err(Error::Validation("top count must be at least 1".into()));
    }

    let records = self
      .store
      .ranked(0, u64::from(n))
      .await
      .map_err(Error::data_access)?;
    Ok(self.present(records, true).await)
  }

  /// Players whose name contains `query`, or whose short or canonical id
  /// equals it. Unpaginated, and does not warm the profile cache.
  pub async fn search(&self, query: &str) -> Result<Vec<PlayerView>> {
    if query.trim().is_empty() {
      return Err(Error::Validation("search query must not be empty".into()));
    }

    let search = PlayerSearch {
      text:     query.to_owned(),
      steam_id: query.parse::<SteamId64>().ok(),
    };
    debug!(query, by_steam_id = search.steam_id.is_some(), "searching players");

    let records = self.store.search(&search).await.map_err(Error::data_access)?;
    Ok(self.present(records, false).await)
  }

  /// The single player owning `steam_id`.
  pub async fn get(&self, steam_id: SteamId64) -> Result<PlayerView> {
    let mut records = self
      .store
      .find_by_steam_id(steam_id)
      .await
      .map_err(Error::data_access)?;

    if records.len() > 1 {
      return Err(Error::DuplicateIdentity(steam_id));
    }
    let record = records.pop().ok_or(Error::NotFound(steam_id))?;

    self.warm(record.steam_id).await;
    Ok(PlayerView::from_record(record))
  }

  // ── Helpers ───────────────────────────────────────────────────────────────

  async fn present(&self, records: Vec<PlayerRecord>, warm: bool) -> Vec<PlayerView> {
    let mut views = Vec::with_capacity(records.len());
    for record in records {
      if warm {
        self.warm(record.steam_id).await;
      }
      views.push(PlayerView::from_record(record));
    }
    views
  }

  async fn warm(&self, steam_id: SteamId64) {
    if let Err(e) = self.cache.refresh(steam_id).await {
      warn!(%steam_id, error = %e, "profile refresh failed");
    }
  }
}
