//! The match history ledger and [`MatchesService`].
//!
//! Matches are written by a separate server plugin, one summary row per
//! match plus one row per participant. Like the player ledger they are only
//! ever read here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  error::{Error, Result},
  steam_id::parse_digits,
  store::MatchStore,
};

/// Final score of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
  pub match_id:  u64,
  /// `None` when the plugin recorded no start time.
  pub played_at: Option<DateTime<Utc>>,
  pub map:       String,
  /// Rounds won by the terrorist side.
  pub score_t:   u64,
  /// Rounds won by the counter-terrorist side.
  pub score_ct:  u64,
}

/// Parameters for [`MatchStore::search_matches`]. A match is returned if any
/// filter matches.
#[derive(Debug, Clone, Default)]
pub struct MatchSearch {
  /// Case-sensitive substring of the map or of any participant's name; also
  /// compared for equality against participants' SteamID64 text.
  pub text:     String,
  /// Exact match id, when the query text is a plain number.
  pub match_id: Option<u64>,
}

/// Read-side facade over the match history, newest first.
pub struct MatchesService<S> {
  store: S,
}

impl<S: MatchStore> MatchesService<S> {
  pub fn new(store: S) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  /// Total number of recorded matches.
  pub async fn count(&self) -> Result<u64> {
    self.store.count_matches().await.map_err(Error::data_access)
  }

  /// One page of matches, newest first. `page` is 1-based.
  pub async fn list(&self, page: u32, page_size: u32) -> Result<Vec<MatchSummary>> {
    if page == 0 {
      return Err(Error::Validation("page must be at least 1".into()));
    }
    if page_size == 0 {
      return Err(Error::Validation("page size must be at least 1".into()));
    }

    let offset = u64::from(page - 1) * u64::from(page_size);
    debug!(page, page_size, offset, "listing matches");

    self
      .store
      .recent_matches(offset, u64::from(page_size))
      .await
      .map_err(Error::data_access)
  }

  /// Matches played on a map, or by a player, named by `query`; or the match
  /// whose id is `query`. Unpaginated.
  pub async fn search(&self, query: &str) -> Result<Vec<MatchSummary>> {
    if query.trim().is_empty() {
      return Err(Error::Validation("search query must not be empty".into()));
    }

    let search = MatchSearch { text: query.to_owned(), match_id: parse_digits(query) };
    debug!(query, by_match_id = search.match_id.is_some(), "searching matches");

    self
      .store
      .search_matches(&search)
      .await
      .map_err(Error::data_access)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
  };

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("backend unavailable")]
  struct Unavailable;

  /// Summaries plus `(match_id, name, steamid64)` participant rows.
  #[derive(Default)]
  struct MemoryMatches {
    matches:      Vec<MatchSummary>,
    participants: Vec<(u64, &'static str, &'static str)>,
    searches:     Mutex<Vec<MatchSearch>>,
    broken:       AtomicBool,
  }

  impl MemoryMatches {
    fn check(&self) -> Result<(), Unavailable> {
      if self.broken.load(Ordering::SeqCst) { Err(Unavailable) } else { Ok(()) }
    }

    fn newest_first(&self, keep: impl Fn(&MatchSummary) -> bool) -> Vec<MatchSummary> {
      let mut out: Vec<_> = self.matches.iter().filter(|m| keep(m)).cloned().collect();
      out.sort_by(|a, b| b.match_id.cmp(&a.match_id));
      out
    }
  }

  impl MatchStore for MemoryMatches {
    type Error = Unavailable;

    async fn count_matches(&self) -> Result<u64, Unavailable> {
      self.check()?;
      Ok(self.matches.len() as u64)
    }

    async fn recent_matches(&self, offset: u64, limit: u64) -> Result<Vec<MatchSummary>, Unavailable> {
      self.check()?;
      Ok(
        self
          .newest_first(|_| true)
          .into_iter()
          .skip(offset as usize)
          .take(limit as usize)
          .collect(),
      )
    }

    async fn search_matches(&self, query: &MatchSearch) -> Result<Vec<MatchSummary>, Unavailable> {
      self.check()?;
      self.searches.lock().unwrap().push(query.clone());
      Ok(self.newest_first(|m| {
        m.map.contains(&query.text)
          || query.match_id == Some(m.match_id)
          || self.participants.iter().any(|&(id, name, steamid64)| {
            id == m.match_id && (name.contains(&query.text) || steamid64 == query.text)
          })
      }))
    }
  }

  fn summary(match_id: u64, map: &str) -> MatchSummary {
    MatchSummary { match_id, played_at: None, map: map.into(), score_t: 16, score_ct: 9 }
  }

  fn service() -> MatchesService<MemoryMatches> {
    MatchesService::new(MemoryMatches {
      matches: vec![summary(1, "de_dust2"), summary(2, "de_inferno"), summary(3, "de_dust2")],
      participants: vec![(1, "alice", "76561197960265730"), (2, "bob", "76561197960265731")],
      ..MemoryMatches::default()
    })
  }

  fn ids(matches: &[MatchSummary]) -> Vec<u64> { matches.iter().map(|m| m.match_id).collect() }

  #[tokio::test]
  async fn list_pages_newest_first() {
    let svc = service();
    assert_eq!(svc.count().await.unwrap(), 3);
    assert_eq!(ids(&svc.list(1, 2).await.unwrap()), [3, 2]);
    assert_eq!(ids(&svc.list(2, 2).await.unwrap()), [1]);
    assert!(svc.list(3, 2).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn list_rejects_zero_page_and_size() {
    let svc = service();
    assert!(matches!(svc.list(0, 10).await, Err(Error::Validation(_))));
    assert!(matches!(svc.list(1, 0).await, Err(Error::Validation(_))));
  }

  #[tokio::test]
  async fn search_by_map_player_and_id() {
    let svc = service();
    assert_eq!(ids(&svc.search("dust").await.unwrap()), [3, 1]);
    assert_eq!(ids(&svc.search("bob").await.unwrap()), [2]);
    assert_eq!(ids(&svc.search("76561197960265730").await.unwrap()), [1]);
    assert_eq!(ids(&svc.search("3").await.unwrap()), [3]);
    assert!(svc.search("nuke").await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn signed_query_is_not_a_match_id() {
    let svc = service();
    assert!(svc.search("+3").await.unwrap().is_empty());
    let searches = svc.store().searches.lock().unwrap();
    assert_eq!(searches[0].match_id, None);
  }

  #[tokio::test]
  async fn blank_search_is_rejected() {
    let svc = service();
    assert!(matches!(svc.search("").await, Err(Error::Validation(_))));
    assert!(matches!(svc.search("  ").await, Err(Error::Validation(_))));
  }

  #[tokio::test]
  async fn store_failures_surface_as_data_access() {
    let svc = service();
    svc.store().broken.store(true, Ordering::SeqCst);
    assert!(matches!(svc.count().await, Err(Error::DataAccess(_))));
    assert!(matches!(svc.list(1, 5).await, Err(Error::DataAccess(_))));
    assert!(matches!(svc.search("dust").await, Err(Error::DataAccess(_))));
  }
}
