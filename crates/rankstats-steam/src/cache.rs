//! [`SteamProfileCache`]: TTL cache of Steam profiles over a [`ProfileStore`].

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use rankstats_core::{SteamId64, profile::ProfileCache, store::ProfileStore};
use tracing::debug;

use crate::{Error, Result, client::{ProfileFetcher, SteamApiClient}};

/// How long a fetched profile is served before it is fetched again.
pub const DEFAULT_PROFILE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub struct SteamProfileCache<S, F = SteamApiClient> {
  store:   S,
  fetcher: F,
  ttl:     TimeDelta,
}

impl<S, F> SteamProfileCache<S, F>
where
  S: ProfileStore,
  F: ProfileFetcher,
{
  pub fn new(store: S, fetcher: F, ttl: Duration) -> Self {
    Self {
      store,
      fetcher,
      ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
    }
  }

  fn store_err(e: S::Error) -> Error { Error::Store(Box::new(e)) }
}

impl<S, F> ProfileCache for SteamProfileCache<S, F>
where
  S: ProfileStore,
  F: ProfileFetcher,
{
  type Error = Error;

  async fn refresh(&self, steam_id: SteamId64) -> Result<()> {
    let cached = self
      .store
      .get_profile(steam_id)
      .await
      .map_err(Self::store_err)?;

    let now = Utc::now();
    if cached.is_some_and(|p| now.signed_duration_since(p.fetched_at) < self.ttl) {
      debug!(%steam_id, "cached profile still fresh");
      return Ok(());
    }

    match self.fetcher.fetch(steam_id).await? {
      Some(profile) => {
        debug!(%steam_id, persona = %profile.persona_name, "storing fetched profile");
        self.store.put_profile(profile).await.map_err(Self::store_err)
      }
      None => {
        debug!(%steam_id, "steam has no profile for this account");
        Ok(())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{
      Mutex,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use chrono::DateTime;
  use rankstats_core::profile::Profile;

  use super::*;

  #[derive(Debug, thiserror::Error)]
  #[error("store offline")]
  struct Offline;

  #[derive(Default)]
  struct MemoryProfiles(Mutex<HashMap<SteamId64, Profile>>);

  impl ProfileStore for MemoryProfiles {
    type Error = Offline;

    async fn get_profile(&self, id: SteamId64) -> Result<Option<Profile>, Offline> {
      Ok(self.0.lock().unwrap().get(&id).cloned())
    }

    async fn put_profile(&self, profile: Profile) -> Result<(), Offline> {
      self.0.lock().unwrap().insert(profile.steam_id, profile);
      Ok(())
    }
  }

  /// Answers with a fixed persona name, or fails with a 503.
  struct FakeSteam {
    persona: Option<&'static str>,
    calls:   AtomicUsize,
    down:    bool,
  }

  impl FakeSteam {
    fn knowing(persona: &'static str) -> Self {
      Self { persona: Some(persona), calls: AtomicUsize::new(0), down: false }
    }
  }

  impl ProfileFetcher for FakeSteam {
    async fn fetch(&self, steam_id: SteamId64) -> Result<Option<Profile>> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.down {
        return Err(Error::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE));
      }
      Ok(self.persona.map(|name| Profile {
        steam_id,
        persona_name: name.into(),
        profile_url: None,
        avatar_url: None,
        fetched_at: Utc::now(),
      }))
    }
  }

  const ALICE: SteamId64 = SteamId64::from_account_id(2);

  fn stored(name: &str, fetched_at: DateTime<Utc>) -> Profile {
    Profile {
      steam_id: ALICE,
      persona_name: name.into(),
      profile_url: None,
      avatar_url: None,
      fetched_at,
    }
  }

  fn cache(fetcher: FakeSteam) -> SteamProfileCache<MemoryProfiles, FakeSteam> {
    SteamProfileCache::new(MemoryProfiles::default(), fetcher, Duration::from_secs(3600))
  }

  #[tokio::test]
  async fn missing_profile_is_fetched_and_stored() {
    let c = cache(FakeSteam::knowing("alice"));
    c.refresh(ALICE).await.unwrap();

    assert_eq!(c.fetcher.calls.load(Ordering::SeqCst), 1);
    let profile = c.store.get_profile(ALICE).await.unwrap().unwrap();
    assert_eq!(profile.persona_name, "alice");
  }

  #[tokio::test]
  async fn fresh_profile_is_not_refetched() {
    let c = cache(FakeSteam::knowing("alice-new"));
    c.store.put_profile(stored("alice", Utc::now())).await.unwrap();

    c.refresh(ALICE).await.unwrap();

    assert_eq!(c.fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(c.store.get_profile(ALICE).await.unwrap().unwrap().persona_name, "alice");
  }

  #[tokio::test]
  async fn stale_profile_is_replaced() {
    let c = cache(FakeSteam::knowing("alice-new"));
    let old = Utc::now() - TimeDelta::hours(2);
    c.store.put_profile(stored("alice", old)).await.unwrap();

    c.refresh(ALICE).await.unwrap();

    assert_eq!(c.fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(c.store.get_profile(ALICE).await.unwrap().unwrap().persona_name, "alice-new");
  }

  #[tokio::test]
  async fn unknown_account_stores_nothing() {
    let c = cache(FakeSteam { persona: None, calls: AtomicUsize::new(0), down: false });
    c.refresh(ALICE).await.unwrap();
    assert!(c.store.get_profile(ALICE).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn api_failure_is_reported() {
    let c = cache(FakeSteam { persona: Some("x"), calls: AtomicUsize::new(0), down: true });
    assert!(matches!(c.refresh(ALICE).await, Err(Error::Status(s)) if s.as_u16() == 503));
  }
}
