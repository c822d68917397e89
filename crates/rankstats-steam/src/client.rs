//! Async HTTP client for the Steam Web API player summaries endpoint.

use std::{future::Future, time::Duration};

use chrono::Utc;
use rankstats_core::{SteamId64, profile::Profile};
use reqwest::Client;
use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.steampowered.com";

/// Source of fresh profile data for [`SteamProfileCache`](crate::SteamProfileCache).
pub trait ProfileFetcher: Send + Sync {
  /// Fetch the current profile, or `None` if Steam does not know the account.
  fn fetch(
    &self,
    steam_id: SteamId64,
  ) -> impl Future<Output = Result<Option<Profile>>> + Send + '_;
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Connection settings for the Steam Web API.
#[derive(Debug, Clone)]
pub struct SteamApiConfig {
  pub base_url: String,
  pub api_key:  String,
}

impl SteamApiConfig {
  pub fn new(api_key: impl Into<String>) -> Self {
    Self { base_url: DEFAULT_BASE_URL.to_owned(), api_key: api_key.into() }
  }
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SteamApiClient {
  client: Client,
  config: SteamApiConfig,
}

impl SteamApiClient {
  pub fn new(config: SteamApiConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  /// `GET /ISteamUser/GetPlayerSummaries/v0002/?steamids=<id>`
  pub async fn player_summary(&self, steam_id: SteamId64) -> Result<Option<PlayerSummary>> {
    let resp = self
      .client
      .get(self.url("/ISteamUser/GetPlayerSummaries/v0002/"))
      .query(&[
        ("key", self.config.api_key.clone()),
        ("steamids", steam_id.to_string()),
      ])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status(resp.status()));
    }
    let envelope: SummariesEnvelope = resp.json().await?;
    envelope.summary_for(steam_id)
  }
}

impl ProfileFetcher for SteamApiClient {
  async fn fetch(&self, steam_id: SteamId64) -> Result<Option<Profile>> {
    Ok(self.player_summary(steam_id).await?.map(|summary| Profile {
      steam_id,
      persona_name: summary.personaname,
      profile_url: summary.profileurl,
      avatar_url: summary.avatarfull,
      fetched_at: Utc::now(),
    }))
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SummariesEnvelope {
  response: SummariesBody,
}

#[derive(Debug, Deserialize)]
struct SummariesBody {
  #[serde(default)]
  players: Vec<PlayerSummary>,
}

/// The subset of a Steam player summary that rankstats keeps.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSummary {
  pub steamid:     String,
  pub personaname: String,
  pub profileurl:  Option<String>,
  pub avatarfull:  Option<String>,
}

impl SummariesEnvelope {
  fn summary_for(self, steam_id: SteamId64) -> Result<Option<PlayerSummary>> {
    for summary in self.response.players {
      let id: SteamId64 = summary
        .steamid
        .parse()
        .map_err(|_| Error::InvalidSteamId(summary.steamid.clone()))?;
      if id == steam_id {
        return Ok(Some(summary));
      }
    }
    Ok(None)
  }
}
