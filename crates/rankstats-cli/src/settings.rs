//! Runtime configuration, read from an optional TOML file and `RANKSTATS_*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use rankstats_steam::DEFAULT_PROFILE_TTL;
use rankstats_store_sqlite::DEFAULT_QUERY_TIMEOUT;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// SQLite database shared with the game server plugin.
  pub database_path:    PathBuf,
  /// Default page size for `list`.
  pub page_size:        u32,
  /// Default `n` for `top`.
  pub top_count:        u32,
  pub query_timeout_ms: u64,
  /// Enables the Steam profile cache when set.
  pub steam_api_key:    Option<String>,
  pub profile_ttl_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      database_path:    PathBuf::from("rankstats.db"),
      page_size:        12,
      top_count:        10,
      query_timeout_ms: DEFAULT_QUERY_TIMEOUT.as_millis() as u64,
      steam_api_key:    None,
      profile_ttl_secs: DEFAULT_PROFILE_TTL.as_secs(),
    }
  }
}

impl Settings {
  /// Layer `path` (if it exists) and the environment over the defaults.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()).required(false))
      .add_source(config::Environment::with_prefix("RANKSTATS"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise Settings")
  }

  pub fn query_timeout(&self) -> Duration { Duration::from_millis(self.query_timeout_ms) }

  pub fn profile_ttl(&self) -> Duration { Duration::from_secs(self.profile_ttl_secs) }

  /// `database_path` with a leading `~` expanded to the user's home.
  pub fn database_path(&self) -> PathBuf { expand_tilde(&self.database_path) }
}

fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let settings = Settings::load(Path::new("does/not/exist.toml")).unwrap();
    assert_eq!(settings.page_size, 12);
    assert_eq!(settings.query_timeout(), DEFAULT_QUERY_TIMEOUT);
    assert_eq!(settings.profile_ttl(), DEFAULT_PROFILE_TTL);
  }

  #[test]
  fn relative_paths_are_left_alone() {
    assert_eq!(expand_tilde(Path::new("data/ranks.db")), PathBuf::from("data/ranks.db"));
  }
}
