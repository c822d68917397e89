//! `rankstats`: query a RankMe player ledger from the command line.
//!
//! Reads `rankstats.toml` (or the path given with `--config`), opens the
//! SQLite database the game server writes to, backfills missing identities
//! and prints the requested view.
//!
//! # Usage
//!
//! ```text
//! rankstats top 5
//! rankstats list --page 2
//! rankstats --json search alice
//! rankstats get STEAM_1:0:12345
//! rankstats matches search de_dust2
//! ```

mod output;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rankstats_core::{
  IdentityResolver, SteamId64,
  matches::MatchesService,
  profile::{NoopProfileCache, ProfileCache},
  service::StatsService,
  store::ProfileStore as _,
};
use rankstats_steam::{SteamApiClient, SteamApiConfig, SteamProfileCache};
use rankstats_store_sqlite::SqliteStore;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rankstats", author, version, about = "Player statistics for a RankMe ledger")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "rankstats.toml")]
  config: PathBuf,

  /// Print results as JSON instead of tables.
  #[arg(long, global = true)]
  json: bool,

  /// Do not create missing identity rows before reading.
  #[arg(long, global = true)]
  skip_backfill: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create missing identity rows and report how many were written.
  Backfill,
  /// Print the number of ledger rows.
  Count,
  /// Print one page of the ranking.
  List {
    #[arg(long, default_value_t = 1)]
    page:      u32,
    /// Defaults to `page_size` from the configuration.
    #[arg(long)]
    page_size: Option<u32>,
  },
  /// Print the highest-scoring players.
  Top {
    /// Defaults to `top_count` from the configuration.
    n: Option<u32>,
  },
  /// Find players by name, Steam2 id or SteamID64.
  Search { query: String },
  /// Print one player. Accepts SteamID64, Steam2 or Steam3 ids.
  Get { steam_id: String },
  /// Print the cached Steam profile of a player.
  Profile { steam_id: String },
  /// Browse the match history. Never backfills.
  Matches {
    #[command(subcommand)]
    command: MatchesCommand,
  },
}

#[derive(Subcommand)]
enum MatchesCommand {
  /// Print the number of recorded matches.
  Count,
  /// Print one page of matches, newest first.
  List {
    #[arg(long, default_value_t = 1)]
    page:      u32,
    /// Defaults to `page_size` from the configuration.
    #[arg(long)]
    page_size: Option<u32>,
  },
  /// Find matches by map, player name, SteamID64 or match id.
  Search { query: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr so stdout stays parseable.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  let db_path = settings.database_path();
  let store = SqliteStore::open(&db_path)
    .await
    .with_context(|| format!("failed to open database at {db_path:?}"))?
    .with_query_timeout(settings.query_timeout());

  let out = match settings.steam_api_key.clone() {
    Some(api_key) => {
      let client = SteamApiClient::new(SteamApiConfig::new(api_key))
        .context("failed to build Steam API client")?;
      let cache = SteamProfileCache::new(store.clone(), client, settings.profile_ttl());
      run(StatsService::new(store, cache), &cli, &settings).await?
    }
    None => {
      tracing::debug!("no steam_api_key configured; profile cache disabled");
      run(StatsService::new(store, NoopProfileCache), &cli, &settings).await?
    }
  };
  print!("{out}");
  Ok(())
}

async fn run<C: ProfileCache>(
  service: StatsService<SqliteStore, C>,
  cli: &Cli,
  settings: &Settings,
) -> anyhow::Result<String> {
  // `backfill` does its own pass below; match history has no identities.
  let needs_backfill = !matches!(cli.command, Command::Backfill | Command::Matches { .. });
  if needs_backfill && !cli.skip_backfill {
    service
      .ensure_identities()
      .await
      .context("identity backfill failed")?;
  }

  let out = match &cli.command {
    Command::Backfill => {
      let report = service
        .ensure_identities()
        .await
        .context("identity backfill failed")?;
      if cli.json { output::json(&report)? } else { output::backfill(&report) }
    }
    Command::Count => {
      let n = service.count().await?;
      if cli.json { output::json(&n)? } else { format!("{n}\n") }
    }
    Command::List { page, page_size } => {
      let size = page_size.unwrap_or(settings.page_size);
      let views = service.list(*page, size).await?;
      if cli.json { output::json(&views)? } else { output::table(&views, first_rank(*page, size)) }
    }
    Command::Top { n } => {
      let views = service.top(n.unwrap_or(settings.top_count)).await?;
      if cli.json { output::json(&views)? } else { output::table(&views, 1) }
    }
    Command::Search { query } => {
      let views = service.search(query).await?;
      if cli.json { output::json(&views)? } else { output::table(&views, 1) }
    }
    Command::Get { steam_id } => {
      let view = service.get(parse_steam_id(service.resolver(), steam_id)?).await?;
      if cli.json { output::json(&view)? } else { output::detail(&view) }
    }
    Command::Profile { steam_id } => {
      let id = parse_steam_id(service.resolver(), steam_id)?;
      let profile = service.store().get_profile(id).await?;
      if cli.json { output::json(&profile)? } else { output::profile(profile.as_ref()) }
    }
    Command::Matches { command } => {
      run_matches(&MatchesService::new(service.store().clone()), command, cli, settings).await?
    }
  };
  Ok(out)
}

async fn run_matches(
  service: &MatchesService<SqliteStore>,
  command: &MatchesCommand,
  cli: &Cli,
  settings: &Settings,
) -> anyhow::Result<String> {
  let out = match command {
    MatchesCommand::Count => {
      let n = service.count().await?;
      if cli.json { output::json(&n)? } else { format!("{n}\n") }
    }
    MatchesCommand::List { page, page_size } => {
      let size = page_size.unwrap_or(settings.page_size);
      let matches = service.list(*page, size).await?;
      if cli.json { output::json(&matches)? } else { output::matches(&matches) }
    }
    MatchesCommand::Search { query } => {
      let matches = service.search(query).await?;
      if cli.json { output::json(&matches)? } else { output::matches(&matches) }
    }
  };
  Ok(out)
}

fn first_rank(page: u32, page_size: u32) -> u64 {
  u64::from(page.saturating_sub(1)) * u64::from(page_size) + 1
}

/// A plain SteamID64 is taken as is, even outside the individual-account
/// range, so an unknown id reads as "not found". Anything else goes through
/// the resolver.
fn parse_steam_id(resolver: &impl IdentityResolver, input: &str) -> anyhow::Result<SteamId64> {
  input
    .parse::<SteamId64>()
    .or_else(|_| resolver.resolve(input))
    .with_context(|| format!("invalid steam id {input:?}"))
}
