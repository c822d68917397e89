//! Plain-text and JSON rendering of query results.

use std::fmt::Write as _;

use rankstats_core::{
  matches::MatchSummary, profile::Profile, service::BackfillReport, stats::PlayerView,
};
use serde::Serialize;

pub fn json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
  Ok(serde_json::to_string_pretty(value)?)
}

/// Ranked table; `first_rank` is the 1-based rank of the first row.
pub fn table(views: &[PlayerView], first_rank: u64) -> String {
  if views.is_empty() {
    return "no players\n".to_owned();
  }

  let name_width = views
    .iter()
    .map(|v| v.stats.name.chars().count())
    .max()
    .unwrap_or(0)
    .clamp(4, 32);

  let mut out = String::new();
  let _ = writeln!(
    out,
    "{:>5}  {:<name_width$}  {:<20}  {:>8}  {:>6}  {:>6}  {:>5}  {:>6}  {:>6}",
    "#", "NAME", "STEAM ID", "SCORE", "KILLS", "DEATHS", "KDR", "ADR", "ACC%"
  );
  for (rank, v) in (first_rank..).zip(views) {
    let name: String = v.stats.name.chars().take(name_width).collect();
    let _ = writeln!(
      out,
      "{:>5}  {:<name_width$}  {:<20}  {:>8}  {:>6}  {:>6}  {:>5.2}  {:>6.1}  {:>6.1}",
      rank,
      name,
      v.steam_id,
      v.stats.score,
      v.stats.kills,
      v.stats.deaths,
      v.kdr,
      v.adr,
      v.accuracy * 100.0,
    );
  }
  out
}

/// Key/value block for a single player.
pub fn detail(v: &PlayerView) -> String {
  let s = &v.stats;
  let last_seen = s
    .last_connect
    .map(|dt| dt.to_rfc3339())
    .unwrap_or_else(|| "never".to_owned());

  let rows: [(&str, String); 15] = [
    ("name", s.name.clone()),
    ("steam", s.short_id.clone()),
    ("steam64", v.steam_id.to_string()),
    ("score", s.score.to_string()),
    ("kills", s.kills.to_string()),
    ("deaths", s.deaths.to_string()),
    ("assists", s.assists.to_string()),
    ("headshots", s.headshots.to_string()),
    ("rounds", s.rounds_played().to_string()),
    ("mvp", s.mvp.to_string()),
    ("matches", format!("{}W {}D {}L", s.matches_won, s.matches_drawn, s.matches_lost)),
    ("kdr", format!("{:.2}", v.kdr)),
    ("adr", format!("{:.1}", v.adr)),
    ("accuracy", format!("{:.1}%", v.accuracy * 100.0)),
    ("last seen", last_seen),
  ];

  rows
    .iter()
    .map(|(k, val)| format!("{k:>10}: {val}\n"))
    .collect()
}

/// Match history table, in the order given.
pub fn matches(matches: &[MatchSummary]) -> String {
  if matches.is_empty() {
    return "no matches\n".to_owned();
  }

  let mut out = String::new();
  let _ = writeln!(out, "{:>7}  {:<19}  {:<16}  {:>3}  {:>3}", "MATCH", "PLAYED", "MAP", "T", "CT");
  for m in matches {
    let played = m
      .played_at
      .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
      .unwrap_or_else(|| "-".to_owned());
    let _ = writeln!(
      out,
      "{:>7}  {:<19}  {:<16}  {:>3}  {:>3}",
      m.match_id, played, m.map, m.score_t, m.score_ct
    );
  }
  out
}

pub fn profile(p: Option<&Profile>) -> String {
  match p {
    None => "no cached profile\n".to_owned(),
    Some(p) => format!(
      "{:>10}: {}\n{:>10}: {}\n{:>10}: {}\n{:>10}: {}\n",
      "persona",
      p.persona_name,
      "profile",
      p.profile_url.as_deref().unwrap_or("-"),
      "avatar",
      p.avatar_url.as_deref().unwrap_or("-"),
      "fetched",
      p.fetched_at.to_rfc3339(),
    ),
  }
}

pub fn backfill(report: &BackfillReport) -> String {
  format!(
    "{} missing identities, {} inserted\n",
    report.missing, report.inserted
  )
}

#[cfg(test)]
mod tests {
  use rankstats_core::{
    SteamId64,
    stats::{PlayerRecord, RawStats},
  };

  use super::*;

  fn view(name: &str, kills: u64, deaths: u64) -> PlayerView {
    PlayerView::from_record(PlayerRecord {
      stats:    RawStats {
        short_id: "STEAM_1:0:1".into(),
        name: name.into(),
        score: 100,
        kills,
        deaths,
        shots: 10,
        hits: 5,
        ..RawStats::default()
      },
      steam_id: SteamId64::from_account_id(2),
    })
  }

  #[test]
  fn table_numbers_rows_from_first_rank() {
    let out = table(&[view("alice", 10, 5), view("bob", 3, 0)], 13);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[1].trim_start().starts_with("13  alice"));
    assert!(lines[2].trim_start().starts_with("14  bob"));
    assert!(lines[1].contains("2.00"));
    assert!(lines[1].contains("50.0"));
  }

  #[test]
  fn empty_table_says_so() {
    assert_eq!(table(&[], 1), "no players\n");
  }

  #[test]
  fn matches_table_lists_scores() {
    let out = matches(&[MatchSummary {
      match_id:  42,
      played_at: None,
      map:       "de_dust2".into(),
      score_t:   16,
      score_ct:  9,
    }]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].trim_start().starts_with("42  -"));
    assert!(lines[1].contains("de_dust2"));
    assert!(lines[1].trim_end().ends_with("16    9"));
    assert_eq!(matches(&[]), "no matches\n");
  }

  #[test]
  fn detail_includes_ratios() {
    let out = detail(&view("alice", 10, 5));
    assert!(out.contains("       kdr: 2.00"));
    assert!(out.contains("  accuracy: 50.0%"));
    assert!(out.contains(" last seen: never"));
  }
}
