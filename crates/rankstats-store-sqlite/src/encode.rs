//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! SteamID64 values are stored as INTEGER (they fit in an `i64`), counters
//! as non-negative INTEGER, profile timestamps as RFC 3339 strings,
//! `lastconnect` as unix seconds and match start times as SQL datetimes.

use chrono::{DateTime, NaiveDateTime, Utc};
use rankstats_core::{
  SteamId64,
  matches::MatchSummary,
  profile::Profile,
  stats::{PlayerRecord, RawStats},
};

use crate::{Error, Result};

// ─── SteamId64 ───────────────────────────────────────────────────────────────

pub fn encode_steam_id(id: SteamId64) -> Result<i64> {
  i64::try_from(id.get()).map_err(|_| Error::IdOutOfRange(id))
}

pub fn decode_steam_id(raw: i64) -> Result<SteamId64> {
  u64::try_from(raw)
    .map(SteamId64::new)
    .map_err(|_| Error::Decode(format!("negative steamid64: {raw}")))
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// `lastconnect` holds unix seconds with `0` meaning "never".
pub fn decode_unix(secs: i64) -> Result<Option<DateTime<Utc>>> {
  if secs == 0 {
    return Ok(None);
  }
  DateTime::from_timestamp(secs, 0)
    .map(Some)
    .ok_or_else(|| Error::DateParse(format!("unix timestamp out of range: {secs}")))
}

/// SQL `DATETIME` text (`YYYY-MM-DD HH:MM:SS`, UTC); empty means unknown.
pub fn decode_sql_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  match s.map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
      .map(|dt| Some(dt.and_utc()))
      .map_err(|e| Error::DateParse(format!("{s:?}: {e}"))),
  }
}

// ─── Counters ────────────────────────────────────────────────────────────────

fn counter(column: &str, raw: i64) -> Result<u64> {
  u64::try_from(raw).map_err(|_| Error::Decode(format!("negative {column}: {raw}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPlayerRow::from_row`], for `rankme r JOIN players p`.
pub const PLAYER_COLUMNS: &str = "
  r.steam, COALESCE(r.name, ''), p.steamid64,
  r.score, r.kills, r.deaths, r.assists, r.suicides, r.tk,
  r.shots, r.hits, r.headshots, r.rounds_tr, r.rounds_ct,
  r.damage, r.mvp, r.match_win, r.match_draw, r.match_lose,
  r.connected, r.lastconnect";

/// Raw values read directly from a `rankme` row joined with `players`.
pub struct RawPlayerRow {
  pub steam:       String,
  pub name:        String,
  pub steamid64:   i64,
  pub score:       i64,
  pub kills:       i64,
  pub deaths:      i64,
  pub assists:     i64,
  pub suicides:    i64,
  pub tk:          i64,
  pub shots:       i64,
  pub hits:        i64,
  pub headshots:   i64,
  pub rounds_tr:   i64,
  pub rounds_ct:   i64,
  pub damage:      i64,
  pub mvp:         i64,
  pub match_win:   i64,
  pub match_draw:  i64,
  pub match_lose:  i64,
  pub connected:   i64,
  pub lastconnect: i64,
}

impl RawPlayerRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      steam:       row.get(0)?,
      name:        row.get(1)?,
      steamid64:   row.get(2)?,
      score:       row.get(3)?,
      kills:       row.get(4)?,
      deaths:      row.get(5)?,
      assists:     row.get(6)?,
      suicides:    row.get(7)?,
      tk:          row.get(8)?,
      shots:       row.get(9)?,
      hits:        row.get(10)?,
      headshots:   row.get(11)?,
      rounds_tr:   row.get(12)?,
      rounds_ct:   row.get(13)?,
      damage:      row.get(14)?,
      mvp:         row.get(15)?,
      match_win:   row.get(16)?,
      match_draw:  row.get(17)?,
      match_lose:  row.get(18)?,
      connected:   row.get(19)?,
      lastconnect: row.get(20)?,
    })
  }

  pub fn into_record(self) -> Result<PlayerRecord> {
    let stats = RawStats {
      short_id:       self.steam,
      name:           self.name,
      score:          counter("score", self.score)?,
      kills:          counter("kills", self.kills)?,
      deaths:         counter("deaths", self.deaths)?,
      assists:        counter("assists", self.assists)?,
      suicides:       counter("suicides", self.suicides)?,
      team_kills:     counter("tk", self.tk)?,
      shots:          counter("shots", self.shots)?,
      hits:           counter("hits", self.hits)?,
      headshots:      counter("headshots", self.headshots)?,
      rounds_t:       counter("rounds_tr", self.rounds_tr)?,
      rounds_ct:      counter("rounds_ct", self.rounds_ct)?,
      damage:         counter("damage", self.damage)?,
      mvp:            counter("mvp", self.mvp)?,
      matches_won:    counter("match_win", self.match_win)?,
      matches_drawn:  counter("match_draw", self.match_draw)?,
      matches_lost:   counter("match_lose", self.match_lose)?,
      connected_secs: counter("connected", self.connected)?,
      last_connect:   decode_unix(self.lastconnect)?,
    };

    Ok(PlayerRecord { stats, steam_id: decode_steam_id(self.steamid64)? })
  }
}

/// Raw values read directly from a `profiles` row.
pub struct RawProfile {
  pub steamid64:    i64,
  pub persona_name: String,
  pub profile_url:  Option<String>,
  pub avatar_url:   Option<String>,
  pub fetched_at:   String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      steam_id:     decode_steam_id(self.steamid64)?,
      persona_name: self.persona_name,
      profile_url:  self.profile_url,
      avatar_url:   self.avatar_url,
      fetched_at:   decode_dt(&self.fetched_at)?,
    })
  }
}

/// Column list matching [`RawMatchRow::from_row`], for `sql_matches_scoretotal t`.
pub const MATCH_COLUMNS: &str = "t.match_id, t.timestamp, t.map, t.team_2, t.team_3";

/// Raw values read directly from a `sql_matches_scoretotal` row.
pub struct RawMatchRow {
  pub match_id:  i64,
  pub timestamp: Option<String>,
  pub map:       String,
  pub team_2:    i64,
  pub team_3:    i64,
}

impl RawMatchRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      match_id:  row.get(0)?,
      timestamp: row.get(1)?,
      map:       row.get(2)?,
      team_2:    row.get(3)?,
      team_3:    row.get(4)?,
    })
  }

  pub fn into_summary(self) -> Result<MatchSummary> {
    Ok(MatchSummary {
      match_id:  counter("match_id", self.match_id)?,
      played_at: decode_sql_datetime(self.timestamp.as_deref())?,
      map:       self.map,
      score_t:   counter("team_2", self.team_2)?,
      score_ct:  counter("team_3", self.team_3)?,
    })
  }
}
