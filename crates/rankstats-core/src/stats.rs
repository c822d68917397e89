//! Raw ledger counters and the derived per-player view.
//!
//! Counters are written by the game server plugin and only ever read here.
//! Ratios are never stored; [`PlayerView::from_record`] computes them on
//! every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::steam_id::SteamId64;

// ─── Raw counters ────────────────────────────────────────────────────────────

/// One row of the `rankme` ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStats {
  /// Steam2 identifier the plugin keys rows by.
  pub short_id:       String,
  pub name:           String,
  pub score:          u64,
  pub kills:          u64,
  pub deaths:         u64,
  pub assists:        u64,
  pub suicides:       u64,
  pub team_kills:     u64,
  pub shots:          u64,
  pub hits:           u64,
  pub headshots:      u64,
  pub rounds_t:       u64,
  pub rounds_ct:      u64,
  /// Total damage dealt to enemies.
  pub damage:         u64,
  pub mvp:            u64,
  pub matches_won:    u64,
  pub matches_drawn:  u64,
  pub matches_lost:   u64,
  /// Seconds spent connected to the server.
  pub connected_secs: u64,
  pub last_connect:   Option<DateTime<Utc>>,
}

impl RawStats {
  pub fn rounds_played(&self) -> u64 { self.rounds_t.saturating_add(self.rounds_ct) }
}

/// A ledger row joined with its identity mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
  pub stats:    RawStats,
  pub steam_id: SteamId64,
}

// ─── Derived view ────────────────────────────────────────────────────────────

/// The read model handed to callers. Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
  #[serde(flatten)]
  pub stats:    RawStats,
  pub steam_id: SteamId64,
  /// Kills per death.
  pub kdr:      f64,
  /// Damage per round played.
  pub adr:      f64,
  /// Hits per shot fired.
  pub accuracy: f64,
}

impl PlayerView {
  pub fn from_record(record: PlayerRecord) -> Self {
    let PlayerRecord { stats, steam_id } = record;
    Self {
      kdr: ratio(stats.kills, stats.deaths),
      adr: ratio(stats.damage, stats.rounds_played()),
      accuracy: ratio(stats.hits, stats.shots),
      stats,
      steam_id,
    }
  }
}

/// `numerator / max(denominator, 1)`. A zero denominator yields the
/// numerator itself, never NaN or infinity.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
  numerator as f64 / denominator.max(1) as f64
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(kills: u64, deaths: u64) -> PlayerRecord {
    PlayerRecord {
      stats:    RawStats {
        short_id: "STEAM_1:0:1".into(),
        name: "alice".into(),
        kills,
        deaths,
        ..RawStats::default()
      },
      steam_id: SteamId64::from_account_id(2),
    }
  }

  #[test]
  fn kdr_divides_kills_by_deaths() {
    assert_eq!(PlayerView::from_record(record(10, 5)).kdr, 2.0);
    assert_eq!(PlayerView::from_record(record(1, 4)).kdr, 0.25);
  }

  #[test]
  fn zero_denominators_fall_back_to_numerator() {
    let mut rec = record(3, 0);
    rec.stats.damage = 250;
    rec.stats.hits = 7;

    let view = PlayerView::from_record(rec);
    assert_eq!(view.kdr, 3.0);
    assert_eq!(view.adr, 250.0);
    assert_eq!(view.accuracy, 7.0);
    assert!(view.kdr.is_finite() && view.adr.is_finite() && view.accuracy.is_finite());
  }

  #[test]
  fn adr_counts_rounds_on_both_sides() {
    let mut rec = record(0, 0);
    rec.stats.damage = 900;
    rec.stats.rounds_t = 4;
    rec.stats.rounds_ct = 5;
    assert_eq!(PlayerView::from_record(rec).adr, 100.0);
  }

  #[test]
  fn accuracy_is_hits_per_shot() {
    let mut rec = record(0, 0);
    rec.stats.shots = 200;
    rec.stats.hits = 50;
    assert_eq!(PlayerView::from_record(rec).accuracy, 0.25);
  }

  #[test]
  fn view_serialises_flat() {
    let view = PlayerView::from_record(record(10, 5));
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["short_id"], "STEAM_1:0:1");
    assert_eq!(json["kills"], 10);
    assert_eq!(json["kdr"], 2.0);
    assert_eq!(json["steam_id"], "76561197960265730");
  }
}
