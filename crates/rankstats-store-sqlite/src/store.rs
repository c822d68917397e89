//! [`SqliteStore`]: the SQLite implementation of [`StatsStore`],
//! [`ProfileStore`] and [`MatchStore`].

use std::{
  path::Path,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use rankstats_core::{
  SteamId64,
  matches::{MatchSearch, MatchSummary},
  profile::Profile,
  stats::PlayerRecord,
  store::{Identity, MatchStore, PlayerSearch, ProfileStore, StatsStore},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{
    MATCH_COLUMNS, PLAYER_COLUMNS, RawMatchRow, RawPlayerRow, RawProfile, encode_dt,
    encode_steam_id,
  },
  schema::SCHEMA,
};

/// Deadline applied to every store call unless overridden.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// A rankstats store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:          tokio_rusqlite::Connection,
  interrupt:     Arc<rusqlite::InterruptHandle>,
  query_timeout: Duration,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Replace the per-call deadline.
  pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
    self.query_timeout = timeout;
    self
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let interrupt = conn.call(|conn| Ok(conn.get_interrupt_handle())).await?;
    let store = Self {
      conn,
      interrupt: Arc::new(interrupt),
      query_timeout: DEFAULT_QUERY_TIMEOUT,
    };
    store
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(store)
  }

  /// Run `f` on the connection thread under the store deadline.
  ///
  /// On expiry a call still waiting in the queue is abandoned and never
  /// runs. A call already running is interrupted, and only while it is the
  /// one on the connection; its outcome is then awaited, so a write that
  /// reports `Timeout` has been rolled back.
  pub(crate) async fn call<F, R>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    let state = Arc::new(Mutex::new(CallState::Queued));
    let task_state = Arc::clone(&state);

    let task = self.conn.call(move |conn| {
      {
        let mut s = lock(&task_state);
        if *s == CallState::Abandoned {
          return Err(tokio_rusqlite::Error::Other(Box::new(Abandoned)));
        }
        *s = CallState::Running;
      }
      let out = f(conn);
      *lock(&task_state) = CallState::Finished;
      out
    });
    tokio::pin!(task);

    if let Ok(result) = tokio::time::timeout(self.query_timeout, &mut task).await {
      return Ok(result?);
    }

    {
      let mut s = lock(&state);
      match *s {
        CallState::Queued => {
          *s = CallState::Abandoned;
          return Err(Error::Timeout(self.query_timeout));
        }
        // Held under the lock, so the interrupt cannot reach a later call.
        CallState::Running => self.interrupt.interrupt(),
        CallState::Finished | CallState::Abandoned => {}
      }
    }

    // The interrupted statement returns promptly. A call that completed
    // before the interrupt landed keeps its result.
    task.await.map_err(|_| Error::Timeout(self.query_timeout))
  }
}

/// Lifecycle of one [`SqliteStore::call`] closure, shared with the waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallState {
  Queued,
  Running,
  Finished,
  Abandoned,
}

#[derive(Debug, thiserror::Error)]
#[error("call abandoned after its deadline")]
struct Abandoned;

fn lock(state: &Mutex<CallState>) -> MutexGuard<'_, CallState> {
  state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn to_sql_count(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

// ─── StatsStore impl ─────────────────────────────────────────────────────────

impl StatsStore for SqliteStore {
  type Error = Error;

  async fn count_players(&self) -> Result<u64> {
    let n: i64 = self
      .call(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM rankme", [], |r| r.get(0))?))
      .await?;
    u64::try_from(n).map_err(|_| Error::Decode(format!("negative row count: {n}")))
  }

  async fn unresolved_short_ids(&self) -> Result<Vec<String>> {
    self
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT r.steam FROM rankme r
           WHERE r.steam IS NOT NULL
             AND NOT EXISTS (SELECT 1 FROM players p WHERE p.steam = r.steam)
           ORDER BY r.steam",
        )?;
        let rows = stmt
          .query_map([], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(rows)
      })
      .await
  }

  async fn insert_identities(&self, identities: Vec<Identity>) -> Result<u64> {
    let rows = identities
      .into_iter()
      .map(|i| -> Result<(String, i64)> { Ok((i.short_id, encode_steam_id(i.steam_id)?)) })
      .collect::<Result<Vec<_>>>()?;

    // One transaction: a constraint failure on any row rolls back all of
    // them. A short id inserted concurrently by another process is skipped.
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO players (steam, steamid64) VALUES (?1, ?2)
             ON CONFLICT (steam) DO NOTHING",
          )?;
          for (steam, steamid64) in &rows {
            inserted += stmt.execute(rusqlite::params![steam, steamid64])? as u64;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await
  }

  async fn ranked(&self, offset: u64, limit: u64) -> Result<Vec<PlayerRecord>> {
    let (offset, limit) = (to_sql_count(offset), to_sql_count(limit));

    let raws: Vec<RawPlayerRow> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PLAYER_COLUMNS}
           FROM rankme r
           JOIN players p ON p.steam = r.steam
           ORDER BY r.score DESC, r.steam ASC
           LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit, offset], RawPlayerRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlayerRow::into_record).collect()
  }

  async fn search(&self, query: &PlayerSearch) -> Result<Vec<PlayerRecord>> {
    let text = query.text.clone();
    // An id beyond the INTEGER range cannot be stored, so it matches nothing.
    let steamid64 = query.steam_id.and_then(|id| encode_steam_id(id).ok());

    let raws: Vec<RawPlayerRow> = self
      .call(move |conn| {
        // instr() rather than LIKE: case-sensitive, and `%`/`_` in the query
        // are matched literally.
        let mut stmt = conn.prepare(&format!(
          "SELECT {PLAYER_COLUMNS}
           FROM rankme r
           JOIN players p ON p.steam = r.steam
           WHERE instr(COALESCE(r.name, ''), ?1) > 0
              OR r.steam = ?1
              OR p.steamid64 = ?2
           ORDER BY r.score DESC, r.steam ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![text, steamid64], RawPlayerRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlayerRow::into_record).collect()
  }

  async fn find_by_steam_id(&self, steam_id: SteamId64) -> Result<Vec<PlayerRecord>> {
    let Ok(steamid64) = encode_steam_id(steam_id) else {
      return Ok(Vec::new());
    };

    let raws: Vec<RawPlayerRow> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PLAYER_COLUMNS}
           FROM rankme r
           JOIN players p ON p.steam = r.steam
           WHERE p.steamid64 = ?1
           LIMIT 2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![steamid64], RawPlayerRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPlayerRow::into_record).collect()
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn get_profile(&self, steam_id: SteamId64) -> Result<Option<Profile>> {
    let Ok(steamid64) = encode_steam_id(steam_id) else {
      return Ok(None);
    };

    let raw: Option<RawProfile> = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT steamid64, persona_name, profile_url, avatar_url, fetched_at
               FROM profiles WHERE steamid64 = ?1",
              rusqlite::params![steamid64],
              |row| {
                Ok(RawProfile {
                  steamid64:    row.get(0)?,
                  persona_name: row.get(1)?,
                  profile_url:  row.get(2)?,
                  avatar_url:   row.get(3)?,
                  fetched_at:   row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn put_profile(&self, profile: Profile) -> Result<()> {
    let steamid64 = encode_steam_id(profile.steam_id)?;
    let fetched_at = encode_dt(profile.fetched_at);

    self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (steamid64, persona_name, profile_url, avatar_url, fetched_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (steamid64) DO UPDATE SET
             persona_name = excluded.persona_name,
             profile_url  = excluded.profile_url,
             avatar_url   = excluded.avatar_url,
             fetched_at   = excluded.fetched_at",
          rusqlite::params![
            steamid64,
            profile.persona_name,
            profile.profile_url,
            profile.avatar_url,
            fetched_at,
          ],
        )?;
        Ok(())
      })
      .await
  }
}

// ─── MatchStore impl ─────────────────────────────────────────────────────────

impl MatchStore for SqliteStore {
  type Error = Error;

  async fn count_matches(&self) -> Result<u64> {
    let n: i64 = self
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM sql_matches_scoretotal", [], |r| r.get(0))?)
      })
      .await?;
    u64::try_from(n).map_err(|_| Error::Decode(format!("negative row count: {n}")))
  }

  async fn recent_matches(&self, offset: u64, limit: u64) -> Result<Vec<MatchSummary>> {
    let (offset, limit) = (to_sql_count(offset), to_sql_count(limit));

    let raws: Vec<RawMatchRow> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MATCH_COLUMNS}
           FROM sql_matches_scoretotal t
           ORDER BY t.match_id DESC
           LIMIT ?1 OFFSET ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![limit, offset], RawMatchRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMatchRow::into_summary).collect()
  }

  async fn search_matches(&self, query: &MatchSearch) -> Result<Vec<MatchSummary>> {
    let text = query.text.clone();
    let match_id = query.match_id.and_then(|id| i64::try_from(id).ok());

    let raws: Vec<RawMatchRow> = self
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MATCH_COLUMNS}
           FROM sql_matches_scoretotal t
           WHERE instr(t.map, ?1) > 0
              OR t.match_id = ?2
              OR EXISTS (
                SELECT 1 FROM sql_matches m
                WHERE m.match_id = t.match_id
                  AND (instr(m.name, ?1) > 0 OR m.steamid64 = ?1)
              )
           ORDER BY t.match_id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![text, match_id], RawMatchRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMatchRow::into_summary).collect()
  }
}
