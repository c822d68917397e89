//! SQL schema for the rankstats SQLite store.
//!
//! `rankme` and the `sql_matches*` tables normally already exist, created by
//! the game server plugins; the `CREATE TABLE IF NOT EXISTS` here only
//! matters for fresh or test databases. Nothing here alters the plugins'
//! tables or database settings: no pragmas, and indexes only on tables this
//! store writes. The unique
//! indexes are created unconditionally so they also guard `players` tables
//! that predate this store.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
-- Written by the game server plugin only. Never modified here.
CREATE TABLE IF NOT EXISTS rankme (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    steam             TEXT UNIQUE,
    name              TEXT,
    lastip            TEXT,
    score             INTEGER NOT NULL DEFAULT 0,
    kills             INTEGER NOT NULL DEFAULT 0,
    deaths            INTEGER NOT NULL DEFAULT 0,
    assists           INTEGER NOT NULL DEFAULT 0,
    suicides          INTEGER NOT NULL DEFAULT 0,
    tk                INTEGER NOT NULL DEFAULT 0,
    shots             INTEGER NOT NULL DEFAULT 0,
    hits              INTEGER NOT NULL DEFAULT 0,
    headshots         INTEGER NOT NULL DEFAULT 0,
    connected         INTEGER NOT NULL DEFAULT 0,
    rounds_tr         INTEGER NOT NULL DEFAULT 0,
    rounds_ct         INTEGER NOT NULL DEFAULT 0,
    lastconnect       INTEGER NOT NULL DEFAULT 0,   -- unix seconds; 0 = never
    damage            INTEGER NOT NULL DEFAULT 0,
    mvp               INTEGER NOT NULL DEFAULT 0,
    match_win         INTEGER NOT NULL DEFAULT 0,
    match_draw        INTEGER NOT NULL DEFAULT 0,
    match_lose        INTEGER NOT NULL DEFAULT 0
);

-- Written by the match plugin only. Never modified here. `timestamp` is
-- `YYYY-MM-DD HH:MM:SS` in UTC; teams 2 and 3 are T and CT.
CREATE TABLE IF NOT EXISTS sql_matches_scoretotal (
    match_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT,
    team_0    INTEGER NOT NULL DEFAULT 0,
    team_1    INTEGER NOT NULL DEFAULT 0,
    team_2    INTEGER NOT NULL DEFAULT 0,
    team_3    INTEGER NOT NULL DEFAULT 0,
    map       TEXT NOT NULL DEFAULT ''
);

-- One row per participant per match, same owner.
CREATE TABLE IF NOT EXISTS sql_matches (
    match_id     INTEGER NOT NULL,
    name         TEXT NOT NULL,
    steamid64    TEXT NOT NULL,
    team         INTEGER NOT NULL DEFAULT 0,
    alive        INTEGER NOT NULL DEFAULT 0,
    ping         INTEGER NOT NULL DEFAULT 0,
    account      INTEGER NOT NULL DEFAULT 0,
    kills        INTEGER NOT NULL DEFAULT 0,
    assists      INTEGER NOT NULL DEFAULT 0,
    deaths       INTEGER NOT NULL DEFAULT 0,
    mvps         INTEGER NOT NULL DEFAULT 0,
    score        INTEGER NOT NULL DEFAULT 0,
    disconnected INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (match_id, steamid64)
);

-- Identity mappings, written once per player by the backfill.
CREATE TABLE IF NOT EXISTS players (
    steam     TEXT PRIMARY KEY,
    steamid64 INTEGER NOT NULL
);

-- Best-effort Steam profile cache.
CREATE TABLE IF NOT EXISTS profiles (
    steamid64    INTEGER PRIMARY KEY,
    persona_name TEXT NOT NULL,
    profile_url  TEXT,
    avatar_url   TEXT,
    fetched_at   TEXT NOT NULL          -- RFC 3339 UTC
);

CREATE UNIQUE INDEX IF NOT EXISTS players_steam_idx     ON players(steam);
CREATE UNIQUE INDEX IF NOT EXISTS players_steamid64_idx ON players(steamid64);
";
