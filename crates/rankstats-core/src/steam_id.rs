//! Canonical player identifiers and the resolver that derives them.
//!
//! The game server stores players under their short Steam2 identifier
//! (`STEAM_1:0:12345`). Everything that cross-references profile data uses the
//! 64-bit SteamID instead, which is a pure function of the short form.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::ResolutionError;

/// SteamID64 of account number zero in the public universe.
const INDIVIDUAL_BASE: u64 = 76_561_197_960_265_728;

// ─── SteamId64 ────────────────────────────────────────────────────────────────

/// A 64-bit canonical Steam identifier.
///
/// Serialised as a decimal string: the values exceed 2^53, so JSON consumers
/// that parse numbers as doubles would otherwise corrupt them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SteamId64(u64);

impl SteamId64 {
  pub const fn new(raw: u64) -> Self { Self(raw) }

  pub const fn get(self) -> u64 { self.0 }

  /// Build the id of an individual account from its 32-bit account number.
  pub const fn from_account_id(account_id: u32) -> Self {
    Self(INDIVIDUAL_BASE + account_id as u64)
  }

  /// The 32-bit account number, if this id lies in the individual range.
  pub fn account_id(self) -> Option<u32> {
    self
      .0
      .checked_sub(INDIVIDUAL_BASE)
      .and_then(|n| u32::try_from(n).ok())
  }
}

impl fmt::Display for SteamId64 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// Only the canonical decimal spelling parses: ASCII digits with no sign and
/// no leading zeros, so the parsed id prints back as the same text.
impl FromStr for SteamId64 {
  type Err = ResolutionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.len() > 1 && s.starts_with('0') {
      return Err(ResolutionError::Format(s.to_owned()));
    }
    parse_digits(s)
      .map(Self)
      .ok_or_else(|| ResolutionError::Format(s.to_owned()))
  }
}

impl Serialize for SteamId64 {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for SteamId64 {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    struct Visitor;

    impl de::Visitor<'_> for Visitor {
      type Value = SteamId64;

      fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a SteamID64 as a string or integer")
      }

      fn visit_u64<E: de::Error>(self, v: u64) -> Result<SteamId64, E> {
        Ok(SteamId64(v))
      }

      fn visit_str<E: de::Error>(self, v: &str) -> Result<SteamId64, E> {
        v.parse().map_err(E::custom)
      }
    }

    deserializer.deserialize_any(Visitor)
  }
}

// ─── Resolver ─────────────────────────────────────────────────────────────────

/// Converts a short player identifier into its canonical [`SteamId64`].
///
/// Implementations must be deterministic: the same input always yields the
/// same id, because identity rows are written once and never revisited.
pub trait IdentityResolver: Send + Sync {
  fn resolve(&self, short_id: &str) -> Result<SteamId64, ResolutionError>;
}

/// Offline resolver for the textual Steam id formats.
///
/// Accepts Steam2 (`STEAM_X:Y:Z`), Steam3 (`[U:1:N]`) and bare SteamID64
/// strings. The universe digit of Steam2 ids is ignored: `STEAM_0` and
/// `STEAM_1` name the same account.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteamIdResolver;

impl IdentityResolver for SteamIdResolver {
  fn resolve(&self, short_id: &str) -> Result<SteamId64, ResolutionError> {
    let format_err = || ResolutionError::Format(short_id.to_owned());
    let range_err = || ResolutionError::OutOfRange(short_id.to_owned());

    if let Some(rest) = short_id.strip_prefix("STEAM_") {
      let mut parts = rest.split(':');
      let (Some(universe), Some(auth), Some(account), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
      else {
        return Err(format_err());
      };

      let universe: u8 = parse_digits(universe).ok_or_else(format_err)?;
      let auth: u64 = parse_digits(auth).ok_or_else(format_err)?;
      if universe > 5 || auth > 1 {
        return Err(format_err());
      }

      let account: u64 = parse_digits(account).ok_or_else(format_err)?;
      let account_id = account
        .checked_mul(2)
        .and_then(|n| n.checked_add(auth))
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(range_err)?;
      return Ok(SteamId64::from_account_id(account_id));
    }

    if let Some(inner) = short_id
      .strip_prefix("[U:1:")
      .and_then(|s| s.strip_suffix(']'))
    {
      let account: u64 = parse_digits(inner).ok_or_else(format_err)?;
      let account_id = u32::try_from(account).map_err(|_| range_err())?;
      return Ok(SteamId64::from_account_id(account_id));
    }

    if !short_id.is_empty() && short_id.bytes().all(|b| b.is_ascii_digit()) {
      let id = short_id.parse::<u64>().map(SteamId64).map_err(|_| range_err())?;
      return match id.account_id() {
        Some(_) => Ok(id),
        None => Err(range_err()),
      };
    }

    Err(format_err())
  }
}

/// Parse a non-empty run of ASCII digits. Rejects signs and whitespace, which
/// `str::parse` would otherwise let through.
pub(crate) fn parse_digits<T: FromStr>(s: &str) -> Option<T> {
  if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}
