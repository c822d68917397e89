//! Core types and trait definitions for the rankstats player ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::StatsStore`]; profile caches implement
//! [`profile::ProfileCache`]; [`service::StatsService`] ties them together.
//! [`matches::MatchesService`] serves the match history the same way.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod error;
pub mod matches;
pub mod profile;
pub mod service;
pub mod stats;
pub mod steam_id;
pub mod store;

pub use error::{Error, ResolutionError, Result};
pub use steam_id::{IdentityResolver, SteamId64, SteamIdResolver};
