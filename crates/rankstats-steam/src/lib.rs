//! Steam-backed profile cache for rankstats.
//!
//! [`SteamProfileCache`] implements [`rankstats_core::profile::ProfileCache`]
//! by fetching player summaries from the Steam Web API and persisting them in
//! any [`rankstats_core::store::ProfileStore`].

pub mod cache;
pub mod client;
pub mod error;

pub use cache::{DEFAULT_PROFILE_TTL, SteamProfileCache};
pub use client::{ProfileFetcher, SteamApiClient, SteamApiConfig};
pub use error::{Error, Result};
