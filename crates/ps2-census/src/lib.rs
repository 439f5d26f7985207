//! Cached PlanetSide 2 game data
//!
//! Typed, cached access to the Census API. Lookups by id or name go through
//! a per-kind time-aware LRU cache; relationships between records are
//! exposed as lazy proxies that fetch only when resolved.
//!
//! # Example
//!
//! ```no_run
//! use ps2_census::{relation::CharacterFaction, Character, Client, Locale};
//!
//! # async fn example() -> ps2_census::Result<()> {
//! let client = Client::from_env()?;
//!
//! if let Some(character) = client.get_by_name::<Character>("Auroram", "en").await? {
//!     let faction = client
//!         .resolve_relationship(character.as_ref(), CharacterFaction)?
//!         .resolve()
//!         .await?;
//!     if let Some(faction) = faction {
//!         println!("{:?}", faction.name.get(Locale::En));
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod cache;
mod client;
mod entity;
mod error;
mod filter;
mod key;
mod kind;
pub mod models;
mod proxy;
pub mod relation;
mod source;

#[cfg(test)]
mod testing;

pub use cache::{Caches, RecordCache};
pub use client::Client;
pub use entity::{Entity, Named};
pub use error::{Error, Result};
pub use filter::Filter;
pub use key::CacheKey;
pub use kind::{CachePolicy, EntityKind};
pub use models::{
    Character, Faction, Item, Locale, LocaleData, Outfit, OutfitMember, Title, World,
};
pub use proxy::{InstanceProxy, ProxyState, SequenceProxy};
pub use source::{CensusSource, RecordSource};

pub use census_api::{CensusConfig, SearchModifier, Term};
pub use tlru_cache::CacheStats;
