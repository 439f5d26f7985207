//! Census API Client
//!
//! A Rust client for the Daybreak Games Census REST API, which serves game
//! data for PlanetSide 2 and related titles.
//!
//! # Example
//!
//! ```no_run
//! use census_api::{CensusClient, CensusConfig};
//!
//! # async fn example() -> census_api::Result<()> {
//! let client = CensusClient::new(CensusConfig::from_env())?;
//! let query = client
//!     .query("character")
//!     .term("name.first_lower", "auroram")
//!     .show("character_id");
//! if let Some(character) = client.get_single(&query).await? {
//!     println!("{}", character["character_id"]);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod payload;
mod query;
mod urlgen;

pub use client::CensusClient;
pub use config::{CensusConfig, DEFAULT_ENDPOINT, DEFAULT_SERVICE_ID};
pub use error::{CensusError, Result};
pub use payload::{check_response, extract_count, extract_payload, extract_single, get_components};
pub use query::{Join, Query, SearchModifier, Sort, Term, Tree, Verb, DEFAULT_NAMESPACE};
