//! Typed PlanetSide 2 records
//!
//! Only the commonly used fields of each collection are modelled; unknown
//! fields in a payload are ignored.

pub(crate) mod de;

mod character;
mod faction;
mod item;
mod outfit;
mod world;

pub use character::{BattleRank, Character, CharacterName, CharacterTimes, Title};
pub use faction::Faction;
pub use item::Item;
pub use outfit::{Outfit, OutfitMember};
pub use world::World;

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Locales served by the API for localised strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    De,
    #[default]
    En,
    Es,
    Fr,
    It,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::It => "it",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            "es" => Ok(Self::Es),
            "fr" => Ok(Self::Fr),
            "it" => Ok(Self::It),
            other => Err(Error::invalid(format!("unsupported locale \"{}\"", other))),
        }
    }
}

/// A string localised into every supported locale.
///
/// The abandoned `tr` locale is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LocaleData {
    pub de: Option<String>,
    pub en: Option<String>,
    pub es: Option<String>,
    pub fr: Option<String>,
    pub it: Option<String>,
}

impl LocaleData {
    pub fn get(&self, locale: Locale) -> Option<&str> {
        match locale {
            Locale::De => self.de.as_deref(),
            Locale::En => self.en.as_deref(),
            Locale::Es => self.es.as_deref(),
            Locale::Fr => self.fr.as_deref(),
            Locale::It => self.it.as_deref(),
        }
    }
}
