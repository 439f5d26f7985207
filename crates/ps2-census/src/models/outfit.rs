use serde::Deserialize;

use super::{de, Locale};
use crate::cache::{Caches, RecordCache};
use crate::entity::{Entity, Named};
use crate::filter::Filter;
use crate::kind::EntityKind;

/// A player outfit (guild)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Outfit {
    #[serde(deserialize_with = "de::int")]
    pub outfit_id: u64,
    pub name: String,
    pub name_lower: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub alias_lower: String,
    #[serde(deserialize_with = "de::int")]
    pub time_created: u64,
    #[serde(deserialize_with = "de::int")]
    pub leader_character_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub member_count: u64,
}

impl Entity for Outfit {
    const KIND: EntityKind = EntityKind::Outfit;

    fn id(&self) -> u64 {
        self.outfit_id
    }

    fn cache(caches: &Caches) -> &RecordCache<Self> {
        &caches.outfit
    }
}

impl Named for Outfit {
    fn name(&self, _locale: Locale) -> Option<&str> {
        Some(&self.name)
    }

    fn name_filter(name: &str, _locale: Locale) -> Filter {
        Filter::new().eq("name_lower", name.trim().to_lowercase())
    }
}

/// Membership of a character in an outfit.
///
/// A character belongs to at most one outfit, so memberships are keyed by
/// the member's character id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutfitMember {
    #[serde(deserialize_with = "de::int")]
    pub outfit_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub character_id: u64,
    #[serde(deserialize_with = "de::int")]
    pub member_since: u64,
    #[serde(default)]
    pub rank: String,
    #[serde(deserialize_with = "de::int")]
    pub rank_ordinal: u64,
}

impl Entity for OutfitMember {
    const KIND: EntityKind = EntityKind::OutfitMember;

    fn id(&self) -> u64 {
        self.character_id
    }

    fn cache(caches: &Caches) -> &RecordCache<Self> {
        &caches.outfit_member
    }
}
