//! Cacheable entity kinds and their default cache policies

use std::fmt;
use std::time::Duration;

/// Capacity and time-to-use of a kind's cache.
///
/// A `ttu` of zero disables age-based expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub capacity: usize,
    pub ttu: Duration,
}

impl CachePolicy {
    pub const fn new(capacity: usize, ttu_secs: u64) -> Self {
        Self {
            capacity,
            ttu: Duration::from_secs(ttu_secs),
        }
    }
}

/// Every entity kind with its own keyed cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Character,
    Faction,
    Item,
    Outfit,
    OutfitMember,
    Title,
    World,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        Self::Character,
        Self::Faction,
        Self::Item,
        Self::Outfit,
        Self::OutfitMember,
        Self::Title,
        Self::World,
    ];

    /// Census collection backing this kind
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Character => "character",
            Self::Faction => "faction",
            Self::Item => "item",
            Self::Outfit => "outfit",
            Self::OutfitMember => "outfit_member",
            Self::Title => "title",
            Self::World => "world",
        }
    }

    /// Field holding the unique identifier of a record
    pub fn id_field(&self) -> &'static str {
        match self {
            Self::Character => "character_id",
            Self::Faction => "faction_id",
            Self::Item => "item_id",
            Self::Outfit => "outfit_id",
            // outfit_member is keyed by the member's character
            Self::OutfitMember => "character_id",
            Self::Title => "title_id",
            Self::World => "world_id",
        }
    }

    /// Cache policy a kind starts out with.
    ///
    /// Volatile player data gets a short TTU, near-immutable reference data
    /// a long one. Factions never change and do not expire.
    pub fn default_policy(&self) -> CachePolicy {
        match self {
            Self::Character => CachePolicy::new(256, 30),
            Self::Faction => CachePolicy::new(10, 0),
            Self::Item => CachePolicy::new(128, 3600),
            Self::Outfit => CachePolicy::new(20, 300),
            Self::OutfitMember => CachePolicy::new(100, 300),
            Self::Title => CachePolicy::new(300, 300),
            Self::World => CachePolicy::new(20, 3600),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection())
    }
}
