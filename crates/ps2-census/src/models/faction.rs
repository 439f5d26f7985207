use serde::Deserialize;

use super::{de, Locale, LocaleData};
use crate::cache::{Caches, RecordCache};
use crate::entity::{Entity, Named};
use crate::kind::EntityKind;

/// A playable (or non-playable) faction
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Faction {
    #[serde(deserialize_with = "de::int")]
    pub faction_id: u64,
    pub name: LocaleData,
    #[serde(default)]
    pub code_tag: String,
    #[serde(deserialize_with = "de::flag")]
    pub user_selectable: bool,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub image_id: Option<u64>,
}

impl Entity for Faction {
    const KIND: EntityKind = EntityKind::Faction;

    fn id(&self) -> u64 {
        self.faction_id
    }

    fn cache(caches: &Caches) -> &RecordCache<Self> {
        &caches.faction
    }
}

impl Named for Faction {
    fn name(&self, locale: Locale) -> Option<&str> {
        self.name.get(locale)
    }
}
