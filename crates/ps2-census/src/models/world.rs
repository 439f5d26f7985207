use serde::Deserialize;

use super::{de, Locale, LocaleData};
use crate::cache::{Caches, RecordCache};
use crate::entity::{Entity, Named};
use crate::kind::EntityKind;

/// A game server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct World {
    #[serde(deserialize_with = "de::int")]
    pub world_id: u64,
    /// Server state, e.g. `online` or `locked`
    #[serde(default)]
    pub state: String,
    pub name: LocaleData,
    #[serde(default)]
    pub description: Option<LocaleData>,
}

impl World {
    pub fn is_online(&self) -> bool {
        self.state == "online"
    }
}

impl Entity for World {
    const KIND: EntityKind = EntityKind::World;

    fn id(&self) -> u64 {
        self.world_id
    }

    fn cache(caches: &Caches) -> &RecordCache<Self> {
        &caches.world
    }
}

impl Named for World {
    fn name(&self, locale: Locale) -> Option<&str> {
        self.name.get(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_world() {
        let world: World = serde_json::from_value(json!({
            "world_id": "10",
            "state": "online",
            "name": {"en": "Miller"}
        }))
        .unwrap();
        assert_eq!(world.id(), 10);
        assert!(world.is_online());
        assert_eq!(world.name(Locale::En), Some("Miller"));
        assert!(world.description.is_none());
    }
}
