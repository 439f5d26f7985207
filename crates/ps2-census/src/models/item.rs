use serde::Deserialize;

use super::{de, Locale, LocaleData};
use crate::cache::{Caches, RecordCache};
use crate::entity::{Entity, Named};
use crate::kind::EntityKind;

/// Any in-game item: weapons, attachments, cosmetics, implants
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Item {
    #[serde(deserialize_with = "de::int")]
    pub item_id: u64,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub item_type_id: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub item_category_id: Option<u64>,
    #[serde(default, deserialize_with = "de::flag")]
    pub is_vehicle_weapon: bool,
    #[serde(default)]
    pub name: Option<LocaleData>,
    #[serde(default)]
    pub description: Option<LocaleData>,
    /// `None` for items usable by every faction
    #[serde(default, deserialize_with = "de::opt_int")]
    pub faction_id: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub max_stack_size: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub image_id: Option<u64>,
}

impl Entity for Item {
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> u64 {
        self.item_id
    }

    fn cache(caches: &Caches) -> &RecordCache<Self> {
        &caches.item
    }
}

impl Named for Item {
    fn name(&self, locale: Locale) -> Option<&str> {
        self.name.as_ref().and_then(|n| n.get(locale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_item() {
        let item: Item = serde_json::from_value(json!({
            "item_id": "2",
            "item_type_id": "26",
            "item_category_id": "2",
            "is_vehicle_weapon": "0",
            "name": {"en": "NC4 Mag-Shot"},
            "faction_id": "2",
            "max_stack_size": "1"
        }))
        .unwrap();
        assert_eq!(item.id(), 2);
        assert_eq!(item.name(Locale::En), Some("NC4 Mag-Shot"));
        assert_eq!(item.faction_id, Some(2));
        assert!(!item.is_vehicle_weapon);
    }

    #[test]
    fn test_decode_item_without_faction() {
        let item: Item = serde_json::from_value(json!({"item_id": "8"})).unwrap();
        assert_eq!(item.faction_id, None);
        assert_eq!(item.name(Locale::En), None);
    }
}
