use serde::Deserialize;

use super::{de, Locale, LocaleData};
use crate::cache::{Caches, RecordCache};
use crate::entity::{Entity, Named};
use crate::filter::Filter;
use crate::kind::EntityKind;

/// A player character
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Character {
    #[serde(deserialize_with = "de::int")]
    pub character_id: u64,
    pub name: CharacterName,
    #[serde(deserialize_with = "de::int")]
    pub faction_id: u64,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub head_id: Option<u64>,
    /// `None` or `Some(0)` when no title is equipped
    #[serde(default, deserialize_with = "de::opt_int")]
    pub title_id: Option<u64>,
    #[serde(default)]
    pub times: Option<CharacterTimes>,
    #[serde(default)]
    pub battle_rank: Option<BattleRank>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub prestige_level: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_int")]
    pub profile_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharacterName {
    pub first: String,
    pub first_lower: String,
}

/// Timestamps in UTC epoch seconds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharacterTimes {
    #[serde(deserialize_with = "de::int")]
    pub creation: u64,
    #[serde(deserialize_with = "de::int")]
    pub last_login: u64,
    #[serde(deserialize_with = "de::int")]
    pub minutes_played: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BattleRank {
    #[serde(deserialize_with = "de::int")]
    pub value: u64,
    #[serde(deserialize_with = "de::float")]
    pub percent_to_next: f64,
}

impl Character {
    /// The equipped title, ignoring the `0` placeholder
    pub fn equipped_title_id(&self) -> Option<u64> {
        self.title_id.filter(|id| *id != 0)
    }
}

impl Entity for Character {
    const KIND: EntityKind = EntityKind::Character;

    fn id(&self) -> u64 {
        self.character_id
    }

    fn cache(caches: &Caches) -> &RecordCache<Self> {
        &caches.character
    }
}

impl Named for Character {
    /// Character names are not localised
    fn name(&self, _locale: Locale) -> Option<&str> {
        Some(&self.name.first)
    }

    fn name_filter(name: &str, _locale: Locale) -> Filter {
        Filter::new().eq("name.first_lower", name.trim().to_lowercase())
    }
}

/// A character title such as "Major" or "Auraxium Ace"
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Title {
    #[serde(deserialize_with = "de::int")]
    pub title_id: u64,
    pub name: LocaleData,
}

impl Entity for Title {
    const KIND: EntityKind = EntityKind::Title;

    fn id(&self) -> u64 {
        self.title_id
    }

    fn cache(caches: &Caches) -> &RecordCache<Self> {
        &caches.title
    }
}

impl Named for Title {
    fn name(&self, locale: Locale) -> Option<&str> {
        self.name.get(locale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_character() {
        let character: Character = serde_json::from_value(json!({
            "character_id": "5428010618015189713",
            "name": {"first": "Auroram", "first_lower": "auroram"},
            "faction_id": "1",
            "head_id": "1",
            "title_id": "0",
            "times": {
                "creation": "1352598580",
                "creation_date": "2012-11-11 01:49:40.0",
                "last_login": "1612820123",
                "minutes_played": "104520"
            },
            "battle_rank": {"percent_to_next": "47", "value": "120"},
            "prestige_level": "1"
        }))
        .unwrap();

        assert_eq!(character.id(), 5428010618015189713);
        assert_eq!(character.name(Locale::De), Some("Auroram"));
        assert_eq!(character.equipped_title_id(), None);
        assert_eq!(character.battle_rank.unwrap().value, 120);
        assert_eq!(character.times.unwrap().minutes_played, 104520);
        assert_eq!(character.profile_id, None);
    }

    #[test]
    fn test_character_name_filter_uses_lowercase_field() {
        let filter = Character::name_filter(" Auroram ", Locale::En);
        assert_eq!(filter.terms()[0].to_string(), "name.first_lower=auroram");
        assert!(!filter.is_case_insensitive());
    }

    #[test]
    fn test_title_name_filter_is_localised() {
        let filter = Title::name_filter("Major", Locale::Fr);
        assert_eq!(filter.terms()[0].to_string(), "name.fr=Major");
        assert!(filter.is_case_insensitive());
    }
}
