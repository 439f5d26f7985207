//! Cache key strategy
//!
//! Every lookup is canonicalised into a [`CacheKey`] before the cache is
//! consulted. Id and name lookups of the same record produce different keys
//! and are cached as independent lines: writing one never invalidates the
//! other, so a name line may serve a record that is staler than the id line
//! for the same entity until its own TTU runs out.

use std::fmt;

use crate::error::{Error, Result};
use crate::kind::EntityKind;
use crate::models::Locale;

/// Canonical key of a cached record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Id(EntityKind, u64),
    Name {
        kind: EntityKind,
        /// Case-folded name
        name: String,
        locale: Locale,
    },
}

impl CacheKey {
    pub fn id(kind: EntityKind, id: u64) -> Self {
        Self::Id(kind, id)
    }

    /// Key for a name lookup.
    ///
    /// Names are trimmed and lowercased so that requests differing only in
    /// case share a key. Fails for empty names and unknown locales.
    pub fn name(kind: EntityKind, name: &str, locale: &str) -> Result<Self> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid(format!("empty {} name", kind)));
        }
        let locale: Locale = locale.parse()?;
        Ok(Self::Name {
            kind,
            name: trimmed.to_lowercase(),
            locale,
        })
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Id(kind, _) => *kind,
            Self::Name { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(kind, id) => write!(f, "{}:{}", kind, id),
            Self::Name { kind, name, locale } => write!(f, "{}:{}_{}", kind, locale, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_keys_are_case_folded() {
        let a = CacheKey::name(EntityKind::Character, "Auroram", "en").unwrap();
        let b = CacheKey::name(EntityKind::Character, "auroram", "en").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "character:en_auroram");
    }

    #[test]
    fn test_locale_distinguishes_keys() {
        let en = CacheKey::name(EntityKind::World, "Miller", "en").unwrap();
        let de = CacheKey::name(EntityKind::World, "Miller", "de").unwrap();
        assert_ne!(en, de);
    }

    #[test]
    fn test_kind_distinguishes_keys() {
        assert_ne!(
            CacheKey::id(EntityKind::Character, 1),
            CacheKey::id(EntityKind::Outfit, 1)
        );
        assert_eq!(CacheKey::id(EntityKind::Item, 2).kind(), EntityKind::Item);
    }

    #[test]
    fn test_id_and_name_keys_never_collide() {
        let id = CacheKey::id(EntityKind::Faction, 2);
        let name = CacheKey::name(EntityKind::Faction, "2", "en").unwrap();
        assert_ne!(id, name);
    }

    #[test]
    fn test_invalid_name_requests() {
        assert!(matches!(
            CacheKey::name(EntityKind::Character, "   ", "en"),
            Err(Error::InvalidRequest(_))
        ));
        assert!(matches!(
            CacheKey::name(EntityKind::Character, "Auroram", "xx"),
            Err(Error::InvalidRequest(_))
        ));
    }
}
