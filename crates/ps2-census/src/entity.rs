//! Record traits binding a type to its kind, collection and cache

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::cache::{Caches, RecordCache};
use crate::error::Result;
use crate::filter::Filter;
use crate::kind::EntityKind;
use crate::models::Locale;

/// A record type that can be fetched and cached by identifier
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Unique identifier within the kind
    fn id(&self) -> u64;

    /// The cache holding records of this kind
    fn cache(caches: &Caches) -> &RecordCache<Self>;

    /// Filter matching exactly the record with the given id
    fn id_filter(id: u64) -> Filter {
        Filter::new().eq(Self::KIND.id_field(), id)
    }
}

/// A record type that can also be looked up by name
pub trait Named: Entity {
    /// The record's name in the given locale, if it has one
    fn name(&self, locale: Locale) -> Option<&str>;

    /// Filter matching records with the given name.
    ///
    /// The default searches the localised `name.<locale>` field without
    /// regard to case.
    fn name_filter(name: &str, locale: Locale) -> Filter {
        Filter::new()
            .eq(format!("name.{}", locale), name)
            .case_insensitive()
    }
}

/// Decode a raw payload element into its record type
pub(crate) fn decode<E: Entity>(value: Value) -> Result<E> {
    Ok(serde_json::from_value(value)?)
}
