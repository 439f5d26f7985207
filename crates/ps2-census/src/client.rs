//! Retrieval façade
//!
//! [`Client`] combines the per-kind caches with a [`RecordSource`]:
//!
//! - `get_by_id` / `get_by_name` consult the cache first and fetch at most
//!   once on a miss. Successful lookups are cached, absent records never are.
//! - `find` always goes to the source and never touches the cache.
//! - Relationship traversals return proxies immediately; their fetches go
//!   through the same lookups, so their cache effects are identical.

use std::sync::Arc;
use std::time::Duration;

use census_api::{CensusClient, CensusConfig};
use tlru_cache::CacheStats;
use tracing::debug;

use crate::cache::Caches;
use crate::entity::{decode, Entity, Named};
use crate::error::{Error, Result};
use crate::filter::Filter;
use crate::key::CacheKey;
use crate::kind::EntityKind;
use crate::models::{Character, Locale, World};
use crate::proxy::{InstanceProxy, SequenceProxy};
use crate::relation::Relation;
use crate::source::{CensusSource, RecordSource};

struct ClientInner {
    source: Arc<dyn RecordSource>,
    caches: Caches,
}

/// Cached access to PlanetSide 2 records
///
/// Cloning is cheap; clones share the same caches and source.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Create a client backed by the Census REST API
    pub fn new(config: CensusConfig) -> Result<Self> {
        let census = CensusClient::new(config)?;
        Ok(Self::with_source(Arc::new(CensusSource::new(Arc::new(census)))))
    }

    /// Create a client configured from `CENSUS_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(CensusConfig::from_env())
    }

    /// Create a client backed by an arbitrary record source
    pub fn with_source(source: Arc<dyn RecordSource>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                source,
                caches: Caches::new(),
            }),
        }
    }

    pub fn caches(&self) -> &Caches {
        &self.inner.caches
    }

    /// Look up a record by its id.
    ///
    /// Returns `Ok(None)` if the record does not exist. Transport failures
    /// propagate and leave the cache untouched.
    pub async fn get_by_id<E: Entity>(&self, id: u64) -> Result<Option<Arc<E>>> {
        let cache = E::cache(&self.inner.caches);
        let key = CacheKey::id(E::KIND, id);
        if let Some(hit) = cache.get(&key) {
            debug!(%key, "Restored from cache");
            return Ok(Some(hit));
        }

        debug!(%key, "Not cached, fetching");
        let Some(payload) = self.inner.source.fetch_one(E::KIND, &E::id_filter(id)).await? else {
            debug!(%key, "Record not found");
            return Ok(None);
        };
        let record = Arc::new(decode::<E>(payload)?);
        cache.put(key, Arc::clone(&record));
        Ok(Some(record))
    }

    /// Look up a record by its name in the given locale.
    ///
    /// The name is matched without regard to case. The record is cached
    /// under its name and under its id.
    pub async fn get_by_name<E: Named>(&self, name: &str, locale: &str) -> Result<Option<Arc<E>>> {
        let key = CacheKey::name(E::KIND, name, locale)?;
        let locale: Locale = locale.parse()?;
        let cache = E::cache(&self.inner.caches);
        if let Some(hit) = cache.get(&key) {
            debug!(%key, "Restored from cache");
            return Ok(Some(hit));
        }

        debug!(%key, "Not cached, fetching");
        let filter = E::name_filter(name.trim(), locale);
        let Some(payload) = self.inner.source.fetch_one(E::KIND, &filter).await? else {
            debug!(%key, "Record not found");
            return Ok(None);
        };
        let record = Arc::new(decode::<E>(payload)?);
        let id_key = CacheKey::id(E::KIND, record.id());
        // Name line last so it is the most recently used of the two
        cache.put_all([id_key, key], Arc::clone(&record));
        Ok(Some(record))
    }

    /// Find up to `limit` records matching `filter`, skipping `offset`.
    ///
    /// Always queries the source; results are not cached.
    pub async fn find<E: Entity>(
        &self,
        filter: &Filter,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Arc<E>>> {
        if limit == 0 {
            return Err(Error::invalid("find limit must be at least 1"));
        }
        let payloads = self
            .inner
            .source
            .fetch_many(E::KIND, filter, limit, offset)
            .await?;
        payloads
            .into_iter()
            .map(|payload| decode::<E>(payload).map(Arc::new))
            .collect()
    }

    /// First record matching `filter`, uncached
    pub async fn get_first<E: Entity>(&self, filter: &Filter) -> Result<Option<Arc<E>>> {
        match self.inner.source.fetch_one(E::KIND, filter).await? {
            Some(payload) => Ok(Some(Arc::new(decode::<E>(payload)?))),
            None => Ok(None),
        }
    }

    /// Number of records matching `filter`
    pub async fn count<E: Entity>(&self, filter: &Filter) -> Result<u64> {
        self.inner.source.count(E::KIND, filter).await
    }

    /// Build a proxy for a relationship of `source` without fetching it
    pub fn resolve_relationship<S, R>(&self, source: &S, relation: R) -> Result<R::Proxy>
    where
        S: Entity,
        R: Relation<S>,
    {
        relation.proxy(self, source)
    }

    /// Proxy resolving to the record with the given id via
    /// [`get_by_id`](Self::get_by_id)
    pub fn instance_proxy<E: Entity>(&self, id: u64) -> InstanceProxy<E> {
        let client = self.clone();
        InstanceProxy::new(async move { client.get_by_id::<E>(id).await })
    }

    /// Proxy resolving to the record with the given name via
    /// [`get_by_name`](Self::get_by_name).
    ///
    /// The name is validated before the proxy is built.
    pub fn named_proxy<E: Named>(&self, name: &str, locale: &str) -> Result<InstanceProxy<E>> {
        CacheKey::name(E::KIND, name, locale)?;
        let client = self.clone();
        let name = name.to_string();
        let locale = locale.to_string();
        Ok(InstanceProxy::new(async move {
            client.get_by_name::<E>(&name, &locale).await
        }))
    }

    /// Proxy resolving to the records matching `filter` via
    /// [`find`](Self::find)
    pub fn sequence_proxy<E: Entity>(&self, filter: Filter, limit: u32, offset: u32) -> SequenceProxy<E> {
        let client = self.clone();
        let fetch_filter = filter.clone();
        SequenceProxy::new(
            async move { client.find::<E>(&fetch_filter, limit, offset).await },
            Arc::clone(&self.inner.source),
            filter,
            limit,
            offset,
        )
    }

    /// Proxy for a character referenced by an event
    pub fn character_proxy(&self, character_id: u64) -> InstanceProxy<Character> {
        if character_id == 0 {
            return InstanceProxy::absent();
        }
        self.instance_proxy(character_id)
    }

    /// Proxy for a world referenced by an event
    pub fn world_proxy(&self, world_id: u64) -> InstanceProxy<World> {
        self.instance_proxy(world_id)
    }

    /// Change the cache policy of one entity kind.
    ///
    /// Shrinking evicts immediately, expired entries first. The new TTU
    /// applies to entries inserted from now on; a zero TTU disables
    /// expiry.
    pub fn set_policy(&self, kind: EntityKind, capacity: usize, ttu: Duration) -> Result<()> {
        if capacity == 0 {
            return Err(Error::invalid(format!("{} is not a valid cache size", capacity)));
        }
        self.inner.caches.reconfigure(kind, capacity, Some(ttu));
        Ok(())
    }

    /// Statistics of one entity kind's cache
    pub fn cache_stats(&self, kind: EntityKind) -> CacheStats {
        self.inner.caches.stats(kind)
    }

    /// Drop the id line of a record known to be stale.
    ///
    /// Name lines for the same record are left alone.
    pub fn invalidate<E: Entity>(&self, id: u64) -> bool {
        E::cache(&self.inner.caches).invalidate(&CacheKey::id(E::KIND, id))
    }

    pub fn clear_cache(&self, kind: EntityKind) {
        self.inner.caches.clear(kind);
    }
}
