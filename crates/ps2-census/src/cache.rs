//! Per-kind record caches

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tlru_cache::{CacheStats, TlruCache};
use tracing::debug;

use crate::key::CacheKey;
use crate::kind::EntityKind;
use crate::models::{Character, Faction, Item, Outfit, OutfitMember, Title, World};

/// Thread-safe TLRU cache of one entity kind.
///
/// Every operation runs inside a single critical section, so capacity and
/// expiry are enforced atomically with respect to other threads. The lock
/// is never held across an await point.
pub struct RecordCache<E> {
    inner: Mutex<TlruCache<CacheKey, Arc<E>>>,
}

impl<E> RecordCache<E> {
    pub fn new(kind: EntityKind) -> Self {
        let policy = kind.default_policy();
        Self {
            inner: Mutex::new(TlruCache::new(kind.collection(), policy.capacity, policy.ttu)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TlruCache<CacheKey, Arc<E>>> {
        // The cache is consistent after every call, so a poisoned lock is
        // still safe to use
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<E>> {
        self.lock().get(key)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().contains(key)
    }

    pub fn put(&self, key: CacheKey, value: Arc<E>) {
        self.lock().put(key, value);
    }

    /// Insert several keys for the same record in one critical section.
    /// Later keys end up more recently used.
    pub fn put_all(&self, keys: impl IntoIterator<Item = CacheKey>, value: Arc<E>) {
        let mut cache = self.lock();
        for key in keys {
            cache.put(key, Arc::clone(&value));
        }
    }

    pub fn invalidate(&self, key: &CacheKey) -> bool {
        self.lock().invalidate(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn reconfigure(&self, capacity: usize, ttu: Option<Duration>) {
        self.lock().reconfigure(capacity, ttu);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }
}

/// One cache per entity kind, owned by the client
pub struct Caches {
    pub character: RecordCache<Character>,
    pub faction: RecordCache<Faction>,
    pub item: RecordCache<Item>,
    pub outfit: RecordCache<Outfit>,
    pub outfit_member: RecordCache<OutfitMember>,
    pub title: RecordCache<Title>,
    pub world: RecordCache<World>,
}

impl Caches {
    pub fn new() -> Self {
        Self {
            character: RecordCache::new(EntityKind::Character),
            faction: RecordCache::new(EntityKind::Faction),
            item: RecordCache::new(EntityKind::Item),
            outfit: RecordCache::new(EntityKind::Outfit),
            outfit_member: RecordCache::new(EntityKind::OutfitMember),
            title: RecordCache::new(EntityKind::Title),
            world: RecordCache::new(EntityKind::World),
        }
    }

    /// Change the policy of one kind's cache, evicting immediately if it
    /// shrinks below its current size
    pub fn reconfigure(&self, kind: EntityKind, capacity: usize, ttu: Option<Duration>) {
        debug!(%kind, capacity, ?ttu, "Reconfiguring cache");
        match kind {
            EntityKind::Character => self.character.reconfigure(capacity, ttu),
            EntityKind::Faction => self.faction.reconfigure(capacity, ttu),
            EntityKind::Item => self.item.reconfigure(capacity, ttu),
            EntityKind::Outfit => self.outfit.reconfigure(capacity, ttu),
            EntityKind::OutfitMember => self.outfit_member.reconfigure(capacity, ttu),
            EntityKind::Title => self.title.reconfigure(capacity, ttu),
            EntityKind::World => self.world.reconfigure(capacity, ttu),
        }
    }

    pub fn stats(&self, kind: EntityKind) -> CacheStats {
        match kind {
            EntityKind::Character => self.character.stats(),
            EntityKind::Faction => self.faction.stats(),
            EntityKind::Item => self.item.stats(),
            EntityKind::Outfit => self.outfit.stats(),
            EntityKind::OutfitMember => self.outfit_member.stats(),
            EntityKind::Title => self.title.stats(),
            EntityKind::World => self.world.stats(),
        }
    }

    pub fn clear(&self, kind: EntityKind) {
        match kind {
            EntityKind::Character => self.character.clear(),
            EntityKind::Faction => self.faction.clear(),
            EntityKind::Item => self.item.clear(),
            EntityKind::Outfit => self.outfit.clear(),
            EntityKind::OutfitMember => self.outfit_member.clear(),
            EntityKind::Title => self.title.clear(),
            EntityKind::World => self.world.clear(),
        }
    }
}

impl Default for Caches {
    fn default() -> Self {
        Self::new()
    }
}
