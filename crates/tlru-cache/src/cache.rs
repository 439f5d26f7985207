//! TLRU cache with an intrusive recency list

use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::entry::CacheEntry;
use crate::types::CacheStats;

/// Recency list node. `prev` points towards the most recently used end,
/// `next` towards the least recently used end.
struct Node<K, V> {
    entry: CacheEntry<K, V>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fixed-capacity keyed store evicting by age first, then by recency
///
/// Nodes live in a slab indexed by a key map, so promotion to the
/// most-recently-used position and removal of the least-recently-used
/// entry are both O(1). Entries with a time-to-use are also indexed by
/// deadline, so the expiry sweep run by every insertion visits only the
/// expired entries, in deadline order (ties broken by slot), and stops at
/// the first live one: O(log n) per entry purged or inserted.
///
/// The cache itself is not synchronised. Wrap it in a mutex to share it
/// between tasks, keeping each call inside one critical section.
pub struct TlruCache<K, V> {
    name: String,
    capacity: usize,
    ttu: Duration,
    index: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    deadlines: BTreeSet<(Instant, usize)>,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl<K, V> TlruCache<K, V>
where
    K: Hash + Eq + Clone + fmt::Debug,
    V: Clone,
{
    /// Create an empty cache.
    ///
    /// A `ttu` of zero disables expiry, making this a plain LRU cache.
    /// A `capacity` of zero disables caching: `put` becomes a no-op.
    pub fn new(name: impl Into<String>, capacity: usize, ttu: Duration) -> Self {
        let name = name.into();
        debug!(cache = %name, capacity, ttu_secs = ttu.as_secs_f64(), "Cache created");
        Self {
            name,
            capacity,
            ttu,
            index: HashMap::with_capacity(capacity.min(1024)),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            deadlines: BTreeSet::new(),
            hits: 0,
            misses: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Default time-to-use applied to new entries
    pub fn ttu(&self) -> Duration {
        self.ttu
    }

    /// Number of resident entries, including expired entries not yet purged
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Look up a value.
    ///
    /// Returns `None` for missing or expired keys; an expired entry is
    /// removed on the spot. A hit promotes the entry to most recently used
    /// and refreshes its `last_accessed_at`.
    pub fn get<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&slot) = self.index.get(key) else {
            self.misses += 1;
            debug!(cache = %self.name, "Cache miss");
            return None;
        };

        let now = Instant::now();
        if self.node(slot).entry.is_expired(now) {
            let entry = self.remove_slot(slot);
            self.expirations += 1;
            self.misses += 1;
            debug!(
                cache = %self.name,
                key = ?entry.key,
                age_secs = entry.age(now).as_secs_f64(),
                ttu_secs = entry.ttu.as_secs_f64(),
                "Cache entry expired"
            );
            return None;
        }

        self.move_to_front(slot);
        self.hits += 1;
        let entry = &mut self.node_mut(slot).entry;
        entry.last_accessed_at = now;
        let value = entry.value.clone();
        debug!(cache = %self.name, key = ?self.node(slot).entry.key, "Cache hit");
        Some(value)
    }

    /// Inspect an entry without touching its recency or expiring it
    pub fn peek<Q>(&self, key: &Q) -> Option<&CacheEntry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&slot| &self.node(slot).entry)
    }

    /// Whether a live (non-expired) entry exists for `key`.
    /// Does not affect recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.peek(key)
            .map(|entry| !entry.is_expired(Instant::now()))
            .unwrap_or(false)
    }

    /// Insert or refresh an entry using the cache's default time-to-use
    pub fn put(&mut self, key: K, value: V) {
        self.put_with_ttu(key, value, None);
    }

    /// Insert or refresh an entry.
    ///
    /// Every insertion first purges all expired entries; if the key is new
    /// and the cache is still full, least-recently-used entries are evicted
    /// until there is room. `ttu` overrides the cache default for this
    /// entry only.
    pub fn put_with_ttu(&mut self, key: K, value: V, ttu: Option<Duration>) {
        if self.capacity == 0 {
            debug!(cache = %self.name, key = ?key, "Caching disabled, dropping value");
            return;
        }

        let now = Instant::now();
        let ttu = ttu.unwrap_or(self.ttu);
        self.purge_expired(now);

        if let Some(&slot) = self.index.get(&key) {
            self.unschedule(slot);
            let entry = &mut self.node_mut(slot).entry;
            entry.value = value;
            entry.inserted_at = now;
            entry.last_accessed_at = now;
            entry.ttu = ttu;
            self.schedule(slot);
            self.move_to_front(slot);
            debug!(cache = %self.name, key = ?key, "Refreshed cache entry");
            return;
        }

        self.evict_lru_until(self.capacity - 1);

        let slot = self.alloc(Node {
            entry: CacheEntry::new(key.clone(), value, now, ttu),
            prev: None,
            next: None,
        });
        self.push_front(slot);
        self.schedule(slot);
        debug!(cache = %self.name, key = ?key, entries = self.len() + 1, "Added cache entry");
        self.index.insert(key, slot);
    }

    /// Remove an entry, returning its value if it was resident
    pub fn invalidate<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        let entry = self.remove_slot(slot);
        debug!(cache = %self.name, key = ?entry.key, "Invalidated cache entry");
        Some(entry.value)
    }

    /// Remove every entry. Statistics are kept.
    pub fn clear(&mut self) {
        debug!(cache = %self.name, entries = self.len(), "Clearing cache");
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.deadlines.clear();
        self.head = None;
        self.tail = None;
    }

    /// Change the capacity and optionally the default time-to-use.
    ///
    /// A new `ttu` applies to entries inserted afterwards; resident entries
    /// keep the time-to-use they were inserted with. If the cache now holds
    /// more entries than `capacity`, expired entries are purged and then
    /// least-recently-used entries evicted until it complies.
    pub fn reconfigure(&mut self, capacity: usize, ttu: Option<Duration>) {
        debug!(
            cache = %self.name,
            old_capacity = self.capacity,
            new_capacity = capacity,
            ttu_secs = ttu.map(|t| t.as_secs_f64()),
            "Reconfiguring cache"
        );
        self.capacity = capacity;
        if let Some(ttu) = ttu {
            self.ttu = ttu;
        }
        if self.len() > capacity {
            self.purge_expired(Instant::now());
            self.evict_lru_until(capacity);
        }
    }

    /// Remove all expired entries, returning how many were removed
    pub fn remove_expired(&mut self) -> usize {
        self.purge_expired(Instant::now())
    }

    /// Keys ordered from most to least recently used
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let node = self.node(slot);
            keys.push(node.entry.key.clone());
            cursor = node.next;
        }
        keys
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            capacity: self.capacity,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            expirations: self.expirations,
        }
    }

    fn purge_expired(&mut self, now: Instant) -> usize {
        let mut purged = 0;
        while let Some(&(deadline, slot)) = self.deadlines.first() {
            if deadline >= now {
                break;
            }
            let entry = self.remove_slot(slot);
            debug!(cache = %self.name, key = ?entry.key, "Purged expired cache entry");
            purged += 1;
        }
        self.expirations += purged as u64;
        purged
    }

    fn schedule(&mut self, slot: usize) {
        if let Some(deadline) = self.node(slot).entry.deadline() {
            self.deadlines.insert((deadline, slot));
        }
    }

    fn unschedule(&mut self, slot: usize) {
        if let Some(deadline) = self.node(slot).entry.deadline() {
            self.deadlines.remove(&(deadline, slot));
        }
    }

    fn evict_lru_until(&mut self, target: usize) {
        while self.len() > target {
            let Some(slot) = self.tail else {
                break;
            };
            let entry = self.remove_slot(slot);
            self.evictions += 1;
            debug!(cache = %self.name, key = ?entry.key, "Evicted least recently used cache entry");
        }
    }

    fn node(&self, slot: usize) -> &Node<K, V> {
        self.slots[slot].as_ref().expect("indexed slot is occupied")
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node<K, V> {
        self.slots[slot].as_mut().expect("indexed slot is occupied")
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn remove_slot(&mut self, slot: usize) -> CacheEntry<K, V> {
        self.unschedule(slot);
        self.unlink(slot);
        let node = self.slots[slot].take().expect("indexed slot is occupied");
        self.free.push(slot);
        self.index.remove(&node.entry.key);
        node.entry
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };
        match prev {
            Some(p) => self.node_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev = prev,
            None => self.tail = prev,
        }
        let node = self.node_mut(slot);
        node.prev = None;
        node.next = None;
    }

    fn push_front(&mut self, slot: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(slot);
            node.prev = None;
            node.next = old_head;
        }
        match old_head {
            Some(h) => self.node_mut(h).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn move_to_front(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.push_front(slot);
    }
}

impl<K, V> fmt::Debug for TlruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlruCache")
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .field("ttu", &self.ttu)
            .field("entries", &self.index.len())
            .finish()
    }
}
