//! Cache types

/// Statistics about a cache instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Resident entries, including expired entries not yet purged
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    /// Entries removed to satisfy the capacity constraint
    pub evictions: u64,
    /// Entries removed because they outlived their time-to-use
    pub expirations: u64,
}

impl CacheStats {
    /// Fraction of lookups that were hits, or `None` before the first lookup
    pub fn hit_ratio(&self) -> Option<f64> {
        let total = self.hits + self.misses;
        if total == 0 {
            return None;
        }
        Some(self.hits as f64 / total as f64)
    }
}
