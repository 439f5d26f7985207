//! Cache entry type

use std::time::Duration;

use tokio::time::Instant;

/// A single cached value with its recency and expiry bookkeeping
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub value: V,
    /// Time of insertion or last refresh through `put`
    pub inserted_at: Instant,
    /// Time of the most recent successful read (or the insertion)
    pub last_accessed_at: Instant,
    /// Maximum age before the entry is treated as absent.
    /// A zero duration never expires.
    pub ttu: Duration,
}

impl<K, V> CacheEntry<K, V> {
    pub(crate) fn new(key: K, value: V, now: Instant, ttu: Duration) -> Self {
        Self {
            key,
            value,
            inserted_at: now,
            last_accessed_at: now,
            ttu,
        }
    }

    /// Age of the entry relative to `now`
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    /// Whether the entry has outlived its time-to-use
    pub fn is_expired(&self, now: Instant) -> bool {
        !self.ttu.is_zero() && self.age(now) > self.ttu
    }

    /// Last instant at which the entry is still live; `None` if it never
    /// expires
    pub fn deadline(&self) -> Option<Instant> {
        if self.ttu.is_zero() {
            return None;
        }
        self.inserted_at.checked_add(self.ttu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_strictly_after_ttu() {
        let now = Instant::now();
        let entry = CacheEntry::new("k", 1, now, Duration::from_secs(10));

        assert!(!entry.is_expired(now + Duration::from_secs(10)));
        assert!(entry.is_expired(now + Duration::from_millis(10_001)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttu_never_expires() {
        let now = Instant::now();
        let entry = CacheEntry::new("k", 1, now, Duration::ZERO);

        assert!(!entry.is_expired(now + Duration::from_secs(86_400 * 365)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_matches_expiry() {
        let now = Instant::now();
        let entry = CacheEntry::new("k", 1, now, Duration::from_secs(10));
        let deadline = entry.deadline().unwrap();

        assert_eq!(deadline, now + Duration::from_secs(10));
        assert!(!entry.is_expired(deadline));
        assert!(entry.is_expired(deadline + Duration::from_millis(1)));
        assert!(CacheEntry::new("k", 1, now, Duration::ZERO).deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_age_saturates_for_earlier_instants() {
        let now = Instant::now();
        let entry = CacheEntry::new("k", 1, now + Duration::from_secs(5), Duration::ZERO);

        assert_eq!(entry.age(now), Duration::ZERO);
    }
}
