//! Time-aware least-recently-used (TLRU) cache
//!
//! An in-memory keyed store bounded by two independent policies:
//!
//! - **time-to-use (TTU)**: every entry carries a maximum age. Once
//!   `now - inserted_at > ttu` the entry is never returned again and is
//!   purged no later than the next insertion.
//! - **capacity**: the number of resident entries never exceeds the
//!   configured capacity. On overflow, expired entries are removed first,
//!   then the least-recently-used residents one at a time.
//!
//! Age is measured with [`tokio::time::Instant`], a monotonic clock that
//! is unaffected by wall-clock adjustments and can be paused in tests.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tlru_cache::TlruCache;
//!
//! let mut cache = TlruCache::new("characters", 2, Duration::from_secs(30));
//! cache.put("a", 1);
//! cache.put("b", 2);
//! assert_eq!(cache.get(&"a"), Some(1));
//!
//! // "b" is now the least recently used entry and makes room for "c"
//! cache.put("c", 3);
//! assert_eq!(cache.get(&"b"), None);
//! assert_eq!(cache.len(), 2);
//! ```

mod cache;
mod entry;
mod types;

pub use cache::TlruCache;
pub use entry::CacheEntry;
pub use types::CacheStats;
