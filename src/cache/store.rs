//! Keyed TTL storage for rendered responses.

use std::sync::RwLock;
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use super::CacheConfig;
use super::lock::rw_write;

const SOURCE: &str = "cache::store";

/// Cache key: request path plus the full query string, so every page
/// number gets its own entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: String,
    pub query: String,
}

impl CacheKey {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
        }
    }
}

/// A rendered HTTP response held verbatim. Hits replay the exact bytes
/// that were first rendered.
#[derive(Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

struct Entry {
    response: CachedResponse,
    stored_at: Instant,
}

/// Process-wide response cache with per-entry TTL expiry, LRU capacity
/// bounding, and a manual flush.
pub struct ResponseCache {
    entries: RwLock<LruCache<CacheKey, Entry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.capacity_non_zero())),
            ttl: config.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fetch a live entry. An expired entry is dropped on access so the
    /// caller recomputes and re-caches.
    pub fn get(&self, key: &CacheKey) -> Option<CachedResponse> {
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                counter!("piazza_cache_hit_total").increment(1);
                Some(entry.response.clone())
            }
            Some(_) => {
                entries.pop(key);
                counter!("piazza_cache_miss_total").increment(1);
                None
            }
            None => {
                counter!("piazza_cache_miss_total").increment(1);
                None
            }
        }
    }

    /// Store a response. Concurrent writers racing on the same key are
    /// last-write-wins.
    pub fn set(&self, key: CacheKey, response: CachedResponse) {
        let evicted = rw_write(&self.entries, SOURCE, "set").push(
            key,
            Entry {
                response,
                stored_at: Instant::now(),
            },
        );
        if evicted.is_some() {
            counter!("piazza_cache_evict_total").increment(1);
        }
    }

    /// Drop every entry. The next request for any key recomputes.
    pub fn flush(&self) {
        rw_write(&self.entries, SOURCE, "flush").clear();
        counter!("piazza_cache_flush_total").increment(1);
    }

    pub fn len(&self) -> usize {
        rw_write(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn backdate(&self, key: &CacheKey, age: Duration) {
        let mut entries = rw_write(&self.entries, SOURCE, "backdate");
        if let Some(entry) = entries.get_mut(key) {
            entry.stored_at = Instant::now() - age;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    fn sample_response(body: &str) -> CachedResponse {
        CachedResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    fn store() -> ResponseCache {
        ResponseCache::new(&CacheConfig::default())
    }

    #[test]
    fn roundtrip_within_ttl_returns_identical_bytes() {
        let cache = store();
        let key = CacheKey::new("/", "page=2");

        assert!(cache.get(&key).is_none());

        cache.set(key.clone(), sample_response("<html>feed</html>"));

        let hit = cache.get(&key).expect("cached response");
        assert_eq!(hit.status, 200);
        assert_eq!(hit.body, Bytes::from("<html>feed</html>"));
    }

    #[test]
    fn distinct_query_strings_get_distinct_entries() {
        let cache = store();
        cache.set(CacheKey::new("/", ""), sample_response("page one"));
        cache.set(CacheKey::new("/", "page=2"), sample_response("page two"));

        let first = cache.get(&CacheKey::new("/", "")).expect("first page");
        let second = cache.get(&CacheKey::new("/", "page=2")).expect("second page");
        assert_ne!(first.body, second.body);
    }

    #[test]
    fn expired_entry_is_dropped_on_access() {
        let cache = store();
        let key = CacheKey::new("/", "");
        cache.set(key.clone(), sample_response("stale"));

        cache.backdate(&key, Duration::from_secs(21));

        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_just_under_ttl_still_serves() {
        let cache = store();
        let key = CacheKey::new("/", "");
        cache.set(key.clone(), sample_response("fresh"));

        cache.backdate(&key, Duration::from_secs(19));

        assert!(cache.get(&key).is_some());
    }

    #[test]
    fn flush_clears_all_entries() {
        let cache = store();
        cache.set(CacheKey::new("/", ""), sample_response("one"));
        cache.set(CacheKey::new("/", "page=2"), sample_response("two"));
        assert_eq!(cache.len(), 2);

        cache.flush();

        assert!(cache.is_empty());
        assert!(cache.get(&CacheKey::new("/", "")).is_none());
    }

    #[test]
    fn capacity_bound_evicts_least_recently_used() {
        let cache = ResponseCache::new(&CacheConfig {
            capacity: 2,
            ..Default::default()
        });

        cache.set(CacheKey::new("/", "page=1"), sample_response("one"));
        cache.set(CacheKey::new("/", "page=2"), sample_response("two"));
        cache.set(CacheKey::new("/", "page=3"), sample_response("three"));

        assert!(cache.get(&CacheKey::new("/", "page=1")).is_none());
        assert!(cache.get(&CacheKey::new("/", "page=3")).is_some());
    }

    #[test]
    fn recovers_from_poisoned_lock() {
        let cache = store();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = cache.entries.write().expect("lock acquired");
            panic!("poison entries lock");
        }));

        cache.set(CacheKey::new("/", ""), sample_response("after panic"));
        assert!(cache.get(&CacheKey::new("/", "")).is_some());
    }
}
