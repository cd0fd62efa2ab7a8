use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use parking_lot::Mutex;

use crate::Response;

struct CacheEntry {
    response: Response,
    stored_at: Instant,
}

/// LRU response cache with a per-entry time-to-live.
///
/// Lookups happen before the retry loop runs; a fresh hit short-circuits
/// the network entirely. Writes happen only after a successful response.
pub(crate) struct ResponseCache {
    entries: Mutex<LruCache<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub(crate) fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Returns a fresh entry, promoting it to most recently used.
    /// Expired entries are dropped and read as misses.
    pub(crate) fn lookup(&self, key: &str) -> Option<Response> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.response.clone()),
            Some(_) => {
                entries.pop(key);
                None
            }
            None => None,
        }
    }

    pub(crate) fn store(&self, key: String, response: Response) {
        self.entries.lock().put(
            key,
            CacheEntry {
                response,
                stored_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::ResponseCache;
    use crate::Response;

    fn response(marker: u64) -> Response {
        Response {
            status: 200,
            headers: Default::default(),
            body: json!({ "marker": marker }),
        }
    }

    #[test]
    fn store_then_lookup_returns_the_entry() {
        let cache = ResponseCache::new(4, Duration::from_secs(60));
        cache.store("GET /users/1 ".to_owned(), response(1));

        let hit = cache.lookup("GET /users/1 ").expect("must hit");
        assert_eq!(hit.body["marker"], 1);
    }

    #[test]
    fn expired_entry_reads_as_miss() {
        let cache = ResponseCache::new(4, Duration::from_millis(20));
        cache.store("key".to_owned(), response(1));

        std::thread::sleep(Duration::from_millis(40));
        assert!(cache.lookup("key").is_none());
    }

    #[test]
    fn least_recently_used_entry_is_evicted_first() {
        let cache = ResponseCache::new(2, Duration::from_secs(60));
        cache.store("a".to_owned(), response(1));
        cache.store("b".to_owned(), response(2));

        // Touch "a" so "b" becomes the eviction candidate.
        cache.lookup("a").expect("a must still be cached");
        cache.store("c".to_owned(), response(3));

        assert!(cache.lookup("a").is_some());
        assert!(cache.lookup("b").is_none());
        assert!(cache.lookup("c").is_some());
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let cache = ResponseCache::new(0, Duration::from_secs(60));
        cache.store("only".to_owned(), response(1));
        assert!(cache.lookup("only").is_some());
    }
}
