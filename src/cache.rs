//! Read-through result cache with a fixed expiry.
//!
//! Entries are keyed by the computing function's identity plus its
//! JSON-serialized arguments, so two calls with the same inputs share one
//! computation until the TTL lapses or a caller invalidates everything.
//! Values are stored as JSON so heterogeneous result types can live in one
//! map.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::Result;
use crate::observability::metrics;

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    value: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ResultCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

/// Cache key: function identity plus canonical-JSON arguments.
fn compute_cache_key(fn_id: &str, args: &serde_json::Value) -> String {
    let mut s = String::new();
    s.push_str(fn_id);
    s.push('|');
    s.push_str(&args.to_string());

    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    hex::encode(hasher.finalize())
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        ResultCache {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn with_ttl_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Return the cached result for `(fn_id, args)`, or run `compute`,
    /// store its value, and return it.
    ///
    /// A compute error is returned as-is and nothing is stored, so the next
    /// call retries.
    pub fn get_or_compute<A, T, F>(&self, fn_id: &str, args: &A, compute: F) -> Result<T>
    where
        A: Serialize,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let args_value = serde_json::to_value(args)?;
        let key = compute_cache_key(fn_id, &args_value);

        if let Some(value) = self.lookup(&key) {
            metrics::cache::hit(fn_id);
            debug!(fn_id, "cache hit");
            return Ok(serde_json::from_value(value)?);
        }

        metrics::cache::miss(fn_id);
        debug!(fn_id, "cache miss");
        let result = compute()?;
        let value = serde_json::to_value(&result)?;
        self.store(key, value);
        Ok(result)
    }

    /// Drop every entry. Wired to the user-facing refresh action.
    pub fn invalidate_all(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        metrics::cache::invalidated();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                // Expired: evict eagerly so the map does not grow unbounded
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn store(&self, key: String, value: serde_json::Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                CacheEntry {
                    stored_at: Instant::now(),
                    value,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn second_call_hits_the_cache() {
        let cache = ResultCache::with_ttl_secs(600);
        let calls = AtomicUsize::new(0);

        let compute = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42u64)
        };
        let first: u64 = cache.get_or_compute("answer", &"args", compute).unwrap();
        let second: u64 = cache
            .get_or_compute("answer", &"args", || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(0u64)
            })
            .unwrap();

        assert_eq!(first, 42);
        assert_eq!(second, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_args_compute_separately() {
        let cache = ResultCache::with_ttl_secs(600);
        let a: u64 = cache.get_or_compute("f", &1u32, || Ok(10)).unwrap();
        let b: u64 = cache.get_or_compute("f", &2u32, || Ok(20)).unwrap();
        assert_eq!((a, b), (10, 20));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn zero_ttl_never_serves_stale() {
        let cache = ResultCache::new(Duration::from_secs(0));
        let _: u64 = cache.get_or_compute("f", &(), || Ok(1)).unwrap();
        let again: u64 = cache.get_or_compute("f", &(), || Ok(2)).unwrap();
        assert_eq!(again, 2);
    }

    #[test]
    fn invalidate_all_clears_entries() {
        let cache = ResultCache::with_ttl_secs(600);
        let _: u64 = cache.get_or_compute("f", &(), || Ok(1)).unwrap();
        assert_eq!(cache.len(), 1);
        cache.invalidate_all();
        assert!(cache.is_empty());
        let recomputed: u64 = cache.get_or_compute("f", &(), || Ok(2)).unwrap();
        assert_eq!(recomputed, 2);
    }

    #[test]
    fn compute_errors_are_not_cached() {
        let cache = ResultCache::with_ttl_secs(600);
        let failed: Result<u64> = cache.get_or_compute("f", &(), || {
            Err(crate::error::PricewatchError::Config("boom".to_string()))
        });
        assert!(failed.is_err());
        let ok: u64 = cache.get_or_compute("f", &(), || Ok(3)).unwrap();
        assert_eq!(ok, 3);
    }
}
