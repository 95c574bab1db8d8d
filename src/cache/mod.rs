//! Tag-grouped read-through caching
//!
//! [`CacheStore`] is the storage contract: tagged values with a TTL, atomic
//! counters and bulk invalidation. [`Cache`] wraps a store with the typed
//! read-through helper the services use.
//!
//! Tagged entries are namespaced by their tag set, so `("sensors", "k")` and
//! `("visitors", "k")` are distinct. Counter keys are never tagged.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::{CacheError, CacheResult};

pub mod memory;

pub use memory::MemoryCacheStore;

/// Tag carried by every cached sensor listing
pub const TAG_SENSORS: &str = "sensors";
/// Tag carried by every cached visitor listing
pub const TAG_VISITORS: &str = "visitors";
/// Tag carried by the cached summary
pub const TAG_SUMMARY: &str = "summary";

/// Storage key for an entry under `tags`; untagged keys are stored as-is
pub fn scoped_key(tags: &[&str], key: &str) -> String {
    if tags.is_empty() {
        return key.to_string();
    }
    format!("tag[{}]:{}", tags.join("|"), key)
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Unexpired value stored under `key` with exactly `tags`
    async fn get(&self, tags: &[&str], key: &str) -> CacheResult<Option<Value>>;

    /// Store `value` under `key`, tagged with `tags`, expiring after `ttl`
    async fn put(&self, tags: &[&str], key: &str, value: Value, ttl: Duration) -> CacheResult<()>;

    /// Whether an unexpired entry exists; never extends its TTL
    async fn has(&self, tag: &str, key: &str) -> CacheResult<bool>;

    /// Remove one entry; `Ok(false)` when nothing was stored
    async fn invalidate_key(&self, tag: &str, key: &str) -> CacheResult<bool>;

    /// Remove every entry carrying `tag`, returning how many went
    async fn invalidate_by_tag(&self, tag: &str) -> CacheResult<usize>;

    /// Atomically add one to an untagged counter.
    ///
    /// An absent or expired counter restarts at 1 with no expiry. Any
    /// existing expiry is kept.
    async fn increment(&self, key: &str) -> CacheResult<i64>;

    /// Unconditionally set an untagged key with an expiry
    async fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()>;
}

/// Shared handle over a [`CacheStore`]
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Cache backed by a fresh [`MemoryCacheStore`] of default capacity
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheStore::default()))
    }

    /// Cache backed by a [`MemoryCacheStore`] holding at most `max_entries`
    pub fn in_memory_with_capacity(max_entries: u64) -> Self {
        Self::new(Arc::new(MemoryCacheStore::new(max_entries)))
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Read-through: return the cached value for `key`, or run `compute`,
    /// store its result under `tags` for `ttl` and return it.
    ///
    /// Two concurrent misses may both compute; the last write wins. A
    /// compute error is returned as-is and nothing is stored.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        tags: &[&str],
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.store.get(tags, key).await? {
            debug!(?tags, key, "cache hit");
            return Ok(serde_json::from_value(cached).map_err(CacheError::from)?);
        }

        debug!(?tags, key, "cache miss");
        let value = compute().await?;
        let encoded = serde_json::to_value(&value).map_err(CacheError::from)?;
        self.store.put(tags, key, encoded, ttl).await?;
        Ok(value)
    }

    pub async fn has(&self, tag: &str, key: &str) -> CacheResult<bool> {
        self.store.has(tag, key).await
    }

    pub async fn invalidate_key(&self, tag: &str, key: &str) -> CacheResult<bool> {
        self.store.invalidate_key(tag, key).await
    }

    /// Flush every tag in turn, returning the total number of entries removed
    pub async fn invalidate_tags(&self, tags: &[&str]) -> CacheResult<usize> {
        let mut removed = 0;
        for tag in tags {
            removed += self.store.invalidate_by_tag(tag).await?;
        }
        Ok(removed)
    }

    pub async fn increment(&self, key: &str) -> CacheResult<i64> {
        self.store.increment(key).await
    }

    /// Current value of an untagged counter without touching it
    pub async fn counter(&self, key: &str) -> CacheResult<Option<i64>> {
        match self.store.get(&[], key).await? {
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| CacheError::NotAnInteger {
                    key: key.to_string(),
                }),
            None => Ok(None),
        }
    }

    pub async fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        self.store.set_with_ttl(key, value, ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_secs(600);

    #[test]
    fn test_scoped_key_format() {
        assert_eq!(scoped_key(&["sensors"], "status:all"), "tag[sensors]:status:all");
        assert_eq!(scoped_key(&["a", "b"], "k"), "tag[a|b]:k");
        assert_eq!(scoped_key(&[], "visitors:access_count:date:all"), "visitors:access_count:date:all");
    }

    #[tokio::test]
    async fn test_counter_reads_without_incrementing() {
        let cache = Cache::in_memory();
        assert_eq!(cache.counter("hits").await.unwrap(), None);
        cache.increment("hits").await.unwrap();
        cache.increment("hits").await.unwrap();
        assert_eq!(cache.counter("hits").await.unwrap(), Some(2));
        assert_eq!(cache.counter("hits").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_get_or_compute_computes_once_within_ttl() {
        let cache = Cache::in_memory();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = cache
                .get_or_compute(&[TAG_SENSORS], "status:all:limit:all", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, AppError>(vec!["door".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["door".to_string()]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_compute_error_is_not_cached() {
        let cache = Cache::in_memory();
        let result: Result<i64, AppError> = cache
            .get_or_compute(&[TAG_SUMMARY], "summary:last_7_days", TTL, || async {
                Err(AppError::not_found("sensor", "boom"))
            })
            .await;
        assert!(result.is_err());
        assert!(!cache.has(TAG_SUMMARY, "summary:last_7_days").await.unwrap());
    }

    #[tokio::test]
    async fn test_undecodable_cached_value_is_a_cache_error() {
        let cache = Cache::in_memory();
        cache
            .store()
            .put(&[TAG_SENSORS], "k", serde_json::json!("not a number"), TTL)
            .await
            .unwrap();

        let result: Result<i64, AppError> = cache
            .get_or_compute(&[TAG_SENSORS], "k", TTL, || async { Ok(1) })
            .await;
        assert!(matches!(
            result,
            Err(AppError::Cache(CacheError::Serialization(_)))
        ));
    }
}
