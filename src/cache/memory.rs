//! In-process cache store
//!
//! Entries live in a bounded `moka` cache keyed by scoped key. A secondary
//! `tag -> keys` index serves bulk invalidation; moka's eviction listener
//! unlinks a key from it whenever the entry leaves the cache, whether by
//! expiry, capacity pressure or explicit removal.
//!
//! Deadlines are taken from the tokio clock and checked on every read, so
//! an entry is never served past its TTL even before moka reclaims it.

use async_trait::async_trait;
use moka::future::Cache;
use moka::notification::RemovalCause;
use moka::ops::compute::{CompResult, Op};
use moka::Expiry;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::{scoped_key, CacheStore};
use crate::config::defaults::DEFAULT_CACHE_MAX_ENTRIES;
use crate::errors::{CacheError, CacheResult};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
    tags: Arc<[String]>,
    /// False when an update must keep the deadline already armed
    rearm: bool,
}

impl CacheEntry {
    fn expiring(value: Value, tags: &[&str], ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Some(Instant::now() + ttl),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            rearm: true,
        }
    }

    fn counter_start() -> Self {
        Self {
            value: Value::from(1),
            expires_at: None,
            tags: Arc::from(Vec::new()),
            rearm: true,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at > now).unwrap_or(true)
    }

    fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

/// Per-entry TTL: tagged entries and armed counters expire, fresh counters don't
struct EntryExpiry;

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        entry.remaining()
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: std::time::Instant,
        current: Option<Duration>,
    ) -> Option<Duration> {
        if entry.rearm {
            entry.remaining()
        } else {
            current
        }
    }
}

#[derive(Debug, Default)]
struct TagIndex {
    keys: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    fn link(&mut self, key: &str, tags: &[&str]) {
        for tag in tags {
            self.keys
                .entry(tag.to_string())
                .or_default()
                .insert(key.to_string());
        }
    }

    fn unlink(&mut self, key: &str, tags: &[String]) {
        for tag in tags {
            if let Some(keys) = self.keys.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.keys.remove(tag);
                }
            }
        }
    }

    fn keys_for(&self, tag: &str) -> Vec<String> {
        self.keys
            .get(tag)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }
}

type SharedTagIndex = Arc<Mutex<TagIndex>>;

fn lock(index: &SharedTagIndex) -> std::sync::MutexGuard<'_, TagIndex> {
    index.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tag-aware, capacity-bounded TTL cache held in process memory
#[derive(Clone)]
pub struct MemoryCacheStore {
    entries: Cache<String, CacheEntry>,
    tag_index: SharedTagIndex,
}

impl MemoryCacheStore {
    pub fn new(max_entries: u64) -> Self {
        let tag_index = SharedTagIndex::default();
        let listener_index = tag_index.clone();

        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(EntryExpiry)
            .eviction_listener(move |key: Arc<String>, entry: CacheEntry, cause| {
                // A replacement keeps the same scoped key and therefore the same tags
                if !matches!(cause, RemovalCause::Replaced) {
                    lock(&listener_index).unlink(&key, &entry.tags);
                }
            })
            .build();

        Self { entries, tag_index }
    }

    async fn remove(&self, scoped: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(scoped).await?;
        lock(&self.tag_index).unlink(scoped, &removed.tags);
        Some(removed)
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_MAX_ENTRIES)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, tags: &[&str], key: &str) -> CacheResult<Option<Value>> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(&scoped_key(tags, key))
            .await
            .filter(|e| e.is_live(now))
            .map(|e| e.value))
    }

    async fn put(&self, tags: &[&str], key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        let scoped = scoped_key(tags, key);
        lock(&self.tag_index).link(&scoped, tags);
        self.entries
            .insert(scoped, CacheEntry::expiring(value, tags, ttl))
            .await;
        Ok(())
    }

    async fn has(&self, tag: &str, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .get(&scoped_key(&[tag], key))
            .await
            .is_some_and(|e| e.is_live(now)))
    }

    async fn invalidate_key(&self, tag: &str, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        let removed = self
            .remove(&scoped_key(&[tag], key))
            .await
            .is_some_and(|e| e.is_live(now));
        debug!(tag, key, removed, "cache key invalidated");
        Ok(removed)
    }

    async fn invalidate_by_tag(&self, tag: &str) -> CacheResult<usize> {
        let now = Instant::now();
        let keys = lock(&self.tag_index).keys_for(tag);
        let mut removed = 0;
        for key in &keys {
            if self.remove(key).await.is_some_and(|e| e.is_live(now)) {
                removed += 1;
            }
        }
        debug!(tag, removed, "cache tag flushed");
        Ok(removed)
    }

    async fn increment(&self, key: &str) -> CacheResult<i64> {
        let now = Instant::now();
        let result = self
            .entries
            .entry(key.to_string())
            .and_try_compute_with(|existing| async move {
                let next = match existing.map(|e| e.into_value()).filter(|e| e.is_live(now)) {
                    Some(current) => {
                        let count = current.value.as_i64().ok_or_else(|| {
                            CacheError::NotAnInteger {
                                key: key.to_string(),
                            }
                        })?;
                        CacheEntry {
                            value: Value::from(count + 1),
                            rearm: false,
                            ..current
                        }
                    }
                    // Absent or expired: restart at 1 with no expiry of its own
                    None => CacheEntry::counter_start(),
                };
                Ok::<_, CacheError>(Op::Put(next))
            })
            .await?;

        let stored = match result {
            CompResult::Inserted(entry) | CompResult::ReplacedWith(entry) => {
                entry.into_value().value.as_i64()
            }
            _ => None,
        };
        stored.ok_or_else(|| CacheError::NotAnInteger {
            key: key.to_string(),
        })
    }

    async fn set_with_ttl(&self, key: &str, value: Value, ttl: Duration) -> CacheResult<()> {
        self.entries
            .insert(key.to_string(), CacheEntry::expiring(value, &[], ttl))
            .await;
        Ok(())
    }
}

#[cfg(test)]
impl MemoryCacheStore {
    /// Entries still held once pending evictions have been applied
    async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    async fn tagged_keys(&self, tag: &str) -> usize {
        self.entries.run_pending_tasks().await;
        lock(&self.tag_index).keys_for(tag).len()
    }
}
