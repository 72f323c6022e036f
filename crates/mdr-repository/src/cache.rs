//! Caller-owned cache of item lookups.
//!
//! Entries are keyed by `(kind, uid, selector)` and expire after a fixed TTL.
//! Capacity is bounded with least-recently-used eviction. The cache is shared
//! as `Arc<ItemCache>` between the repositories that use it; saving an item
//! drops every entry for that `(kind, uid)`.

use std::any::Any;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use lru::LruCache;
use tracing::trace;

use mdr_model::{ConceptKind, Uid};

use crate::query::VersionSelector;

/// Default number of cached lookups.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Default entry lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub capacity: usize,
    pub ttl: Duration,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
            enabled: true,
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ConceptKind,
    pub uid: Uid,
    pub selector: VersionSelector,
}

impl CacheKey {
    pub fn new(kind: ConceptKind, uid: Uid, selector: VersionSelector) -> Self {
        Self {
            kind,
            uid,
            selector,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

struct Entry {
    inserted: Instant,
    value: Arc<dyn Any + Send + Sync>,
}

pub struct ItemCache {
    config: CacheConfig,
    entries: Mutex<LruCache<CacheKey, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ItemCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ItemCache {
    /// A zero capacity disables the cache.
    pub fn new(config: CacheConfig) -> Self {
        let (capacity, enabled) = match NonZeroUsize::new(config.capacity) {
            Some(capacity) => (capacity, config.enabled),
            None => (NonZeroUsize::MIN, false),
        };
        Self {
            config: CacheConfig { enabled, ..config },
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn shared(config: CacheConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a clone of a fresh entry of type `T`. Expired entries are dropped.
    pub fn get<T: Clone + 'static>(&self, key: &CacheKey) -> Option<T> {
        if !self.config.enabled {
            return None;
        }
        let mut entries = self.lock();
        let found = entries
            .get(key)
            .map(|entry| (entry.inserted.elapsed() <= self.config.ttl, Arc::clone(&entry.value)));
        let value = match found {
            Some((true, value)) => value.downcast_ref::<T>().cloned(),
            Some((false, _)) => {
                entries.pop(key);
                trace!(kind = %key.kind, uid = %key.uid, "cache entry expired");
                None
            }
            None => None,
        };
        drop(entries);

        if value.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(kind = %key.kind, uid = %key.uid, selector = %key.selector, "cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(kind = %key.kind, uid = %key.uid, selector = %key.selector, "cache miss");
        }
        value
    }

    pub fn insert<T: Send + Sync + 'static>(&self, key: CacheKey, value: T) {
        if !self.config.enabled {
            return;
        }
        let entry = Entry {
            inserted: Instant::now(),
            value: Arc::new(value),
        };
        self.lock().put(key, entry);
    }

    /// Drops every entry for `(kind, uid)`, whatever the selector.
    pub fn invalidate(&self, kind: ConceptKind, uid: &Uid) {
        let mut entries = self.lock();
        let stale: Vec<CacheKey> = entries
            .iter()
            .filter(|(key, _)| key.kind == kind && &key.uid == uid)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        if !stale.is_empty() {
            trace!(kind = %kind, uid = %uid, dropped = stale.len(), "cache invalidated");
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }
}
