//! Bounded scene cache with TTL and LRU eviction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, trace};

/// Cache sizing and expiry.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_")]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached scenes
    max_size: usize,
    /// Seconds an entry stays valid
    default_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            default_ttl: 3600,
        }
    }
}

/// Identifies a scene: world, stage and location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SceneKey {
    world: String,
    stage: u32,
    location: String,
}

impl SceneKey {
    /// Build a key. Location comparison ignores case and surrounding space.
    pub fn new(world: impl Into<String>, stage: u32, location: &str) -> Self {
        Self {
            world: world.into(),
            stage,
            location: location.trim().to_lowercase(),
        }
    }
}

/// One cached value.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    /// `None` when the TTL is too large to represent, meaning never
    expires_at: Option<Instant>,
    last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    /// The cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// A bounded map of scenes.
#[derive(Debug)]
pub struct SceneCache<V> {
    config: CacheConfig,
    entries: HashMap<SceneKey, CacheEntry<V>>,
}

impl<V> SceneCache<V> {
    /// An empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: HashMap::new(),
        }
    }

    /// Look up a live entry, refreshing its recency.
    #[instrument(skip(self), level = "trace")]
    pub fn get(&mut self, key: &SceneKey) -> Option<&CacheEntry<V>> {
        let now = Instant::now();
        if self.entries.get(key).is_some_and(|e| e.is_expired(now)) {
            trace!("Dropping expired scene");
            self.entries.remove(key);
            return None;
        }
        let entry = self.entries.get_mut(key)?;
        entry.last_accessed = now;
        Some(entry)
    }

    /// Insert or replace an entry. `ttl_secs` overrides the default TTL.
    /// Evicts the least recently used entry when full.
    #[instrument(skip(self, value), level = "debug")]
    pub fn insert(&mut self, key: SceneKey, value: V, ttl_secs: Option<u64>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.config.max_size {
            self.evict_lru();
        }
        if self.config.max_size == 0 {
            return;
        }
        let now = Instant::now();
        let ttl = Duration::from_secs(ttl_secs.unwrap_or(self.config.default_ttl));
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now.checked_add(ttl),
                last_accessed: now,
            },
        );
    }

    /// Remove every expired entry, returning how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "Removed expired scenes");
        }
        removed
    }

    /// Number of entries, including any not yet cleaned up.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_lru(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_accessed)
            .map(|(k, _)| k.clone());
        if let Some(key) = oldest {
            debug!(?key, "Evicting least recently used scene");
            self.entries.remove(&key);
        }
    }
}
