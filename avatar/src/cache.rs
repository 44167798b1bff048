//! Least-recently-used cache bounded by entry count and a memory budget.
//!
//! Sizes are byte estimates supplied by the caller; the cache never measures
//! its values. Recency is a logical tick bumped on every `get` and `set`, so
//! two entries never share a last-access time and eviction order is total.
//!
//! Budget enforcement happens before the triggering entry lands:
//!
//! * A new key evicts LRU entries while the cache is full by count, or the
//!   incoming size would exceed the memory budget, and at least one entry
//!   remains. An oversized value is still admitted into an empty cache.
//! * Replacing an existing key swaps the size in the running total and then
//!   evicts other entries, oldest first, until the budget holds or the key is
//!   alone. The updated key itself is never evicted.

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Limits for a [`BoundedCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    pub max_entries: usize,
    pub max_memory_bytes: usize,
}

impl CacheConfig {
    /// Build limits from an entry count and a budget in megabytes.
    #[must_use]
    pub fn from_mb(max_entries: usize, max_memory_mb: usize) -> Self {
        Self { max_entries, max_memory_bytes: max_memory_mb.saturating_mul(BYTES_PER_MB) }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::from_mb(50, 100)
    }
}

/// Counters reported to the UI chrome.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub memory_usage: usize,
    pub hits: u64,
    pub misses: u64,
    /// `hits / (hits + misses)`, or 0 before the first lookup.
    pub hit_rate: f64,
    pub evictions: u64,
}

/// Read-only view of one cached record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry<'a, T> {
    pub key: &'a str,
    pub value: &'a T,
    pub memory_size: usize,
    pub last_access: u64,
    pub access_count: u64,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    memory_size: usize,
    last_access: u64,
    access_count: u64,
}

/// Key-value store with LRU eviction.
#[derive(Debug, Clone)]
pub struct BoundedCache<T> {
    slots: HashMap<String, Slot<T>>,
    config: CacheConfig,
    memory: usize,
    tick: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<T> BoundedCache<T> {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        Self {
            slots: HashMap::new(),
            config,
            memory: 0,
            tick: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    #[must_use]
    pub fn with_limits(max_entries: usize, max_memory_mb: usize) -> Self {
        Self::new(CacheConfig::from_mb(max_entries, max_memory_mb))
    }

    #[must_use]
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Look up `key`, marking it most recently used on a hit.
    pub fn get(&mut self, key: &str) -> Option<&T> {
        let tick = self.next_tick();
        match self.slots.get_mut(key) {
            Some(slot) => {
                slot.last_access = tick;
                slot.access_count += 1;
                self.hits += 1;
                Some(&slot.value)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Look up `key` without touching recency or counters.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<&T> {
        self.slots.get(key).map(|slot| &slot.value)
    }

    /// Insert or replace `key`, evicting least-recently-used entries to stay in budget.
    pub fn set(&mut self, key: impl Into<String>, value: T, memory_size: usize) {
        let key = key.into();
        let tick = self.next_tick();

        if let Some(slot) = self.slots.get_mut(&key) {
            self.memory = self.memory - slot.memory_size + memory_size;
            slot.value = value;
            slot.memory_size = memory_size;
            slot.last_access = tick;
            slot.access_count += 1;
            while self.memory > self.config.max_memory_bytes && self.slots.len() > 1 {
                if !self.evict_oldest(Some(&key)) {
                    break;
                }
            }
            return;
        }

        while !self.slots.is_empty()
            && (self.slots.len() >= self.config.max_entries
                || self.memory + memory_size > self.config.max_memory_bytes)
        {
            if !self.evict_oldest(None) {
                break;
            }
        }

        self.memory += memory_size;
        self.slots.insert(key, Slot { value, memory_size, last_access: tick, access_count: 1 });
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Remove `key`. Returns whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.slots.remove(key) {
            Some(slot) => {
                self.memory -= slot.memory_size;
                true
            }
            None => false,
        }
    }

    /// Drop every entry and reset the memory total. Counters are kept.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.memory = 0;
    }

    /// Every entry, least recently used first.
    #[must_use]
    pub fn entries(&self) -> Vec<CacheEntry<'_, T>> {
        let mut out: Vec<CacheEntry<'_, T>> = self
            .slots
            .iter()
            .map(|(key, slot)| CacheEntry {
                key,
                value: &slot.value,
                memory_size: slot.memory_size,
                last_access: slot.last_access,
                access_count: slot.access_count,
            })
            .collect();
        out.sort_by_key(|e| e.last_access);
        out
    }

    /// Keys, least recently used first.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries().into_iter().map(|e| e.key).collect()
    }

    /// Values, least recently used first.
    #[must_use]
    pub fn values(&self) -> Vec<&T> {
        self.entries().into_iter().map(|e| e.value).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.memory
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let lookups = self.hits + self.misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate = if lookups == 0 { 0.0 } else { self.hits as f64 / lookups as f64 };
        CacheStats {
            size: self.slots.len(),
            memory_usage: self.memory,
            hits: self.hits,
            misses: self.misses,
            hit_rate,
            evictions: self.evictions,
        }
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Evict the least-recently-used entry other than `keep`.
    fn evict_oldest(&mut self, keep: Option<&str>) -> bool {
        let oldest = self
            .slots
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != keep)
            .min_by_key(|(_, slot)| slot.last_access)
            .map(|(key, _)| key.clone());
        let Some(key) = oldest else {
            return false;
        };
        if let Some(slot) = self.slots.remove(&key) {
            self.memory -= slot.memory_size;
            self.evictions += 1;
            tracing::debug!(key = %key, bytes = slot.memory_size, memory = self.memory, "cache eviction");
        }
        true
    }
}

impl<T> Default for BoundedCache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
