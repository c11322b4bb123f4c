//! In-memory, TTL-bounded and size-bounded cache of resolved records.
//!
//! One instance is shared by every in-flight resolution. Expired entries are
//! dropped lazily on lookup; a full cache drops its oldest entries in bulk
//! before accepting a new key.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;

use super::types::{BookRecord, Query};

/// Deterministic digest of the normalized `(title, author, publisher)` triple.
///
/// `include_comments` is not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(title: &str, author: Option<&str>, publisher: Option<&str>) -> Self {
        let mut hasher = Sha256::new();
        for part in [Some(title), author, publisher] {
            hasher.update(normalize_key_part(part.unwrap_or_default()).as_bytes());
            // Unit separator keeps ("ab", "c") distinct from ("a", "bc").
            hasher.update([0x1f]);
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Query> for CacheKey {
    fn from(query: &Query) -> Self {
        Self::new(
            &query.title,
            query.author.as_deref(),
            query.publisher.as_deref(),
        )
    }
}

fn normalize_key_part(part: &str) -> String {
    part.trim().to_lowercase()
}

/// A cached record and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub record: BookRecord,
    pub inserted_at: Instant,
    /// Insertion order, breaks ties between equal timestamps.
    seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= ttl
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<CacheKey, CacheEntry>,
    next_seq: u64,
}

/// Shared record cache.
#[derive(Debug)]
pub struct BookCache {
    state: RwLock<CacheState>,
    ttl: Duration,
    max_size: usize,
    eviction_fraction: f64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for BookCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

impl BookCache {
    /// Create a cache from configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            state: RwLock::new(CacheState::default()),
            ttl: config.ttl(),
            max_size: config.max_size.max(1),
            eviction_fraction: config.eviction_fraction,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a live entry. Expired entries are removed and reported as a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let now = Instant::now();
        {
            let state = self.state.read().await;
            match state.entries.get(key) {
                Some(entry) if !entry.is_expired(self.ttl, now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.clone());
                }
                Some(_) => {}
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
            }
        }

        // Expired: re-check under the write lock, a concurrent put may have refreshed it.
        let mut state = self.state.write().await;
        match state.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl, now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.clone())
            }
            Some(_) => {
                state.entries.remove(key);
                debug!(key = key.as_str(), "Evicted expired cache entry");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a record, evicting the oldest entries first if the cache is full.
    pub async fn put(&self, key: CacheKey, record: BookRecord) {
        let mut state = self.state.write().await;

        if !state.entries.contains_key(&key) && state.entries.len() >= self.max_size {
            let evicted = self.evict_oldest(&mut state);
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            debug!(evicted, remaining = state.entries.len(), "Cache full, evicted oldest entries");
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CacheEntry {
                record,
                inserted_at: Instant::now(),
                seq,
            },
        );
    }

    /// Number of entries to drop when full: `ceil(max_size * fraction)`, at least one.
    fn eviction_batch(&self) -> usize {
        ((self.max_size as f64 * self.eviction_fraction).ceil() as usize).clamp(1, self.max_size)
    }

    fn evict_oldest(&self, state: &mut CacheState) -> usize {
        let mut by_age: Vec<(Instant, u64, CacheKey)> = state
            .entries
            .iter()
            .map(|(k, e)| (e.inserted_at, e.seq, k.clone()))
            .collect();
        by_age.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let count = self.eviction_batch().min(by_age.len());
        for (_, _, key) in by_age.into_iter().take(count) {
            state.entries.remove(&key);
        }
        count
    }

    /// Number of stored entries, including not-yet-collected expired ones.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Whether `key` is stored (expired or not). Does not touch hit/miss counters.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.state.read().await.entries.contains_key(key)
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.state.write().await.entries.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len().await,
            max_size: self.max_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
