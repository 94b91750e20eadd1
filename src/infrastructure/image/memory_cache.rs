//! In-memory LRU artifact cache with byte-size accounting.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::domain::entities::{CacheKey, DEFAULT_MEMORY_CACHE_CAPACITY, ImageArtifact};
use crate::domain::ports::ImageCachePort;
use crate::domain::size::format_size_auto;

struct CacheState {
    entries: LruCache<CacheKey, Arc<ImageArtifact>>,
    used_bytes: u64,
    capacity_bytes: u64,
}

impl CacheState {
    /// Pops least-recently-used entries until usage fits the budget.
    /// `protect` is never evicted; it is the entry just inserted.
    fn evict_to_fit(&mut self, protect: Option<&CacheKey>) -> u64 {
        let mut evicted = 0;
        while self.used_bytes > self.capacity_bytes {
            match self.entries.peek_lru() {
                None => break,
                Some((key, _)) if Some(key) == protect => break,
                Some(_) => {}
            }
            if let Some((key, artifact)) = self.entries.pop_lru() {
                self.used_bytes = self.used_bytes.saturating_sub(artifact.byte_size());
                evicted += 1;
                trace!(key = %key, size = artifact.byte_size(), "Evicted from memory cache");
            }
        }
        evicted
    }
}

/// In-memory LRU cache for decoded artifacts, bounded by total byte size.
///
/// The budget is soft: an artifact larger than the whole budget is still kept
/// until the next insert pushes it out.
pub struct MemoryImageCache {
    state: RwLock<CacheState>,
    entry_count: AtomicUsize,
    used_bytes: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryImageCache {
    /// Creates a new cache with the specified byte budget.
    #[must_use]
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: LruCache::unbounded(),
                used_bytes: 0,
                capacity_bytes,
            }),
            entry_count: AtomicUsize::new(0),
            used_bytes: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Creates a new cache with the default budget.
    #[must_use]
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_MEMORY_CACHE_CAPACITY)
    }

    /// Returns cache statistics.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            hit_rate,
            evictions: self.evictions.load(Ordering::Relaxed),
            size: self.len(),
            used_bytes: self.used_bytes(),
        }
    }

    /// Peeks at an artifact without promoting it in the LRU.
    pub async fn peek(&self, key: &CacheKey) -> Option<Arc<ImageArtifact>> {
        let state = self.state.read().await;
        state.entries.peek(key).cloned()
    }

    /// Checks residency without touching recency or hit counters.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        let state = self.state.read().await;
        state.entries.contains(key)
    }

    /// Returns accounted bytes of all resident artifacts.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.used_bytes.load(Ordering::Relaxed)
    }

    /// Returns the current byte budget.
    pub async fn capacity_bytes(&self) -> u64 {
        self.state.read().await.capacity_bytes
    }

    /// Changes the byte budget, evicting immediately if shrunk.
    pub async fn set_capacity(&self, capacity_bytes: u64) {
        let mut state = self.state.write().await;
        if state.capacity_bytes == capacity_bytes {
            return;
        }
        debug!(
            from = state.capacity_bytes,
            to = capacity_bytes,
            "Resizing memory cache budget"
        );
        state.capacity_bytes = capacity_bytes;
        let evicted = state.evict_to_fit(None);
        self.sync_counters(&state, evicted);
    }

    fn sync_counters(&self, state: &CacheState, evicted: u64) {
        self.entry_count.store(state.entries.len(), Ordering::Relaxed);
        self.used_bytes.store(state.used_bytes, Ordering::Relaxed);
        if evicted > 0 {
            self.evictions.fetch_add(evicted, Ordering::Relaxed);
        }
    }
}

impl Default for MemoryImageCache {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Hit rate as a percentage.
    pub hit_rate: f64,
    /// Number of entries pushed out by the budget.
    pub evictions: u64,
    /// Current number of cached artifacts.
    pub size: usize,
    /// Accounted bytes in use.
    pub used_bytes: u64,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Cache: {} images ({}), {:.1}% hit rate ({} hits, {} misses, {} evictions)",
            self.size,
            format_size_auto(self.used_bytes),
            self.hit_rate,
            self.hits,
            self.misses,
            self.evictions
        )
    }
}

#[async_trait::async_trait]
impl ImageCachePort for MemoryImageCache {
    async fn get(&self, key: &CacheKey) -> Option<Arc<ImageArtifact>> {
        let mut state = self.state.write().await;
        if let Some(artifact) = state.entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache hit");
            Some(artifact.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "Memory cache miss");
            None
        }
    }

    async fn put(&self, key: CacheKey, artifact: Arc<ImageArtifact>) {
        let size = artifact.byte_size();
        let mut state = self.state.write().await;
        if let Some(previous) = state.entries.put(key.clone(), artifact) {
            state.used_bytes = state.used_bytes.saturating_sub(previous.byte_size());
        }
        state.used_bytes += size;
        let evicted = state.evict_to_fit(Some(&key));
        if state.used_bytes > state.capacity_bytes {
            debug!(
                key = %key,
                size = %format_size_auto(size),
                capacity = %format_size_auto(state.capacity_bytes),
                "Artifact exceeds memory cache budget"
            );
        } else {
            debug!(key = %key, size = %format_size_auto(size), "Stored artifact in memory cache");
        }
        self.sync_counters(&state, evicted);
    }

    async fn evict(&self, key: &CacheKey) {
        let mut state = self.state.write().await;
        if let Some(artifact) = state.entries.pop(key) {
            state.used_bytes = state.used_bytes.saturating_sub(artifact.byte_size());
            debug!(key = %key, "Evicted artifact from memory cache");
        }
        self.sync_counters(&state, 0);
    }

    fn len(&self) -> usize {
        self.entry_count.load(Ordering::Relaxed)
    }

    async fn clear(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.used_bytes = 0;
        self.sync_counters(&state, 0);
        debug!("Cleared memory image cache");
    }
}
